pub mod api_connection;
pub mod candidate_pool;
pub mod cli;
pub mod config;
pub mod errors;
pub mod logging;
pub mod models;
pub mod optim;
pub mod persister;
pub mod planner;
pub mod profile_loader;
pub mod store;

pub use errors::{PlanWarning, PlannerError};
pub use planner::{MealPlanRequest, MealPlanResponse, MealPlanner, PlannerOptions};
