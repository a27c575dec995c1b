pub mod constraints;
pub mod nutri_eval;
pub mod optimizer;
pub mod plan_state;
pub mod selector;
pub mod targets;

pub use optimizer::{summarize, OptimizationSummary};
pub use targets::NutritionTargets;
