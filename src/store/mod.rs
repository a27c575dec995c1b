pub mod fixtures;
pub mod memory;

pub use fixtures::{load_fixture_store, plan_archive_path, save_plan_archive, PlanArchive};
pub use memory::MemoryStore;

use crate::api_connection::connection::ApiConnectionError;
use crate::models::{DietaryMatch, Recipe, UserProfile};
use crate::optim::constraints::ConstraintRow;
use crate::optim::targets::NutritionTargets;
use crate::persister::{MealPlanItemRow, MealPlanRecord};
use async_trait::async_trait;
use thiserror::Error;

/// Default cap on the recipe fetch.
pub const DEFAULT_RECIPE_LIMIT: usize = 200;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Api(#[from] ApiConnectionError),

    #[error("malformed {what} data: {source}")]
    Malformed {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Which published recipes to fetch for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeQuery {
    pub dietary_restrictions: Vec<String>,
    pub dietary_match: DietaryMatch,
    pub limit: usize,
}

impl Default for RecipeQuery {
    fn default() -> Self {
        Self {
            dietary_restrictions: Vec::new(),
            dietary_match: DietaryMatch::default(),
            limit: DEFAULT_RECIPE_LIMIT,
        }
    }
}

/// The hosted relational store the planner reads from and writes to.
///
/// Lookups for a single user return `None`/empty when no row exists; they
/// only fail when the store itself does.
#[async_trait]
pub trait PlannerStore: Send + Sync {
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError>;

    async fn fetch_nutrition_targets(&self, user_id: &str) -> Result<Option<NutritionTargets>, StoreError>;

    /// Rows ordered by descending priority.
    async fn fetch_constraints(&self, user_id: &str) -> Result<Vec<ConstraintRow>, StoreError>;

    /// Published recipes only, at most `query.limit` of them.
    async fn fetch_recipes(&self, query: &RecipeQuery) -> Result<Vec<Recipe>, StoreError>;

    /// Writes the aggregate record and its per-slot rows; returns the plan id.
    async fn save_meal_plan(&self, record: &MealPlanRecord, items: &[MealPlanItemRow]) -> Result<String, StoreError>;

    async fn load_meal_plan(&self, plan_id: &str) -> Result<Option<MealPlanRecord>, StoreError>;

    /// Rows ordered by position.
    async fn load_meal_plan_items(&self, plan_id: &str) -> Result<Vec<MealPlanItemRow>, StoreError>;
}
