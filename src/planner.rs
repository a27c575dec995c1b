use crate::candidate_pool::CandidatePool;
use crate::errors::{PlanWarning, PlannerError};
use crate::models::{Day, DietaryMatch, MealPlanEntry, MealType, PlanPreferences};
use crate::optim::constraints::Constraint;
use crate::optim::nutri_eval::{ScoringContext, ScoringWeights};
use crate::optim::optimizer::{summarize, OptimizationSummary};
use crate::optim::plan_state::PlanState;
use crate::optim::selector::select_for_slot;
use crate::optim::targets::NutritionTargets;
use crate::persister::{self, MealPlanRecord};
use crate::profile_loader::load_planning_inputs;
use crate::store::{PlannerStore, DEFAULT_RECIPE_LIMIT};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub const WEEK_START_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealPlanRequest {
    pub user_id: String,
    pub week_start: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<PlanPreferences>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlanResponse {
    pub meal_plan: Vec<MealPlanEntry>,
    pub meal_plan_id: String,
    pub optimization_summary: OptimizationSummary,
}

/// Run-independent knobs, normally read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerOptions {
    pub weights: ScoringWeights,
    pub recipe_limit: usize,
    pub pool_dietary_match: DietaryMatch,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            recipe_limit: DEFAULT_RECIPE_LIMIT,
            pool_dietary_match: DietaryMatch::default(),
        }
    }
}

/// Result of the greedy pass over the 7×4 grid.
#[derive(Debug, Clone)]
pub struct BuiltPlan {
    pub entries: Vec<MealPlanEntry>,
    pub warnings: Vec<PlanWarning>,
    pub state: PlanState,
}

/// Fills every slot day-major, meal-type-minor. Each slot sees the state left
/// by the previous one; earlier slots are never revisited.
pub fn build_plan(
    pool: &CandidatePool,
    targets: &NutritionTargets,
    ctx: &ScoringContext,
    constraints: &[Constraint],
    track_used_recipes: bool,
) -> BuiltPlan {
    let mut state = PlanState::new(track_used_recipes);
    let mut entries = Vec::new();
    let mut warnings = Vec::new();

    for day in Day::ALL {
        for meal_type in MealType::ALL {
            let candidates = pool.candidates(meal_type);
            match select_for_slot(day, meal_type, candidates, targets, &mut state, ctx, constraints) {
                Some(selection) => {
                    if selection.constraint_relaxed {
                        warnings.push(PlanWarning::ConstraintRelaxed {
                            day,
                            meal_type,
                            recipe_id: selection.entry.recipe_id.clone(),
                        });
                    }
                    entries.push(selection.entry);
                }
                None => warnings.push(PlanWarning::PartialPlan { day, meal_type }),
            }
        }
    }

    BuiltPlan { entries, warnings, state }
}

pub struct MealPlanner {
    store: Arc<dyn PlannerStore>,
    options: PlannerOptions,
}

impl MealPlanner {
    pub fn new(store: Arc<dyn PlannerStore>, options: PlannerOptions) -> Self {
        Self { store, options }
    }

    /// Generates, summarises and persists a week of meals.
    ///
    /// Any error aborts the run before anything is written.
    pub async fn generate(&self, request: &MealPlanRequest) -> Result<MealPlanResponse, PlannerError> {
        let user_id = request.user_id.trim();
        if user_id.is_empty() {
            return Err(PlannerError::InvalidRequest("user_id must not be empty".to_string()));
        }
        let week_start = NaiveDate::parse_from_str(request.week_start.trim(), WEEK_START_FORMAT).map_err(|e| {
            PlannerError::InvalidRequest(format!(
                "week_start '{}' is not a {} date: {}",
                request.week_start, WEEK_START_FORMAT, e
            ))
        })?;
        let preferences = request.preferences.clone().unwrap_or_default();

        info!(%user_id, %week_start, "generating meal plan");
        let inputs = load_planning_inputs(self.store.as_ref(), user_id).await?;
        let ctx = ScoringContext::new(&inputs.profile, &preferences, self.options.weights);

        let pool = CandidatePool::load(
            self.store.as_ref(),
            &ctx.dietary_restrictions,
            self.options.pool_dietary_match,
            self.options.recipe_limit,
        )
        .await?;
        if pool.is_empty() {
            warn!(%user_id, "no recipes matched, the plan will be empty");
        }

        let built = build_plan(
            &pool,
            &inputs.targets,
            &ctx,
            &inputs.constraints,
            preferences.cuisine_variety_enabled(),
        );
        let summary = summarize(&built.entries, |id| pool.recipe(id), &inputs.targets, built.warnings);

        let record = MealPlanRecord {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            week_start,
            preferences,
            plan_data: built.entries,
            optimization_summary: summary,
            created_at: Utc::now(),
        };
        let meal_plan_id = persister::persist(self.store.as_ref(), &record).await?;

        info!(
            %meal_plan_id,
            total_meals = record.optimization_summary.total_meals,
            warnings = record.optimization_summary.warnings.len(),
            "meal plan generated"
        );
        Ok(MealPlanResponse {
            meal_plan: record.plan_data,
            meal_plan_id,
            optimization_summary: record.optimization_summary,
        })
    }

    pub async fn load_plan(&self, plan_id: &str) -> Result<MealPlanRecord, PlannerError> {
        persister::load_plan(self.store.as_ref(), plan_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Recipe;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn recipe(id: &str, meal_type: &str, calories: f64) -> Recipe {
        serde_json::from_value(json!({
            "id": id,
            "title": id,
            "cuisine": "Italian",
            "total_time": 25,
            "meal_type": meal_type,
            "ingredients": [format!("{id} stock")],
            "nutrition": {"calories": calories, "protein": 20, "carbs": 40, "fat": 10}
        }))
        .unwrap()
    }

    fn request(user_id: &str, week_start: &str) -> MealPlanRequest {
        MealPlanRequest {
            user_id: user_id.to_string(),
            week_start: week_start.to_string(),
            preferences: None,
        }
    }

    #[test]
    fn test_build_plan_reports_empty_buckets() {
        let pool = CandidatePool::from_recipes(vec![
            recipe("b1", "breakfast", 500.0),
            recipe("l1", "lunch", 700.0),
            recipe("d1", "dinner", 600.0),
        ]);
        let built = build_plan(
            &pool,
            &NutritionTargets::default(),
            &ScoringContext::default(),
            &[],
            true,
        );
        assert_eq!(built.entries.len(), 21);
        assert_eq!(built.warnings.len(), 7);
        assert!(built
            .warnings
            .iter()
            .all(|w| matches!(w, PlanWarning::PartialPlan { meal_type: MealType::Snack, .. })));
        assert_eq!(built.state.daily_totals().len(), 7);
    }

    #[tokio::test]
    async fn test_invalid_requests() {
        let planner = MealPlanner::new(Arc::new(MemoryStore::new()), PlannerOptions::default());
        let err = planner.generate(&request("  ", "2024-03-04")).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        let err = planner.generate(&request("u1", "04/03/2024")).await.unwrap_err();
        assert!(matches!(err, PlannerError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_generate_persists_plan() {
        let store = Arc::new(MemoryStore::new());
        store.insert_recipe(recipe("b1", "breakfast", 500.0)).await;
        store.insert_recipe(recipe("s1", "snack", 200.0)).await;
        let planner = MealPlanner::new(store.clone(), PlannerOptions::default());

        let response = planner.generate(&request("u1", "2024-03-04")).await.unwrap();
        assert_eq!(response.meal_plan.len(), 14);
        assert_eq!(response.optimization_summary.total_meals, 14);
        assert_eq!(store.plan_count().await, 1);

        let stored = planner.load_plan(&response.meal_plan_id).await.unwrap();
        assert_eq!(stored.plan_data, response.meal_plan);
        assert_eq!(stored.week_start, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
    }
}
