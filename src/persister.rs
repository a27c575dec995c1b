use crate::errors::PlannerError;
use crate::models::{Day, MealPlanEntry, MealType, PlanPreferences};
use crate::optim::optimizer::OptimizationSummary;
use crate::store::PlannerStore;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// The `meal_plans` aggregate row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlanRecord {
    pub id: String,
    pub user_id: String,
    pub week_start: NaiveDate,
    #[serde(default)]
    pub preferences: PlanPreferences,
    #[serde(default)]
    pub plan_data: Vec<MealPlanEntry>,
    pub optimization_summary: OptimizationSummary,
    pub created_at: DateTime<Utc>,
}

/// One `meal_plan_items` row per filled slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlanItemRow {
    pub meal_plan_id: String,
    pub position: u32,
    pub day: Day,
    pub meal_type: MealType,
    pub recipe_id: String,
    pub recipe_title: String,
    pub servings: u32,
    pub nutritional_score: f64,
    pub variety_score: f64,
    pub preference_score: f64,
    pub total_score: f64,
}

/// Item rows keep the plan order through `position`.
pub fn build_items(record: &MealPlanRecord) -> Vec<MealPlanItemRow> {
    record
        .plan_data
        .iter()
        .enumerate()
        .map(|(position, entry)| MealPlanItemRow {
            meal_plan_id: record.id.clone(),
            position: position as u32,
            day: entry.day,
            meal_type: entry.meal_type,
            recipe_id: entry.recipe_id.clone(),
            recipe_title: entry.recipe_title.clone(),
            servings: entry.servings,
            nutritional_score: entry.nutritional_score,
            variety_score: entry.variety_score,
            preference_score: entry.preference_score,
            total_score: entry.total_score,
        })
        .collect()
}

pub fn entries_from_items(items: &[MealPlanItemRow]) -> Vec<MealPlanEntry> {
    let mut sorted: Vec<&MealPlanItemRow> = items.iter().collect();
    sorted.sort_by_key(|item| item.position);
    sorted
        .into_iter()
        .map(|item| MealPlanEntry {
            day: item.day,
            meal_type: item.meal_type,
            recipe_id: item.recipe_id.clone(),
            recipe_title: item.recipe_title.clone(),
            nutritional_score: item.nutritional_score,
            variety_score: item.variety_score,
            preference_score: item.preference_score,
            total_score: item.total_score,
            servings: item.servings,
        })
        .collect()
}

pub async fn persist(store: &dyn PlannerStore, record: &MealPlanRecord) -> Result<String, PlannerError> {
    let items = build_items(record);
    let plan_id = store
        .save_meal_plan(record, &items)
        .await
        .map_err(PlannerError::persistence)?;
    info!(%plan_id, user_id = %record.user_id, items = items.len(), "meal plan persisted");
    Ok(plan_id)
}

/// Reads a stored plan back. Item rows, when present, are authoritative for
/// the entries; the aggregate's own copy is used otherwise.
pub async fn load_plan(store: &dyn PlannerStore, plan_id: &str) -> Result<MealPlanRecord, PlannerError> {
    let mut record = store
        .load_meal_plan(plan_id)
        .await
        .map_err(PlannerError::data_source("meal plan"))?
        .ok_or_else(|| PlannerError::NotFound(format!("meal plan {}", plan_id)))?;

    let items = store
        .load_meal_plan_items(plan_id)
        .await
        .map_err(PlannerError::data_source("meal plan items"))?;
    if !items.is_empty() {
        record.plan_data = entries_from_items(&items);
    }
    Ok(record)
}
