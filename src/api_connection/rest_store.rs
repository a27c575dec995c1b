use crate::api_connection::connection::{ApiConnectionError, RestClient};
use crate::api_connection::endpoints::{
    recipe_query_params, user_filter, ProfileRow, RecipeRow, TargetsRow, MEAL_PLANS_TABLE,
    MEAL_PLAN_ITEMS_TABLE, NUTRITION_TARGETS_TABLE, PLANNING_CONSTRAINTS_TABLE, RECIPES_TABLE,
    USER_PROFILES_TABLE,
};
use crate::models::{Recipe, UserProfile};
use crate::optim::constraints::ConstraintRow;
use crate::optim::targets::NutritionTargets;
use crate::persister::{MealPlanItemRow, MealPlanRecord};
use crate::store::{PlannerStore, RecipeQuery, StoreError};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

/// [`PlannerStore`] backed by the hosted PostgREST tables.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: RestClient,
}

impl RestStore {
    pub fn new(base_url: &str, api_key_env_var: &str) -> Self {
        Self {
            client: RestClient::new(base_url, api_key_env_var),
        }
    }

    /// Fetches at most one row for the user.
    async fn single_user_row<T: serde::de::DeserializeOwned>(
        &self,
        table: &'static str,
        user_id: &str,
    ) -> Result<Option<T>, StoreError> {
        let params = vec![user_filter(user_id), ("limit".to_string(), "1".to_string())];
        let rows: Vec<T> = self.client.select(table, &params).await?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl PlannerStore for RestStore {
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        let row: Option<ProfileRow> = self.single_user_row(USER_PROFILES_TABLE, user_id).await?;
        Ok(row.map(|r| r.into_profile(user_id)))
    }

    async fn fetch_nutrition_targets(&self, user_id: &str) -> Result<Option<NutritionTargets>, StoreError> {
        let row: Option<TargetsRow> = self.single_user_row(NUTRITION_TARGETS_TABLE, user_id).await?;
        Ok(row.map(NutritionTargets::from))
    }

    async fn fetch_constraints(&self, user_id: &str) -> Result<Vec<ConstraintRow>, StoreError> {
        let params = vec![user_filter(user_id), ("order".to_string(), "priority.desc".to_string())];
        let raw: Vec<Value> = self.client.select(PLANNING_CONSTRAINTS_TABLE, &params).await?;
        let mut rows = Vec::with_capacity(raw.len());
        for value in raw {
            match serde_json::from_value::<ConstraintRow>(value) {
                Ok(row) => rows.push(row),
                Err(e) => warn!(error = %e, "skipping unreadable planning constraint row"),
            }
        }
        Ok(rows)
    }

    async fn fetch_recipes(&self, query: &RecipeQuery) -> Result<Vec<Recipe>, StoreError> {
        let params = recipe_query_params(query);
        let raw: Vec<Value> = self.client.select(RECIPES_TABLE, &params).await?;
        let rows: Vec<RecipeRow> = raw
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<_, _>>()
            .map_err(|source| StoreError::Malformed { what: "recipe", source })?;
        debug!(count = rows.len(), "fetched recipe rows");
        Ok(rows.into_iter().map(Recipe::from).collect())
    }

    async fn save_meal_plan(&self, record: &MealPlanRecord, items: &[MealPlanItemRow]) -> Result<String, StoreError> {
        let stored: Vec<Value> = self.client.insert(MEAL_PLANS_TABLE, &[record]).await?;
        let plan_id = stored
            .first()
            .and_then(|row| row.get("id"))
            .and_then(|id| match id {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .ok_or_else(|| {
                ApiConnectionError::UnexpectedResponse("meal plan insert returned no id".to_string())
            })?;

        if !items.is_empty() {
            let inserted: Result<Vec<Value>, _> = self.client.insert(MEAL_PLAN_ITEMS_TABLE, items).await;
            if let Err(e) = inserted {
                // No transaction spans the two tables, so drop the aggregate by hand.
                let params = vec![("id".to_string(), format!("eq.{}", plan_id))];
                match self.client.delete(MEAL_PLANS_TABLE, &params).await {
                    Ok(()) => warn!(%plan_id, error = %e, "item insert failed, meal plan row removed"),
                    Err(cleanup) => warn!(
                        %plan_id,
                        error = %e,
                        cleanup_error = %cleanup,
                        "item insert failed and the meal plan row could not be removed"
                    ),
                }
                return Err(e.into());
            }
        }
        Ok(plan_id)
    }

    async fn load_meal_plan(&self, plan_id: &str) -> Result<Option<MealPlanRecord>, StoreError> {
        let params = vec![
            ("id".to_string(), format!("eq.{}", plan_id)),
            ("limit".to_string(), "1".to_string()),
        ];
        let raw: Vec<Value> = self.client.select(MEAL_PLANS_TABLE, &params).await?;
        raw.into_iter()
            .next()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|source| StoreError::Malformed { what: "meal plan", source })
    }

    async fn load_meal_plan_items(&self, plan_id: &str) -> Result<Vec<MealPlanItemRow>, StoreError> {
        let params = vec![
            ("meal_plan_id".to_string(), format!("eq.{}", plan_id)),
            ("order".to_string(), "position.asc".to_string()),
        ];
        let raw: Vec<Value> = self.client.select(MEAL_PLAN_ITEMS_TABLE, &params).await?;
        raw.into_iter()
            .map(serde_json::from_value)
            .collect::<Result<_, _>>()
            .map_err(|source| StoreError::Malformed { what: "meal plan item", source })
    }
}
