use super::{PlannerStore, RecipeQuery, StoreError};
use crate::models::{Recipe, UserProfile};
use crate::optim::constraints::ConstraintRow;
use crate::optim::targets::NutritionTargets;
use crate::persister::{MealPlanItemRow, MealPlanRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct MemoryData {
    profiles: HashMap<String, UserProfile>,
    targets: HashMap<String, NutritionTargets>,
    constraints: HashMap<String, Vec<ConstraintRow>>,
    recipes: Vec<Recipe>,
    plans: HashMap<String, MealPlanRecord>,
    plan_items: HashMap<String, Vec<MealPlanItemRow>>,
    reads_fail: bool,
    writes_fail: bool,
}

/// In-process store used by the fixture mode and the tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<MemoryData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_recipe(&self, recipe: Recipe) {
        self.data.write().await.recipes.push(recipe);
    }

    pub async fn insert_profile(&self, profile: UserProfile) {
        let mut data = self.data.write().await;
        data.profiles.insert(profile.user_id.clone(), profile);
    }

    pub async fn insert_targets(&self, user_id: &str, targets: NutritionTargets) {
        self.data.write().await.targets.insert(user_id.to_string(), targets);
    }

    pub async fn insert_constraint(&self, user_id: &str, row: ConstraintRow) {
        self.data
            .write()
            .await
            .constraints
            .entry(user_id.to_string())
            .or_default()
            .push(row);
    }

    /// Makes every subsequent read fail, to exercise upstream errors.
    pub async fn fail_reads(&self, fail: bool) {
        self.data.write().await.reads_fail = fail;
    }

    /// Makes every subsequent write fail, to exercise persistence errors.
    pub async fn fail_writes(&self, fail: bool) {
        self.data.write().await.writes_fail = fail;
    }

    pub async fn plan_count(&self) -> usize {
        self.data.read().await.plans.len()
    }

    /// Stored plans and their item rows, ordered by plan id then position.
    pub async fn export_plans(&self) -> (Vec<MealPlanRecord>, Vec<MealPlanItemRow>) {
        let data = self.data.read().await;
        let mut plans: Vec<MealPlanRecord> = data.plans.values().cloned().collect();
        plans.sort_by(|a, b| a.id.cmp(&b.id));
        let mut items: Vec<MealPlanItemRow> = data.plan_items.values().flatten().cloned().collect();
        items.sort_by(|a, b| a.meal_plan_id.cmp(&b.meal_plan_id).then(a.position.cmp(&b.position)));
        (plans, items)
    }

    /// Puts back previously exported plans, bypassing the write toggle.
    pub async fn restore_plans(&self, plans: Vec<MealPlanRecord>, items: Vec<MealPlanItemRow>) {
        let mut data = self.data.write().await;
        for plan in plans {
            data.plan_items.entry(plan.id.clone()).or_default();
            data.plans.insert(plan.id.clone(), plan);
        }
        for item in items {
            data.plan_items.entry(item.meal_plan_id.clone()).or_default().push(item);
        }
    }

    fn check_reads(data: &MemoryData) -> Result<(), StoreError> {
        if data.reads_fail {
            return Err(StoreError::Unavailable("reads disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PlannerStore for MemoryStore {
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        let data = self.data.read().await;
        Self::check_reads(&data)?;
        Ok(data.profiles.get(user_id).cloned())
    }

    async fn fetch_nutrition_targets(&self, user_id: &str) -> Result<Option<NutritionTargets>, StoreError> {
        let data = self.data.read().await;
        Self::check_reads(&data)?;
        Ok(data.targets.get(user_id).cloned())
    }

    async fn fetch_constraints(&self, user_id: &str) -> Result<Vec<ConstraintRow>, StoreError> {
        let data = self.data.read().await;
        Self::check_reads(&data)?;
        let mut rows = data.constraints.get(user_id).cloned().unwrap_or_default();
        rows.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(rows)
    }

    async fn fetch_recipes(&self, query: &RecipeQuery) -> Result<Vec<Recipe>, StoreError> {
        let data = self.data.read().await;
        Self::check_reads(&data)?;
        Ok(data
            .recipes
            .iter()
            .filter(|r| r.is_published)
            .filter(|r| query.dietary_match.matches(&query.dietary_restrictions, &r.dietary_restrictions))
            .take(query.limit)
            .cloned()
            .collect())
    }

    async fn save_meal_plan(&self, record: &MealPlanRecord, items: &[MealPlanItemRow]) -> Result<String, StoreError> {
        let mut data = self.data.write().await;
        if data.writes_fail {
            return Err(StoreError::Unavailable("writes disabled".to_string()));
        }
        data.plans.insert(record.id.clone(), record.clone());
        data.plan_items.insert(record.id.clone(), items.to_vec());
        Ok(record.id.clone())
    }

    async fn load_meal_plan(&self, plan_id: &str) -> Result<Option<MealPlanRecord>, StoreError> {
        let data = self.data.read().await;
        Self::check_reads(&data)?;
        Ok(data.plans.get(plan_id).cloned())
    }

    async fn load_meal_plan_items(&self, plan_id: &str) -> Result<Vec<MealPlanItemRow>, StoreError> {
        let data = self.data.read().await;
        Self::check_reads(&data)?;
        let mut items = data.plan_items.get(plan_id).cloned().unwrap_or_default();
        items.sort_by_key(|i| i.position);
        Ok(items)
    }
}
