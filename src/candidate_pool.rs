use crate::errors::PlannerError;
use crate::models::{DietaryMatch, MealType, Recipe};
use crate::store::{PlannerStore, RecipeQuery};
use std::collections::HashMap;
use tracing::info;

const BREAKFAST_MAX_MINUTES: u32 = 30;
const LUNCH_MAX_MINUTES: u32 = 60;
const DINNER_MIN_MINUTES: u32 = 30;
const SNACK_MAX_MINUTES: u32 = 20;

const BREAKFAST_TITLE_WORDS: [&str; 3] = ["breakfast", "pancake", "omelet"];
const DINNER_CATEGORY_WORDS: [&str; 2] = ["dinner", "main"];
const SNACK_CATEGORY_WORDS: [&str; 2] = ["snack", "appetizer"];

/// Recipes fetched for one run, bucketed by meal type.
///
/// A recipe may sit in several buckets. Buckets keep fetch order.
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    recipes: Vec<Recipe>,
    buckets: HashMap<MealType, Vec<Recipe>>,
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

impl CandidatePool {
    pub async fn load(
        store: &dyn PlannerStore,
        dietary_restrictions: &[String],
        dietary_match: DietaryMatch,
        limit: usize,
    ) -> Result<Self, PlannerError> {
        let query = RecipeQuery {
            dietary_restrictions: dietary_restrictions.to_vec(),
            dietary_match,
            limit,
        };
        let recipes = store
            .fetch_recipes(&query)
            .await
            .map_err(PlannerError::data_source("recipes"))?;
        let pool = Self::from_recipes(recipes);
        info!(
            recipes = pool.len(),
            breakfast = pool.candidates(MealType::Breakfast).len(),
            lunch = pool.candidates(MealType::Lunch).len(),
            dinner = pool.candidates(MealType::Dinner).len(),
            snack = pool.candidates(MealType::Snack).len(),
            "candidate pool built"
        );
        Ok(pool)
    }

    pub fn from_recipes(recipes: Vec<Recipe>) -> Self {
        let mut buckets: HashMap<MealType, Vec<Recipe>> = HashMap::new();
        for recipe in &recipes {
            for meal_type in Self::classify(recipe) {
                buckets.entry(meal_type).or_default().push(recipe.clone());
            }
        }
        Self { recipes, buckets }
    }

    /// Meal types a recipe is eligible for. An explicit tag wins; otherwise
    /// category, title and total time decide.
    pub fn classify(recipe: &Recipe) -> Vec<MealType> {
        if let Some(meal_type) = recipe.meal_type {
            return vec![meal_type];
        }

        let category = recipe.category.as_deref().unwrap_or_default().to_lowercase();
        let title = recipe.title.to_lowercase();
        let minutes = recipe.total_time;

        let breakfast = category.contains("breakfast")
            || contains_any(&title, &BREAKFAST_TITLE_WORDS)
            || minutes <= BREAKFAST_MAX_MINUTES;
        let lunch = minutes <= LUNCH_MAX_MINUTES && !breakfast;
        let dinner = contains_any(&category, &DINNER_CATEGORY_WORDS) || minutes >= DINNER_MIN_MINUTES;
        let snack = contains_any(&category, &SNACK_CATEGORY_WORDS) || minutes <= SNACK_MAX_MINUTES;

        MealType::ALL
            .into_iter()
            .zip([breakfast, lunch, dinner, snack])
            .filter_map(|(meal_type, eligible)| eligible.then_some(meal_type))
            .collect()
    }

    /// Never fails: an empty bucket is an empty slice.
    pub fn candidates(&self, meal_type: MealType) -> &[Recipe] {
        self.buckets.get(&meal_type).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn recipe(&self, recipe_id: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.id == recipe_id)
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}
