use crate::models::{
    CookingTimePreference, DietaryMatch, Difficulty, MealType, NutritionSummary, Recipe, UserProfile,
};
use crate::optim::targets::NutritionTargets;
use crate::store::RecipeQuery;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub const RECIPES_TABLE: &str = "recipes";
pub const USER_PROFILES_TABLE: &str = "user_profiles";
pub const NUTRITION_TARGETS_TABLE: &str = "nutrition_targets";
pub const PLANNING_CONSTRAINTS_TABLE: &str = "planning_constraints";
pub const MEAL_PLANS_TABLE: &str = "meal_plans";
pub const MEAL_PLAN_ITEMS_TABLE: &str = "meal_plan_items";

/// Recipe columns plus the embedded cuisine and category names.
pub const RECIPE_SELECT: &str = "*,cuisine:cuisines(name),category:categories(name)";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedRef {
    pub name: String,
}

/// A `recipes` row as the hosted store returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeRow {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub cuisine: Option<NamedRef>,
    #[serde(default)]
    pub category: Option<NamedRef>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub prep_time: Option<u32>,
    #[serde(default)]
    pub cook_time: Option<u32>,
    #[serde(default)]
    pub total_time: Option<u32>,
    #[serde(default)]
    pub ingredients: Option<Vec<String>>,
    #[serde(default)]
    pub nutritional_info: Option<NutritionSummary>,
    #[serde(default)]
    pub dietary_restrictions: Option<Vec<String>>,
    #[serde(default)]
    pub servings: Option<u32>,
    #[serde(default)]
    pub meal_type: Option<MealType>,
    #[serde(default)]
    pub is_published: Option<bool>,
}

impl From<RecipeRow> for Recipe {
    fn from(row: RecipeRow) -> Self {
        let prep_time = row.prep_time.unwrap_or(0);
        let cook_time = row.cook_time.unwrap_or(0);
        Recipe {
            id: row.id,
            title: row.title,
            cuisine: row.cuisine.map(|c| c.name),
            category: row.category.map(|c| c.name),
            difficulty: row.difficulty.unwrap_or_default(),
            prep_time,
            cook_time,
            total_time: row.total_time.unwrap_or(prep_time.saturating_add(cook_time)),
            ingredients: row.ingredients.unwrap_or_default(),
            nutrition: row.nutritional_info,
            dietary_restrictions: row.dietary_restrictions.unwrap_or_default(),
            servings: row.servings,
            meal_type: row.meal_type,
            is_published: row.is_published.unwrap_or(true),
        }
    }
}

/// A `user_profiles` row; nullable columns fall back to profile defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileRow {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub dietary_restrictions: Option<Vec<String>>,
    #[serde(default)]
    pub favorite_cuisines: Option<Vec<String>>,
    #[serde(default)]
    pub cooking_time_preference: Option<CookingTimePreference>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl ProfileRow {
    pub fn into_profile(self, user_id: &str) -> UserProfile {
        UserProfile {
            user_id: self.user_id.unwrap_or_else(|| user_id.to_string()),
            dietary_restrictions: self.dietary_restrictions.unwrap_or_default(),
            favorite_cuisines: self.favorite_cuisines.unwrap_or_default(),
            cooking_time_preference: self.cooking_time_preference.unwrap_or_default(),
            extra: self.extra,
        }
    }
}

/// A `nutrition_targets` row; null columns take the default targets.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetsRow {
    #[serde(default)]
    pub daily_calories: Option<f64>,
    #[serde(default)]
    pub daily_protein: Option<f64>,
    #[serde(default)]
    pub daily_carbs: Option<f64>,
    #[serde(default)]
    pub daily_fat: Option<f64>,
    #[serde(default)]
    pub meal_distribution: Option<HashMap<MealType, f64>>,
}

impl From<TargetsRow> for NutritionTargets {
    fn from(row: TargetsRow) -> Self {
        let defaults = NutritionTargets::default();
        NutritionTargets {
            daily_calories: row.daily_calories.unwrap_or(defaults.daily_calories),
            daily_protein: row.daily_protein.unwrap_or(defaults.daily_protein),
            daily_carbs: row.daily_carbs.unwrap_or(defaults.daily_carbs),
            daily_fat: row.daily_fat.unwrap_or(defaults.daily_fat),
            meal_distribution: row.meal_distribution.unwrap_or(defaults.meal_distribution),
        }
    }
}

/// Accepts string, integer, or UUID ids and keeps them as strings.
pub fn id_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("unsupported id value: {}", other))),
    }
}

/// PostgREST array literal, e.g. `{"vegan","gluten free"}`.
pub fn array_literal(values: &[String]) -> String {
    let quoted: Vec<String> = values
        .iter()
        .map(|v| format!("\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect();
    format!("{{{}}}", quoted.join(","))
}

pub fn recipe_query_params(query: &RecipeQuery) -> Vec<(String, String)> {
    let mut params = vec![
        ("select".to_string(), RECIPE_SELECT.to_string()),
        ("is_published".to_string(), "eq.true".to_string()),
        ("order".to_string(), "id.asc".to_string()),
        ("limit".to_string(), query.limit.to_string()),
    ];
    if !query.dietary_restrictions.is_empty() {
        let operator = match query.dietary_match {
            DietaryMatch::Overlap => "ov",
            DietaryMatch::Coverage => "cs",
        };
        params.push((
            "dietary_restrictions".to_string(),
            format!("{}.{}", operator, array_literal(&query.dietary_restrictions)),
        ));
    }
    params
}

pub fn user_filter(user_id: &str) -> (String, String) {
    ("user_id".to_string(), format!("eq.{}", user_id))
}
