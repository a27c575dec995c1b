use crate::models::{MealType, NutritionSummary};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Share of the daily calories used for a meal type missing from the distribution.
pub const FALLBACK_MEAL_SHARE: f64 = 0.25;

// Atwater factors, kcal per gram.
pub const KCAL_PER_G_PROTEIN: f64 = 4.0;
pub const KCAL_PER_G_CARB: f64 = 4.0;
pub const KCAL_PER_G_FAT: f64 = 9.0;

/// Daily nutrition goals and how the calories are split across meals.
///
/// The distribution is not validated: shares need not sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionTargets {
    #[serde(default = "default_daily_calories")]
    pub daily_calories: f64,
    #[serde(default = "default_daily_protein")]
    pub daily_protein: f64,
    #[serde(default = "default_daily_carbs")]
    pub daily_carbs: f64,
    #[serde(default = "default_daily_fat")]
    pub daily_fat: f64,
    #[serde(default = "default_meal_distribution")]
    pub meal_distribution: HashMap<MealType, f64>,
}

fn default_daily_calories() -> f64 {
    2000.0
}

fn default_daily_protein() -> f64 {
    150.0
}

fn default_daily_carbs() -> f64 {
    250.0
}

fn default_daily_fat() -> f64 {
    70.0
}

fn default_meal_distribution() -> HashMap<MealType, f64> {
    HashMap::from([
        (MealType::Breakfast, 0.25),
        (MealType::Lunch, 0.35),
        (MealType::Dinner, 0.30),
        (MealType::Snack, 0.10),
    ])
}

impl Default for NutritionTargets {
    fn default() -> Self {
        Self {
            daily_calories: default_daily_calories(),
            daily_protein: default_daily_protein(),
            daily_carbs: default_daily_carbs(),
            daily_fat: default_daily_fat(),
            meal_distribution: default_meal_distribution(),
        }
    }
}

impl NutritionTargets {
    pub fn meal_share(&self, meal_type: MealType) -> f64 {
        self.meal_distribution
            .get(&meal_type)
            .copied()
            .unwrap_or(FALLBACK_MEAL_SHARE)
    }

    /// Calorie budget for a single slot of `meal_type`.
    pub fn target_calories(&self, meal_type: MealType) -> f64 {
        self.daily_calories * self.meal_share(meal_type)
    }
}

/// Calories contributed by each macronutrient, as (protein, carbs, fat).
pub fn macro_calories(summary: &NutritionSummary) -> (f64, f64, f64) {
    (
        summary.protein * KCAL_PER_G_PROTEIN,
        summary.carbs * KCAL_PER_G_CARB,
        summary.fat * KCAL_PER_G_FAT,
    )
}
