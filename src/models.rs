use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Calories assumed for a recipe that carries no nutritional summary.
pub const DEFAULT_RECIPE_CALORIES: f64 = 400.0;
/// Servings assumed when a recipe does not declare its yield.
pub const DEFAULT_SERVINGS: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    /// Slot order inside a day.
    pub const ALL: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Day::Monday => "monday",
            Day::Tuesday => "tuesday",
            Day::Wednesday => "wednesday",
            Day::Thursday => "thursday",
            Day::Friday => "friday",
            Day::Saturday => "saturday",
            Day::Sunday => "sunday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Ordinal used by `max_difficulty` constraints: easy=1, medium=2, hard=3.
    pub fn rank(&self) -> u8 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NutritionSummary {
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fat: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub cuisine: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub prep_time: u32,
    #[serde(default)]
    pub cook_time: u32,
    #[serde(default)]
    pub total_time: u32,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub nutrition: Option<NutritionSummary>,
    #[serde(default)]
    pub dietary_restrictions: Vec<String>,
    #[serde(default)]
    pub servings: Option<u32>,
    /// Explicit classification; untagged recipes fall back to the heuristics.
    #[serde(default)]
    pub meal_type: Option<MealType>,
    #[serde(default = "default_published")]
    pub is_published: bool,
}

fn default_published() -> bool {
    true
}

impl Recipe {
    pub fn calories(&self) -> f64 {
        self.nutrition
            .map(|n| n.calories)
            .unwrap_or(DEFAULT_RECIPE_CALORIES)
    }

    /// Nutrition as counted in plan tallies: a missing summary is the default
    /// calorie figure with no macros.
    pub fn nutrition_or_default(&self) -> NutritionSummary {
        self.nutrition.unwrap_or(NutritionSummary {
            calories: DEFAULT_RECIPE_CALORIES,
            ..Default::default()
        })
    }

    pub fn servings_or_default(&self) -> u32 {
        match self.servings {
            Some(s) if s > 0 => s,
            _ => DEFAULT_SERVINGS,
        }
    }

    /// Lowercased, trimmed ingredient keys used for repetition tracking.
    pub fn ingredient_keys(&self) -> Vec<String> {
        self.ingredients
            .iter()
            .map(|i| normalize_key(i))
            .filter(|i| !i.is_empty())
            .collect()
    }
}

pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// How a set of user restrictions is matched against a recipe's tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DietaryMatch {
    /// The recipe carries at least one of the user's tags.
    #[default]
    Overlap,
    /// The recipe carries every one of the user's tags.
    Coverage,
}

impl DietaryMatch {
    /// An empty restriction set matches every recipe under both modes.
    pub fn matches(&self, user_restrictions: &[String], recipe_tags: &[String]) -> bool {
        if user_restrictions.is_empty() {
            return true;
        }
        let has = |tag: &String| {
            let wanted = normalize_key(tag);
            recipe_tags.iter().any(|t| normalize_key(t) == wanted)
        };
        match self {
            DietaryMatch::Overlap => user_restrictions.iter().any(has),
            DietaryMatch::Coverage => user_restrictions.iter().all(has),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CookingTimePreference {
    Quick,
    #[default]
    Medium,
    Elaborate,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub dietary_restrictions: Vec<String>,
    #[serde(default)]
    pub favorite_cuisines: Vec<String>,
    #[serde(default)]
    pub cooking_time_preference: CookingTimePreference,
    /// Free-form profile fields the planner does not interpret.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl UserProfile {
    pub fn default_for(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dietary_restrictions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_preference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooking_time: Option<CookingTimePreference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine_variety: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prep_optimization: Option<bool>,
}

impl PlanPreferences {
    pub fn cuisine_variety_enabled(&self) -> bool {
        self.cuisine_variety.unwrap_or(true)
    }

    pub fn prep_optimization_enabled(&self) -> bool {
        self.prep_optimization.unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlanEntry {
    pub day: Day,
    pub meal_type: MealType,
    pub recipe_id: String,
    pub recipe_title: String,
    pub nutritional_score: f64,
    pub variety_score: f64,
    pub preference_score: f64,
    pub total_score: f64,
    pub servings: u32,
}
