use crate::models::{normalize_key, Day, NutritionSummary, Recipe};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

macro_rules! accumulate {
    ($target:expr, $source:expr; $($field:ident),+) => {
        $( $target.$field += $source.$field; )+
    };
}

/// Running aggregate threaded through the slot loop.
///
/// Created empty per run, mutated by each successful selection and never
/// rolled back.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlanState {
    current_day: Option<Day>,
    daily: NutritionSummary,
    weekly: NutritionSummary,
    finished_days: Vec<(Day, NutritionSummary)>,
    used_recipes: HashSet<String>,
    ingredient_usage: HashMap<String, u32>,
    cuisine_counts: HashMap<String, u32>,
    track_used_recipes: bool,
}

impl PlanState {
    /// `track_used_recipes` mirrors the caller's cuisine-variety preference.
    pub fn new(track_used_recipes: bool) -> Self {
        Self {
            track_used_recipes,
            ..Default::default()
        }
    }

    /// Starts a new day: the previous day's tally is archived and reset.
    pub fn begin_day(&mut self, day: Day) {
        if self.current_day == Some(day) {
            return;
        }
        if let Some(previous) = self.current_day.take() {
            self.finished_days.push((previous, self.daily));
        }
        self.daily = NutritionSummary::default();
        self.current_day = Some(day);
    }

    pub fn record(&mut self, recipe: &Recipe) {
        let nutrition = recipe.nutrition_or_default();
        accumulate!(self.daily, nutrition; calories, protein, carbs, fat);
        accumulate!(self.weekly, nutrition; calories, protein, carbs, fat);

        for key in recipe.ingredient_keys() {
            *self.ingredient_usage.entry(key).or_insert(0) += 1;
        }
        if let Some(cuisine) = &recipe.cuisine {
            *self.cuisine_counts.entry(normalize_key(cuisine)).or_insert(0) += 1;
        }
        if self.track_used_recipes {
            self.used_recipes.insert(recipe.id.clone());
        }
    }

    pub fn is_used(&self, recipe_id: &str) -> bool {
        self.used_recipes.contains(recipe_id)
    }

    pub fn ingredient_uses(&self, key: &str) -> u32 {
        self.ingredient_usage.get(key).copied().unwrap_or(0)
    }

    pub fn cuisine_count(&self, cuisine: &str) -> u32 {
        self.cuisine_counts
            .get(&normalize_key(cuisine))
            .copied()
            .unwrap_or(0)
    }

    pub fn daily(&self) -> NutritionSummary {
        self.daily
    }

    pub fn weekly(&self) -> NutritionSummary {
        self.weekly
    }

    /// Per-day totals for every day started so far, the current one included.
    pub fn daily_totals(&self) -> Vec<(Day, NutritionSummary)> {
        let mut totals = self.finished_days.clone();
        if let Some(day) = self.current_day {
            totals.push((day, self.daily));
        }
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn recipe(id: &str, calories: f64, ingredients: &[&str]) -> Recipe {
        serde_json::from_value(json!({
            "id": id,
            "title": id,
            "cuisine": "Italian",
            "ingredients": ingredients,
            "nutrition": {"calories": calories, "protein": 10.0, "carbs": 20.0, "fat": 5.0}
        }))
        .unwrap()
    }

    #[test]
    fn test_daily_resets_weekly_accumulates() {
        let mut state = PlanState::new(true);
        state.begin_day(Day::Monday);
        state.record(&recipe("a", 500.0, &["egg"]));
        state.record(&recipe("b", 300.0, &["Egg", "toast"]));
        assert_eq!(state.daily().calories, 800.0);

        state.begin_day(Day::Tuesday);
        assert_eq!(state.daily().calories, 0.0);
        state.record(&recipe("c", 200.0, &["rice"]));
        assert_eq!(state.weekly().calories, 1000.0);
        assert_eq!(state.weekly().protein, 30.0);

        let totals = state.daily_totals();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0], (Day::Monday, NutritionSummary { calories: 800.0, protein: 20.0, carbs: 40.0, fat: 10.0 }));
        assert_eq!(totals[1].1.calories, 200.0);
    }

    #[test]
    fn test_usage_tracking() {
        let mut state = PlanState::new(true);
        state.begin_day(Day::Monday);
        state.record(&recipe("a", 500.0, &["Egg"]));
        state.record(&recipe("b", 500.0, &[" egg "]));
        assert_eq!(state.ingredient_uses("egg"), 2);
        assert_eq!(state.cuisine_count("ITALIAN"), 2);
        assert!(state.is_used("a"));
    }

    #[test]
    fn test_used_set_untracked_without_variety() {
        let mut state = PlanState::new(false);
        state.begin_day(Day::Monday);
        state.record(&recipe("a", 500.0, &["egg"]));
        assert!(!state.is_used("a"));
    }

    #[test]
    fn test_missing_nutrition_counts_default_calories() {
        let mut state = PlanState::new(true);
        state.begin_day(Day::Monday);
        let bare: Recipe = serde_json::from_value(json!({"id": "x", "title": "x"})).unwrap();
        state.record(&bare);
        assert_eq!(state.weekly().calories, crate::models::DEFAULT_RECIPE_CALORIES);
        assert_eq!(state.weekly().protein, 0.0);
    }
}
