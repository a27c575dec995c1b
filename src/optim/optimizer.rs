use crate::errors::PlanWarning;
use crate::models::{normalize_key, MealPlanEntry, NutritionSummary, Recipe};
use crate::optim::targets::{macro_calories, NutritionTargets};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const IDEAL_PROTEIN_SHARE: f64 = 0.25;
pub const IDEAL_CARB_SHARE: f64 = 0.45;
pub const IDEAL_FAT_SHARE: f64 = 0.30;
pub const CALORIE_VARIANCE_TOLERANCE: f64 = 0.10;
pub const DAYS_PER_WEEK: f64 = 7.0;
pub const SLOTS_PER_WEEK: usize = 28;

const LOW_CUISINE_VARIETY: usize = 3;
const LOW_MACRO_BALANCE: f64 = 0.7;
const LOW_INGREDIENT_EFFICIENCY: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationSummary {
    pub total_meals: usize,
    pub cuisine_variety: usize,
    pub ingredient_efficiency: f64,
    pub nutrition_balance: f64,
    #[serde(default)]
    pub weekly_nutrition: NutritionSummary,
    #[serde(default)]
    pub average_daily_calories: f64,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<PlanWarning>,
}

/// Score in [0,1] for how close the calorie split is to 25/45/30 protein/carbs/fat:
/// `1 - (sum of absolute share deviations) / 3`.
pub fn macro_balance_score(totals: &NutritionSummary) -> f64 {
    let (protein, carbs, fat) = macro_calories(totals);
    let macro_total = protein + carbs + fat;
    if macro_total <= 0.0 {
        return 0.0;
    }
    let deviation = (protein / macro_total - IDEAL_PROTEIN_SHARE).abs()
        + (carbs / macro_total - IDEAL_CARB_SHARE).abs()
        + (fat / macro_total - IDEAL_FAT_SHARE).abs();
    (1.0 - deviation / 3.0).max(0.0)
}

/// Distinct ingredients over total ingredient occurrences; lower means more reuse.
pub fn ingredient_efficiency(recipes: &[&Recipe]) -> f64 {
    let mut unique = HashSet::new();
    let mut occurrences = 0usize;
    for recipe in recipes {
        for key in recipe.ingredient_keys() {
            occurrences += 1;
            unique.insert(key);
        }
    }
    if occurrences == 0 {
        return 0.0;
    }
    unique.len() as f64 / occurrences as f64
}

/// Post-pass over the assembled plan. Entries whose recipe cannot be found
/// still count as meals but contribute no nutrition, cuisine or ingredients.
pub fn summarize<'a, F>(
    entries: &[MealPlanEntry],
    lookup: F,
    targets: &NutritionTargets,
    warnings: Vec<PlanWarning>,
) -> OptimizationSummary
where
    F: Fn(&str) -> Option<&'a Recipe>,
{
    let recipes: Vec<&Recipe> = entries.iter().filter_map(|e| lookup(&e.recipe_id)).collect();

    let mut weekly = NutritionSummary::default();
    for recipe in &recipes {
        let n = recipe.nutrition_or_default();
        weekly.calories += n.calories;
        weekly.protein += n.protein;
        weekly.carbs += n.carbs;
        weekly.fat += n.fat;
    }

    let cuisine_variety = recipes
        .iter()
        .filter_map(|r| r.cuisine.as_deref())
        .map(normalize_key)
        .collect::<HashSet<_>>()
        .len();
    let efficiency = ingredient_efficiency(&recipes);
    let balance = macro_balance_score(&weekly);
    let average_daily_calories = weekly.calories / DAYS_PER_WEEK;

    let notes = build_notes(
        entries.len(),
        cuisine_variety,
        efficiency,
        balance,
        average_daily_calories,
        targets,
        &warnings,
    );

    OptimizationSummary {
        total_meals: entries.len(),
        cuisine_variety,
        ingredient_efficiency: efficiency,
        nutrition_balance: balance,
        weekly_nutrition: weekly,
        average_daily_calories,
        notes,
        warnings,
    }
}

fn build_notes(
    total_meals: usize,
    cuisine_variety: usize,
    efficiency: f64,
    balance: f64,
    average_daily_calories: f64,
    targets: &NutritionTargets,
    warnings: &[PlanWarning],
) -> Vec<String> {
    let mut notes = Vec::new();

    if targets.daily_calories > 0.0 {
        let variance = (average_daily_calories - targets.daily_calories) / targets.daily_calories;
        if variance.abs() > CALORIE_VARIANCE_TOLERANCE {
            notes.push(format!(
                "Average daily calories ({:.0} kcal) are {:.0}% {} the {:.0} kcal target",
                average_daily_calories,
                variance.abs() * 100.0,
                if variance > 0.0 { "above" } else { "below" },
                targets.daily_calories
            ));
        } else {
            notes.push("Average daily calories are within 10% of the target".to_string());
        }
    }

    if total_meals > 0 && cuisine_variety < LOW_CUISINE_VARIETY {
        notes.push(format!("Low cuisine variety: only {} distinct cuisines", cuisine_variety));
    }
    if total_meals > 0 && balance < LOW_MACRO_BALANCE {
        notes.push(format!(
            "Macro split is far from 25/45/30 protein/carbs/fat (balance {:.2})",
            balance
        ));
    }
    if total_meals > 0 && efficiency < LOW_INGREDIENT_EFFICIENCY {
        notes.push(format!(
            "Ingredients are heavily reused across the week (efficiency {:.2})",
            efficiency
        ));
    }

    let skipped = warnings.iter().filter(|w| matches!(w, PlanWarning::PartialPlan { .. })).count();
    if skipped > 0 {
        notes.push(format!("{} of {} slots could not be filled", skipped, SLOTS_PER_WEEK));
    }
    let relaxed = warnings
        .iter()
        .filter(|w| matches!(w, PlanWarning::ConstraintRelaxed { .. }))
        .count();
    if relaxed > 0 {
        notes.push(format!("{} slots relaxed hard constraints to find a recipe", relaxed));
    }

    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Day, MealType};
    use serde_json::json;
    use std::collections::HashMap;

    fn recipe(id: &str, cuisine: &str, ingredients: &[&str], kcal: f64) -> Recipe {
        serde_json::from_value(json!({
            "id": id,
            "title": id,
            "cuisine": cuisine,
            "ingredients": ingredients,
            "nutrition": {"calories": kcal, "protein": 25.0, "carbs": 45.0, "fat": 13.333333333333334}
        }))
        .unwrap()
    }

    fn entry(day: Day, meal_type: MealType, id: &str) -> MealPlanEntry {
        MealPlanEntry {
            day,
            meal_type,
            recipe_id: id.to_string(),
            recipe_title: id.to_string(),
            nutritional_score: 1.0,
            variety_score: 1.0,
            preference_score: 0.5,
            total_score: 0.85,
            servings: 2,
        }
    }

    #[test]
    fn test_macro_balance() {
        // 100/180/120 kcal of a 400 kcal macro total: exactly the ideal split
        let ideal = NutritionSummary { calories: 400.0, protein: 25.0, carbs: 45.0, fat: 40.0 / 3.0 };
        assert!((macro_balance_score(&ideal) - 1.0).abs() < 1e-9);
        let protein_only = NutritionSummary { calories: 100.0, protein: 25.0, carbs: 0.0, fat: 0.0 };
        // deviations 0.75 + 0.45 + 0.30 = 1.5
        assert!((macro_balance_score(&protein_only) - 0.5).abs() < 1e-9);
        assert_eq!(macro_balance_score(&NutritionSummary::default()), 0.0);
    }

    #[test]
    fn test_ingredient_efficiency() {
        let a = recipe("a", "Thai", &["rice", "lime"], 500.0);
        let b = recipe("b", "Thai", &["Rice", "tofu"], 500.0);
        assert!((ingredient_efficiency(&[&a, &b]) - 0.75).abs() < 1e-9);
        assert_eq!(ingredient_efficiency(&[]), 0.0);
    }

    #[test]
    fn test_summary_counts_and_notes() {
        let recipes: HashMap<String, Recipe> = [
            recipe("a", "Thai", &["rice"], 1000.0),
            recipe("b", "thai", &["noodles"], 1000.0),
        ]
        .into_iter()
        .map(|r| (r.id.clone(), r))
        .collect();
        let entries = vec![entry(Day::Monday, MealType::Lunch, "a"), entry(Day::Monday, MealType::Dinner, "b")];
        let warnings = vec![PlanWarning::PartialPlan { day: Day::Monday, meal_type: MealType::Snack }];

        let summary = summarize(&entries, |id| recipes.get(id), &NutritionTargets::default(), warnings);
        assert_eq!(summary.total_meals, 2);
        assert_eq!(summary.cuisine_variety, 1);
        assert_eq!(summary.weekly_nutrition.calories, 2000.0);
        assert!((summary.average_daily_calories - 2000.0 / 7.0).abs() < 1e-9);
        assert!(summary.notes.iter().any(|n| n.contains("below the 2000 kcal target")));
        assert!(summary.notes.iter().any(|n| n.contains("Low cuisine variety")));
        assert!(summary.notes.iter().any(|n| n.contains("1 of 28 slots")));
        assert_eq!(summary.warnings.len(), 1);
    }

    #[test]
    fn test_on_target_week() {
        let r = recipe("a", "Greek", &["feta"], 500.0);
        let entries: Vec<MealPlanEntry> = Day::ALL
            .iter()
            .flat_map(|d| MealType::ALL.iter().map(move |m| entry(*d, *m, "a")))
            .collect();
        let summary = summarize(&entries, |_| Some(&r), &NutritionTargets::default(), Vec::new());
        assert_eq!(summary.total_meals, 28);
        assert!((summary.average_daily_calories - 2000.0).abs() < 1e-9);
        assert!(summary.notes.iter().any(|n| n.contains("within 10%")));
    }
}
