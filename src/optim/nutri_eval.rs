use crate::models::{
    normalize_key, CookingTimePreference, DietaryMatch, PlanPreferences, Recipe, UserProfile,
};
use crate::optim::constraints::{soft_violations, Constraint};
use crate::optim::plan_state::PlanState;
use serde::{Deserialize, Serialize};

pub const REPEAT_RECIPE_FACTOR: f64 = 0.3;
pub const INGREDIENT_OVERLAP_PENALTY: f64 = 0.5;
pub const PREP_OPTIMIZED_OVERLAP_PENALTY: f64 = 0.25;
pub const CUISINE_OVERUSE_FACTOR: f64 = 0.7;
/// A cuisine seen more than this many times counts as overused.
pub const CUISINE_OVERUSE_THRESHOLD: u32 = 2;
pub const VARIETY_FLOOR: f64 = 0.1;

pub const PREFERENCE_BASE: f64 = 0.5;
pub const DIETARY_CONFLICT_SCORE: f64 = 0.1;
pub const RESTRICTIONS_SATISFIED_BONUS: f64 = 0.2;
pub const FAVORITE_CUISINE_BONUS: f64 = 0.3;
pub const COOKING_TIME_BONUS: f64 = 0.2;
pub const SOFT_CONSTRAINT_PENALTY: f64 = 0.1;
pub const QUICK_MAX_MINUTES: u32 = 30;
pub const ELABORATE_MIN_MINUTES: u32 = 60;

/// Relative weight of each sub-score in the total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub nutrition: f64,
    pub variety: f64,
    pub preference: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self { nutrition: 0.4, variety: 0.3, preference: 0.3 }
    }
}

impl ScoringWeights {
    /// Rescales to a sum of 1 so the weighted total stays in [0,1].
    /// Negative weights count as zero; an all-zero set falls back to the defaults.
    pub fn normalized(&self) -> Self {
        let n = self.nutrition.max(0.0);
        let v = self.variety.max(0.0);
        let p = self.preference.max(0.0);
        let sum = n + v + p;
        if sum <= f64::EPSILON {
            return Self::default();
        }
        Self { nutrition: n / sum, variety: v / sum, preference: p / sum }
    }
}

/// Everything about the user the scorer needs, resolved once per run.
#[derive(Debug, Clone, Default)]
pub struct ScoringContext {
    pub dietary_restrictions: Vec<String>,
    pub favorite_cuisines: Vec<String>,
    pub cooking_time: CookingTimePreference,
    pub prep_optimization: bool,
    pub weights: ScoringWeights,
}

impl ScoringContext {
    /// Request preferences take precedence over the stored profile.
    pub fn new(profile: &UserProfile, preferences: &PlanPreferences, weights: ScoringWeights) -> Self {
        Self {
            dietary_restrictions: preferences
                .dietary_restrictions
                .clone()
                .unwrap_or_else(|| profile.dietary_restrictions.clone()),
            favorite_cuisines: profile.favorite_cuisines.iter().map(|c| normalize_key(c)).collect(),
            cooking_time: preferences.cooking_time.unwrap_or(profile.cooking_time_preference),
            prep_optimization: preferences.prep_optimization_enabled(),
            weights: weights.normalized(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub nutritional: f64,
    pub variety: f64,
    pub preference: f64,
    pub total: f64,
}

/// Closeness of a recipe's calories to the slot target:
/// `max(0, 1 - |recipe - target| / target)`.
pub fn nutritional_fit(recipe_calories: f64, target_calories: f64) -> f64 {
    if target_calories <= 0.0 {
        return if recipe_calories <= 0.0 { 1.0 } else { 0.0 };
    }
    let deviation = (recipe_calories - target_calories).abs() / target_calories;
    (1.0 - deviation).clamp(0.0, 1.0)
}

/// Penalises repeating a recipe, reusing ingredients, and leaning on one cuisine.
pub fn variety_score(recipe: &Recipe, state: &PlanState, prep_optimization: bool) -> f64 {
    let mut score = 1.0;

    if state.is_used(&recipe.id) {
        score *= REPEAT_RECIPE_FACTOR;
    }

    let keys = recipe.ingredient_keys();
    if !keys.is_empty() {
        let seen = keys.iter().filter(|k| state.ingredient_uses(k) > 0).count();
        let overlap = seen as f64 / keys.len() as f64;
        let penalty = if prep_optimization {
            PREP_OPTIMIZED_OVERLAP_PENALTY
        } else {
            INGREDIENT_OVERLAP_PENALTY
        };
        score *= 1.0 - overlap * penalty;
    }

    if let Some(cuisine) = &recipe.cuisine {
        if state.cuisine_count(cuisine) > CUISINE_OVERUSE_THRESHOLD {
            score *= CUISINE_OVERUSE_FACTOR;
        }
    }

    score.clamp(VARIETY_FLOOR, 1.0)
}

/// Match against dietary needs, favourite cuisines, cooking time and soft constraints.
///
/// A recipe whose tags do not cover every user restriction scores exactly
/// [`DIETARY_CONFLICT_SCORE`], whatever else it has going for it.
pub fn preference_match(recipe: &Recipe, ctx: &ScoringContext, constraints: &[Constraint]) -> f64 {
    let restricted = !ctx.dietary_restrictions.is_empty();
    if restricted && !DietaryMatch::Coverage.matches(&ctx.dietary_restrictions, &recipe.dietary_restrictions) {
        return DIETARY_CONFLICT_SCORE;
    }

    let mut score = PREFERENCE_BASE;
    if restricted {
        score += RESTRICTIONS_SATISFIED_BONUS;
    }
    if let Some(cuisine) = &recipe.cuisine {
        if ctx.favorite_cuisines.contains(&normalize_key(cuisine)) {
            score += FAVORITE_CUISINE_BONUS;
        }
    }
    let time_match = match ctx.cooking_time {
        CookingTimePreference::Quick => recipe.total_time <= QUICK_MAX_MINUTES,
        CookingTimePreference::Elaborate => recipe.total_time >= ELABORATE_MIN_MINUTES,
        CookingTimePreference::Medium => false,
    };
    if time_match {
        score += COOKING_TIME_BONUS;
    }

    let score = score.min(1.0);
    let violations = soft_violations(recipe, constraints) as f64;
    (score - violations * SOFT_CONSTRAINT_PENALTY).clamp(DIETARY_CONFLICT_SCORE, 1.0)
}

pub fn score_recipe(
    recipe: &Recipe,
    target_calories: f64,
    state: &PlanState,
    ctx: &ScoringContext,
    constraints: &[Constraint],
) -> ScoreBreakdown {
    let nutritional = nutritional_fit(recipe.calories(), target_calories);
    let variety = variety_score(recipe, state, ctx.prep_optimization);
    let preference = preference_match(recipe, ctx, constraints);
    let w = ctx.weights;
    let total = (w.nutrition * nutritional + w.variety * variety + w.preference * preference).clamp(0.0, 1.0);
    ScoreBreakdown { nutritional, variety, preference, total }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Day;
    use crate::optim::constraints::ConstraintRule;
    use serde_json::json;

    fn recipe(value: serde_json::Value) -> Recipe {
        serde_json::from_value(value).unwrap()
    }

    fn ctx() -> ScoringContext {
        ScoringContext { weights: ScoringWeights::default(), ..Default::default() }
    }

    #[test]
    fn test_nutritional_fit_scenario_a() {
        let fit = nutritional_fit(520.0, 2000.0 * 0.25);
        assert!((fit - 0.96).abs() < 1e-9);
        assert_eq!(nutritional_fit(500.0, 500.0), 1.0);
        assert_eq!(nutritional_fit(1500.0, 500.0), 0.0);
        assert_eq!(nutritional_fit(100.0, 0.0), 0.0);
    }

    #[test]
    fn test_missing_nutrition_defaults_to_400() {
        let r = recipe(json!({"id": "r", "title": "t"}));
        let fit = nutritional_fit(r.calories(), 500.0);
        assert!((fit - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_used_recipe_variety_penalised() {
        let r = recipe(json!({"id": "r", "title": "t", "ingredients": ["kale"]}));
        let fresh_state = PlanState::new(true);
        let fresh = variety_score(&r, &fresh_state, false);
        assert_eq!(fresh, 1.0);

        let mut used_state = PlanState::new(true);
        used_state.begin_day(Day::Monday);
        used_state.record(&r);
        let used = variety_score(&r, &used_state, false);
        // repeated recipe and fully overlapping ingredients
        assert!((used - 0.3 * 0.5).abs() < 1e-9);
        assert!(used <= 0.3 * fresh);
    }

    #[test]
    fn test_ingredient_overlap_fraction() {
        let mut state = PlanState::new(true);
        state.begin_day(Day::Monday);
        state.record(&recipe(json!({"id": "a", "title": "a", "ingredients": ["Rice", "beans"]})));
        let r = recipe(json!({"id": "b", "title": "b", "ingredients": ["rice", "corn", "lime", "beans"]}));
        assert!((variety_score(&r, &state, false) - 0.75).abs() < 1e-9);
        assert!((variety_score(&r, &state, true) - 0.875).abs() < 1e-9);
    }

    #[test]
    fn test_cuisine_overuse_after_three() {
        let mut state = PlanState::new(false);
        state.begin_day(Day::Monday);
        for id in ["a", "b"] {
            state.record(&recipe(json!({"id": id, "title": id, "cuisine": "Mexican"})));
        }
        let r = recipe(json!({"id": "c", "title": "c", "cuisine": "mexican"}));
        assert_eq!(variety_score(&r, &state, false), 1.0);
        state.record(&recipe(json!({"id": "d", "title": "d", "cuisine": "Mexican"})));
        assert!((variety_score(&r, &state, false) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_dietary_conflict_short_circuits_scenario_b() {
        let mut context = ctx();
        context.dietary_restrictions = vec!["vegan".to_string()];
        context.favorite_cuisines = vec!["italian".to_string()];
        context.cooking_time = CookingTimePreference::Quick;
        let r = recipe(json!({
            "id": "r", "title": "t", "cuisine": "Italian", "total_time": 10,
            "dietary_restrictions": ["vegetarian"]
        }));
        assert_eq!(preference_match(&r, &context, &[]), DIETARY_CONFLICT_SCORE);
    }

    #[test]
    fn test_preference_bonuses_capped() {
        let mut context = ctx();
        context.dietary_restrictions = vec!["vegan".to_string()];
        context.favorite_cuisines = vec!["italian".to_string()];
        context.cooking_time = CookingTimePreference::Quick;
        let r = recipe(json!({
            "id": "r", "title": "t", "cuisine": "Italian", "total_time": 25,
            "dietary_restrictions": ["vegan", "vegetarian"]
        }));
        assert_eq!(preference_match(&r, &context, &[]), 1.0);

        let plain = recipe(json!({"id": "p", "title": "p", "total_time": 90}));
        assert_eq!(preference_match(&plain, &ctx(), &[]), PREFERENCE_BASE);
        let mut elaborate = ctx();
        elaborate.cooking_time = CookingTimePreference::Elaborate;
        assert!((preference_match(&plain, &elaborate, &[]) - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_soft_constraint_lowers_preference() {
        let r = recipe(json!({"id": "r", "title": "t", "total_time": 90}));
        let soft = vec![Constraint::soft(ConstraintRule::MaxTotalTime(30))];
        assert!((preference_match(&r, &ctx(), &soft) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_total_is_weighted_sum() {
        let r = recipe(json!({"id": "r", "title": "t", "nutrition": {"calories": 500.0}}));
        let state = PlanState::new(true);
        let s = score_recipe(&r, 500.0, &state, &ctx(), &[]);
        assert!((s.total - (0.4 * 1.0 + 0.3 * 1.0 + 0.3 * 0.5)).abs() < 1e-9);
    }

    #[test]
    fn test_weights_normalized() {
        let w = ScoringWeights { nutrition: 2.0, variety: 1.0, preference: 1.0 }.normalized();
        assert!((w.nutrition - 0.5).abs() < 1e-9);
        assert_eq!(ScoringWeights { nutrition: 0.0, variety: 0.0, preference: 0.0 }.normalized(), ScoringWeights::default());
    }

    #[test]
    fn test_context_prefers_request_values() {
        let profile = UserProfile {
            dietary_restrictions: vec!["vegan".to_string()],
            favorite_cuisines: vec!["Thai".to_string()],
            cooking_time_preference: CookingTimePreference::Elaborate,
            ..Default::default()
        };
        let prefs = PlanPreferences {
            dietary_restrictions: Some(vec!["keto".to_string()]),
            cooking_time: Some(CookingTimePreference::Quick),
            ..Default::default()
        };
        let context = ScoringContext::new(&profile, &prefs, ScoringWeights::default());
        assert_eq!(context.dietary_restrictions, vec!["keto"]);
        assert_eq!(context.favorite_cuisines, vec!["thai"]);
        assert_eq!(context.cooking_time, CookingTimePreference::Quick);
    }
}
