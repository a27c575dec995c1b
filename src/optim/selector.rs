use crate::models::{Day, MealPlanEntry, MealType, Recipe};
use crate::optim::constraints::{satisfies_hard_constraints, Constraint};
use crate::optim::nutri_eval::{score_recipe, ScoreBreakdown, ScoringContext};
use crate::optim::plan_state::PlanState;
use crate::optim::targets::NutritionTargets;
use tracing::{debug, warn};

/// Outcome of filling one (day, meal type) slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotSelection {
    pub entry: MealPlanEntry,
    /// Set when no candidate met the hard constraints and the best overall was used.
    pub constraint_relaxed: bool,
}

struct Scored<'a> {
    recipe: &'a Recipe,
    scores: ScoreBreakdown,
    feasible: bool,
}

/// Highest total wins; equal totals go to the smaller recipe id, then to input order.
fn is_better(candidate: &Scored<'_>, current: &Scored<'_>) -> bool {
    candidate.scores.total > current.scores.total
        || (candidate.scores.total == current.scores.total && candidate.recipe.id < current.recipe.id)
}

fn pick_best<'s, 'a>(scored: impl Iterator<Item = &'s Scored<'a>>) -> Option<&'s Scored<'a>>
where
    'a: 's,
{
    scored.fold(None, |best, candidate| match best {
        Some(current) if !is_better(candidate, current) => Some(current),
        _ => Some(candidate),
    })
}

/// `max(1, round(target / per-serving calories))`, or the recipe's own yield
/// when its calories are unusable.
pub fn compute_servings(recipe: &Recipe, target_calories: f64) -> u32 {
    let default_servings = recipe.servings_or_default();
    let per_serving = recipe.calories() / f64::from(default_servings);
    if per_serving <= 0.0 || !per_serving.is_finite() {
        return default_servings;
    }
    let servings = (target_calories / per_serving).round();
    if servings.is_finite() && servings >= 1.0 {
        servings.min(f64::from(u32::MAX)) as u32
    } else {
        1
    }
}

/// Fills a single slot and records the choice in `state`.
///
/// Returns `None` when the meal type has no candidates at all.
pub fn select_for_slot(
    day: Day,
    meal_type: MealType,
    candidates: &[Recipe],
    targets: &NutritionTargets,
    state: &mut PlanState,
    ctx: &ScoringContext,
    constraints: &[Constraint],
) -> Option<SlotSelection> {
    state.begin_day(day);
    let target_calories = targets.target_calories(meal_type);

    if candidates.is_empty() {
        warn!(%day, %meal_type, "no candidates for slot, leaving it empty");
        return None;
    }

    let scored: Vec<Scored<'_>> = candidates
        .iter()
        .map(|recipe| Scored {
            recipe,
            scores: score_recipe(recipe, target_calories, state, ctx, constraints),
            feasible: satisfies_hard_constraints(recipe, constraints),
        })
        .collect();

    let (chosen, constraint_relaxed) = match pick_best(scored.iter().filter(|s| s.feasible)) {
        Some(best) => (best, false),
        None => {
            let best = pick_best(scored.iter())?;
            warn!(
                %day,
                %meal_type,
                recipe_id = %best.recipe.id,
                "no candidate satisfies the hard constraints, relaxing them for this slot"
            );
            (best, true)
        }
    };

    let recipe = chosen.recipe;
    let scores = chosen.scores;
    let servings = compute_servings(recipe, target_calories);
    debug!(
        %day,
        %meal_type,
        recipe_id = %recipe.id,
        total = scores.total,
        servings,
        "slot filled"
    );

    state.record(recipe);

    Some(SlotSelection {
        entry: MealPlanEntry {
            day,
            meal_type,
            recipe_id: recipe.id.clone(),
            recipe_title: recipe.title.clone(),
            nutritional_score: scores.nutritional,
            variety_score: scores.variety,
            preference_score: scores.preference,
            total_score: scores.total,
            servings,
        },
        constraint_relaxed,
    })
}
