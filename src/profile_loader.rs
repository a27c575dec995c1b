use crate::errors::PlannerError;
use crate::models::UserProfile;
use crate::optim::constraints::{constraints_from_rows, Constraint};
use crate::optim::targets::NutritionTargets;
use crate::store::PlannerStore;
use tracing::{debug, info};

/// Per-user inputs to a planning run, with defaults filled in.
#[derive(Debug, Clone)]
pub struct PlanningInputs {
    pub profile: UserProfile,
    pub targets: NutritionTargets,
    pub constraints: Vec<Constraint>,
}

/// Loads the profile, nutrition targets and planning constraints concurrently.
///
/// A missing profile or target row falls back to defaults; a failed lookup
/// aborts the run.
pub async fn load_planning_inputs(store: &dyn PlannerStore, user_id: &str) -> Result<PlanningInputs, PlannerError> {
    let (profile, targets, rows) = tokio::try_join!(
        async {
            store
                .fetch_profile(user_id)
                .await
                .map_err(PlannerError::data_source("user profile"))
        },
        async {
            store
                .fetch_nutrition_targets(user_id)
                .await
                .map_err(PlannerError::data_source("nutrition targets"))
        },
        async {
            store
                .fetch_constraints(user_id)
                .await
                .map_err(PlannerError::data_source("planning constraints"))
        },
    )?;

    if profile.is_none() {
        debug!(%user_id, "no profile row, using defaults");
    }
    if targets.is_none() {
        debug!(%user_id, "no nutrition targets row, using defaults");
    }

    let constraints = constraints_from_rows(&rows);
    info!(
        %user_id,
        constraints = constraints.len(),
        hard = constraints.iter().filter(|c| c.is_hard).count(),
        "planning inputs loaded"
    );

    Ok(PlanningInputs {
        profile: profile.unwrap_or_else(|| UserProfile::default_for(user_id)),
        targets: targets.unwrap_or_default(),
        constraints,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CookingTimePreference;
    use crate::optim::constraints::{ConstraintRow, ConstraintType};
    use crate::store::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_defaults_for_unknown_user() {
        let store = MemoryStore::new();
        let inputs = load_planning_inputs(&store, "ghost").await.unwrap();
        assert_eq!(inputs.profile.user_id, "ghost");
        assert!(inputs.profile.dietary_restrictions.is_empty());
        assert_eq!(inputs.profile.cooking_time_preference, CookingTimePreference::Medium);
        assert_eq!(inputs.targets.daily_calories, 2000.0);
        assert!(inputs.constraints.is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_constraints_are_dropped() {
        let store = MemoryStore::new();
        store
            .insert_constraint(
                "u1",
                ConstraintRow {
                    constraint_type: ConstraintType::MaxPrepTime,
                    constraint_value: json!({"max_minutes": 20}),
                    is_hard_constraint: false,
                    priority: 2,
                },
            )
            .await;
        store
            .insert_constraint(
                "u1",
                ConstraintRow {
                    constraint_type: ConstraintType::MaxDifficulty,
                    constraint_value: json!(["not", "a", "level"]),
                    is_hard_constraint: true,
                    priority: 1,
                },
            )
            .await;
        let inputs = load_planning_inputs(&store, "u1").await.unwrap();
        assert_eq!(inputs.constraints.len(), 1);
        assert!(!inputs.constraints[0].is_hard);
    }

    #[tokio::test]
    async fn test_store_failure_is_data_source_error() {
        let store = MemoryStore::new();
        store.fail_reads(true).await;
        let err = load_planning_inputs(&store, "u1").await.unwrap_err();
        assert!(matches!(err, PlannerError::DataSource { .. }));
        assert_eq!(err.status_code(), 502);
    }
}
