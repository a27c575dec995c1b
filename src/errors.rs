use crate::models::{Day, MealType};
use crate::store::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failures that abort a planning run. Nothing is persisted when one is returned.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("failed to load {what}")]
    DataSource {
        what: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("failed to persist meal plan")]
    Persistence {
        #[source]
        source: StoreError,
    },

    #[error("{0} not found")]
    NotFound(String),
}

impl PlannerError {
    pub fn data_source(what: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| PlannerError::DataSource { what, source }
    }

    pub fn persistence(source: StoreError) -> Self {
        PlannerError::Persistence { source }
    }

    /// HTTP-style status for the failure output.
    pub fn status_code(&self) -> u16 {
        match self {
            PlannerError::InvalidRequest(_) => 400,
            PlannerError::NotFound(_) => 404,
            PlannerError::DataSource { .. } => 502,
            PlannerError::Persistence { .. } => 500,
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        let details = match self {
            PlannerError::InvalidRequest(reason) | PlannerError::NotFound(reason) => reason.clone(),
            PlannerError::DataSource { source, .. } | PlannerError::Persistence { source } => {
                source.to_string()
            }
        };
        ErrorResponse {
            error: self.to_string(),
            details,
        }
    }
}

/// Failure output: `{ error, details }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: String,
}

/// Non-fatal conditions surfaced in the optimization summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanWarning {
    /// The meal type had no candidates, so the slot was left empty.
    PartialPlan { day: Day, meal_type: MealType },
    /// No candidate met the hard constraints; the best overall was used instead.
    ConstraintRelaxed {
        day: Day,
        meal_type: MealType,
        recipe_id: String,
    },
}

impl fmt::Display for PlanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanWarning::PartialPlan { day, meal_type } => {
                write!(f, "{} {}: no candidate recipes, slot skipped", day, meal_type)
            }
            PlanWarning::ConstraintRelaxed { day, meal_type, recipe_id } => write!(
                f,
                "{} {}: hard constraints relaxed, selected {}",
                day, meal_type, recipe_id
            ),
        }
    }
}
