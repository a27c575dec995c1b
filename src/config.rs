use crate::models::DietaryMatch;
use crate::optim::nutri_eval::ScoringWeights;
use crate::planner::PlannerOptions;
use crate::store::DEFAULT_RECIPE_LIMIT;
use anyhow::{anyhow, Context, Result};
use std::env;
use std::str::FromStr;

pub const DATA_URL_VAR: &str = "MEAL_PLANNER_DATA_URL";
pub const API_KEY_ENV_VAR: &str = "MEAL_PLANNER_API_KEY_ENV";
pub const RECIPE_LIMIT_VAR: &str = "MEAL_PLANNER_RECIPE_LIMIT";
pub const LOG_LEVEL_VAR: &str = "MEAL_PLANNER_LOG";
pub const LOG_JSON_VAR: &str = "MEAL_PLANNER_LOG_JSON";
pub const WEIGHT_NUTRITION_VAR: &str = "MEAL_PLANNER_WEIGHT_NUTRITION";
pub const WEIGHT_VARIETY_VAR: &str = "MEAL_PLANNER_WEIGHT_VARIETY";
pub const WEIGHT_PREFERENCE_VAR: &str = "MEAL_PLANNER_WEIGHT_PREFERENCE";
pub const POOL_DIETARY_MATCH_VAR: &str = "MEAL_PLANNER_POOL_DIETARY_MATCH";

/// Env var that holds the service key unless overridden.
pub const DEFAULT_SERVICE_KEY_VAR: &str = "MEAL_PLANNER_SERVICE_KEY";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq)]
pub struct PlannerConfig {
    pub data_url: Option<String>,
    pub api_key_env_var: String,
    pub recipe_limit: usize,
    pub log_level: String,
    pub log_json: bool,
    pub weights: ScoringWeights,
    pub pool_dietary_match: DietaryMatch,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            data_url: None,
            api_key_env_var: DEFAULT_SERVICE_KEY_VAR.to_string(),
            recipe_limit: DEFAULT_RECIPE_LIMIT,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_json: false,
            weights: ScoringWeights::default(),
            pool_dietary_match: DietaryMatch::default(),
        }
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: '{}'", name, raw)),
        _ => Ok(default),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

fn parse_dietary_match(raw: &str) -> Option<DietaryMatch> {
    match raw.trim().to_lowercase().as_str() {
        "overlap" | "any" => Some(DietaryMatch::Overlap),
        "coverage" | "all" => Some(DietaryMatch::Coverage),
        _ => None,
    }
}

impl PlannerConfig {
    /// Loads `.env` first, then reads the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let data_url = lookup(DATA_URL_VAR).filter(|url| !url.trim().is_empty());
        let api_key_env_var = lookup(API_KEY_ENV_VAR)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(defaults.api_key_env_var);
        let recipe_limit: usize = parse_var(&lookup, RECIPE_LIMIT_VAR, defaults.recipe_limit)?;
        if recipe_limit == 0 {
            return Err(anyhow!("{} must be at least 1", RECIPE_LIMIT_VAR));
        }
        let log_level = lookup(LOG_LEVEL_VAR)
            .filter(|level| !level.trim().is_empty())
            .unwrap_or(defaults.log_level);
        let log_json = match lookup(LOG_JSON_VAR) {
            Some(raw) => parse_flag(&raw)
                .ok_or_else(|| anyhow!("Invalid value for {}: '{}'", LOG_JSON_VAR, raw))?,
            None => defaults.log_json,
        };
        let weights = ScoringWeights {
            nutrition: parse_var(&lookup, WEIGHT_NUTRITION_VAR, defaults.weights.nutrition)?,
            variety: parse_var(&lookup, WEIGHT_VARIETY_VAR, defaults.weights.variety)?,
            preference: parse_var(&lookup, WEIGHT_PREFERENCE_VAR, defaults.weights.preference)?,
        }
        .normalized();
        let pool_dietary_match = match lookup(POOL_DIETARY_MATCH_VAR) {
            Some(raw) => parse_dietary_match(&raw)
                .ok_or_else(|| anyhow!("Invalid value for {}: '{}'", POOL_DIETARY_MATCH_VAR, raw))?,
            None => defaults.pool_dietary_match,
        };

        Ok(Self {
            data_url,
            api_key_env_var,
            recipe_limit,
            log_level,
            log_json,
            weights,
            pool_dietary_match,
        })
    }

    pub fn planner_options(&self) -> PlannerOptions {
        PlannerOptions {
            weights: self.weights,
            recipe_limit: self.recipe_limit,
            pool_dietary_match: self.pool_dietary_match,
        }
    }
}
