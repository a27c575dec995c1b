use crate::models::{normalize_key, Difficulty, Recipe};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintType {
    MaxPrepTime,
    MaxTotalTime,
    IngredientBlacklist,
    CuisineBlacklist,
    MaxDifficulty,
}

/// Planning constraint as stored: the payload shape depends on the type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintRow {
    pub constraint_type: ConstraintType,
    #[serde(default)]
    pub constraint_value: Value,
    #[serde(default = "default_hard")]
    pub is_hard_constraint: bool,
    #[serde(default)]
    pub priority: i32,
}

fn default_hard() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintRule {
    MaxPrepTime(u32),
    MaxTotalTime(u32),
    /// Lowercased terms matched as substrings of ingredient lines.
    IngredientBlacklist(Vec<String>),
    /// Lowercased cuisine names.
    CuisineBlacklist(Vec<String>),
    MaxDifficulty(Difficulty),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub rule: ConstraintRule,
    pub is_hard: bool,
    /// Only used to order the fetch; never weights evaluation.
    pub priority: i32,
}

impl Constraint {
    pub fn hard(rule: ConstraintRule) -> Self {
        Self { rule, is_hard: true, priority: 0 }
    }

    pub fn soft(rule: ConstraintRule) -> Self {
        Self { rule, is_hard: false, priority: 0 }
    }

    /// Parses a stored row; `None` when the payload does not fit the type.
    pub fn from_row(row: &ConstraintRow) -> Option<Self> {
        let rule = parse_rule(row.constraint_type, &row.constraint_value)?;
        Some(Self {
            rule,
            is_hard: row.is_hard_constraint,
            priority: row.priority,
        })
    }

    pub fn is_satisfied_by(&self, recipe: &Recipe) -> bool {
        self.rule.is_satisfied_by(recipe)
    }
}

impl ConstraintRule {
    pub fn is_satisfied_by(&self, recipe: &Recipe) -> bool {
        match self {
            ConstraintRule::MaxPrepTime(max) => recipe.prep_time <= *max,
            ConstraintRule::MaxTotalTime(max) => recipe.total_time <= *max,
            ConstraintRule::IngredientBlacklist(terms) => !recipe.ingredients.iter().any(|line| {
                let line = line.to_lowercase();
                terms.iter().any(|term| line.contains(term.as_str()))
            }),
            ConstraintRule::CuisineBlacklist(cuisines) => match &recipe.cuisine {
                Some(cuisine) => !cuisines.contains(&normalize_key(cuisine)),
                None => true,
            },
            ConstraintRule::MaxDifficulty(max) => recipe.difficulty.rank() <= max.rank(),
        }
    }
}

/// Converts stored rows, dropping (and logging) any whose payload is unusable.
pub fn constraints_from_rows(rows: &[ConstraintRow]) -> Vec<Constraint> {
    rows.iter()
        .filter_map(|row| {
            let parsed = Constraint::from_row(row);
            if parsed.is_none() {
                warn!(
                    constraint_type = ?row.constraint_type,
                    value = %row.constraint_value,
                    "ignoring constraint with unreadable value"
                );
            }
            parsed
        })
        .collect()
}

/// True only if the recipe passes every hard constraint. Soft ones are ignored here.
pub fn satisfies_hard_constraints(recipe: &Recipe, constraints: &[Constraint]) -> bool {
    constraints
        .iter()
        .filter(|c| c.is_hard)
        .all(|c| c.is_satisfied_by(recipe))
}

/// Number of soft constraints the recipe breaks.
pub fn soft_violations(recipe: &Recipe, constraints: &[Constraint]) -> usize {
    constraints
        .iter()
        .filter(|c| !c.is_hard && !c.is_satisfied_by(recipe))
        .count()
}

fn parse_rule(constraint_type: ConstraintType, value: &Value) -> Option<ConstraintRule> {
    match constraint_type {
        ConstraintType::MaxPrepTime => {
            parse_minutes(value).map(ConstraintRule::MaxPrepTime)
        }
        ConstraintType::MaxTotalTime => {
            parse_minutes(value).map(ConstraintRule::MaxTotalTime)
        }
        ConstraintType::IngredientBlacklist => {
            parse_terms(value, &["ingredients", "items", "values"]).map(ConstraintRule::IngredientBlacklist)
        }
        ConstraintType::CuisineBlacklist => {
            parse_terms(value, &["cuisines", "items", "values"]).map(ConstraintRule::CuisineBlacklist)
        }
        ConstraintType::MaxDifficulty => parse_difficulty(value).map(ConstraintRule::MaxDifficulty),
    }
}

fn parse_minutes(value: &Value) -> Option<u32> {
    let raw = match value {
        Value::Object(map) => map.get("max_minutes").or_else(|| map.get("minutes"))?,
        other => other,
    };
    match raw {
        Value::Number(n) => n.as_u64().and_then(|m| u32::try_from(m).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_terms(value: &Value, keys: &[&str]) -> Option<Vec<String>> {
    let raw = match value {
        Value::Object(map) => keys.iter().find_map(|k| map.get(*k))?,
        other => other,
    };
    let terms: Vec<String> = match raw {
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(normalize_key)
            .filter(|t| !t.is_empty())
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(normalize_key)
            .filter(|t| !t.is_empty())
            .collect(),
        _ => return None,
    };
    Some(terms)
}

fn parse_difficulty(value: &Value) -> Option<Difficulty> {
    let raw = match value {
        Value::Object(map) => map.get("level").or_else(|| map.get("max_difficulty"))?,
        other => other,
    };
    match raw {
        Value::String(s) => match normalize_key(s).as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        },
        Value::Number(n) => match n.as_u64()? {
            1 => Some(Difficulty::Easy),
            2 => Some(Difficulty::Medium),
            3 => Some(Difficulty::Hard),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn recipe() -> Recipe {
        serde_json::from_value(json!({
            "id": "r1",
            "title": "Peanut noodles",
            "cuisine": "Thai",
            "difficulty": "medium",
            "prep_time": 15,
            "cook_time": 20,
            "total_time": 35,
            "ingredients": ["200g rice noodles", "2 tbsp Peanut Butter", "1 lime"]
        }))
        .unwrap()
    }

    fn row(ty: ConstraintType, value: Value) -> ConstraintRow {
        ConstraintRow { constraint_type: ty, constraint_value: value, is_hard_constraint: true, priority: 0 }
    }

    #[test]
    fn test_time_limits() {
        let r = recipe();
        assert!(Constraint::hard(ConstraintRule::MaxPrepTime(15)).is_satisfied_by(&r));
        assert!(!Constraint::hard(ConstraintRule::MaxPrepTime(14)).is_satisfied_by(&r));
        assert!(Constraint::hard(ConstraintRule::MaxTotalTime(35)).is_satisfied_by(&r));
        assert!(!Constraint::hard(ConstraintRule::MaxTotalTime(30)).is_satisfied_by(&r));
    }

    #[test]
    fn test_ingredient_blacklist_is_case_insensitive_substring() {
        let c = Constraint::from_row(&row(ConstraintType::IngredientBlacklist, json!({"ingredients": ["PEANUT"]}))).unwrap();
        assert!(!c.is_satisfied_by(&recipe()));
        let c = Constraint::from_row(&row(ConstraintType::IngredientBlacklist, json!(["shrimp"]))).unwrap();
        assert!(c.is_satisfied_by(&recipe()));
    }

    #[test]
    fn test_cuisine_blacklist() {
        let c = Constraint::from_row(&row(ConstraintType::CuisineBlacklist, json!({"cuisines": ["thai"]}))).unwrap();
        assert!(!c.is_satisfied_by(&recipe()));
        let mut no_cuisine = recipe();
        no_cuisine.cuisine = None;
        assert!(c.is_satisfied_by(&no_cuisine));
    }

    #[test]
    fn test_max_difficulty_ordinal() {
        let easy = Constraint::from_row(&row(ConstraintType::MaxDifficulty, json!("easy"))).unwrap();
        let medium = Constraint::from_row(&row(ConstraintType::MaxDifficulty, json!({"level": 2}))).unwrap();
        assert!(!easy.is_satisfied_by(&recipe()));
        assert!(medium.is_satisfied_by(&recipe()));
    }

    #[test]
    fn test_soft_constraints_not_filtered() {
        let constraints = vec![
            Constraint::soft(ConstraintRule::MaxTotalTime(10)),
            Constraint::hard(ConstraintRule::MaxPrepTime(60)),
        ];
        assert!(satisfies_hard_constraints(&recipe(), &constraints));
        assert_eq!(soft_violations(&recipe(), &constraints), 1);
    }

    #[test]
    fn test_minutes_payload_shapes() {
        assert_eq!(parse_minutes(&json!(30)), Some(30));
        assert_eq!(parse_minutes(&json!({"max_minutes": 45})), Some(45));
        assert_eq!(parse_minutes(&json!("20")), Some(20));
        assert_eq!(parse_minutes(&json!(-5)), None);
    }

    #[test]
    fn test_unreadable_rows_dropped() {
        let rows = vec![
            row(ConstraintType::MaxDifficulty, json!("impossible")),
            row(ConstraintType::MaxTotalTime, json!({"max_minutes": 30})),
        ];
        let parsed = constraints_from_rows(&rows);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].rule, ConstraintRule::MaxTotalTime(30));
    }
}
