use super::MemoryStore;
use crate::models::{Recipe, UserProfile};
use crate::optim::constraints::ConstraintRow;
use crate::optim::targets::NutritionTargets;
use crate::persister::{MealPlanItemRow, MealPlanRecord};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize)]
struct UserTargets {
    user_id: String,
    #[serde(flatten)]
    targets: NutritionTargets,
}

#[derive(Debug, Deserialize)]
struct UserConstraint {
    user_id: String,
    #[serde(flatten)]
    row: ConstraintRow,
}

/// Offline catalog: the same tables the hosted store exposes, as one JSON document.
#[derive(Debug, Default, Deserialize)]
struct FixtureCatalog {
    #[serde(default)]
    recipes: Vec<Recipe>,
    #[serde(default)]
    user_profiles: Vec<UserProfile>,
    #[serde(default)]
    nutrition_targets: Vec<UserTargets>,
    #[serde(default)]
    planning_constraints: Vec<UserConstraint>,
}

/// Plans generated against a fixture catalog, kept next to it so that a
/// later `show` run can read them back.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PlanArchive {
    #[serde(default)]
    pub meal_plans: Vec<MealPlanRecord>,
    #[serde(default)]
    pub meal_plan_items: Vec<MealPlanItemRow>,
}

/// `catalog.json` keeps its plans in `catalog.plans.json`.
pub fn plan_archive_path(catalog: &Path) -> PathBuf {
    let stem = catalog
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "catalog".to_string());
    catalog.with_file_name(format!("{}.plans.json", stem))
}

/// Builds a [`MemoryStore`] seeded from a JSON catalog file, plus any plans
/// archived beside it.
pub async fn load_fixture_store(path: &Path) -> Result<MemoryStore> {
    if !path.exists() {
        return Err(anyhow::anyhow!("Fixture file not found at: {:?}", path));
    }
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read fixture file at {:?}", path))?;
    let catalog: FixtureCatalog = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse fixture catalog at {:?}", path))?;

    if catalog.recipes.is_empty() {
        return Err(anyhow::anyhow!("No recipes found in fixture catalog {:?}", path));
    }

    let store = MemoryStore::new();
    for recipe in catalog.recipes {
        store.insert_recipe(recipe).await;
    }
    for profile in catalog.user_profiles {
        store.insert_profile(profile).await;
    }
    for entry in catalog.nutrition_targets {
        store.insert_targets(&entry.user_id, entry.targets).await;
    }
    for entry in catalog.planning_constraints {
        store.insert_constraint(&entry.user_id, entry.row).await;
    }

    let archive_path = plan_archive_path(path);
    if archive_path.exists() {
        let content = tokio::fs::read_to_string(&archive_path)
            .await
            .with_context(|| format!("Failed to read plan archive at {:?}", archive_path))?;
        let archive: PlanArchive = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse plan archive at {:?}", archive_path))?;
        info!(path = %archive_path.display(), plans = archive.meal_plans.len(), "loaded plan archive");
        store.restore_plans(archive.meal_plans, archive.meal_plan_items).await;
    }
    Ok(store)
}

/// Writes every plan held by `store` to the archive beside `catalog`.
pub async fn save_plan_archive(store: &MemoryStore, catalog: &Path) -> Result<PathBuf> {
    let (meal_plans, meal_plan_items) = store.export_plans().await;
    let archive = PlanArchive { meal_plans, meal_plan_items };
    let archive_path = plan_archive_path(catalog);
    let content = serde_json::to_string_pretty(&archive).context("Failed to serialize plan archive")?;
    tokio::fs::write(&archive_path, content)
        .await
        .with_context(|| format!("Failed to write plan archive at {:?}", archive_path))?;
    info!(path = %archive_path.display(), plans = archive.meal_plans.len(), "saved plan archive");
    Ok(archive_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{PlannerStore, RecipeQuery};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_load_fixture_store() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(
            file,
            r#"{{
                "recipes": [{{"id": "r1", "title": "Oatmeal", "total_time": 10}}],
                "user_profiles": [{{"user_id": "u1", "favorite_cuisines": ["Thai"], "allergy_notes": "none"}}],
                "nutrition_targets": [{{"user_id": "u1", "daily_calories": 1800}}],
                "planning_constraints": [{{"user_id": "u1", "constraint_type": "max_total_time", "constraint_value": 45}}]
            }}"#
        )?;
        file.flush()?;

        let store = load_fixture_store(file.path()).await?;
        assert_eq!(store.fetch_recipes(&RecipeQuery::default()).await?.len(), 1);
        let profile = store.fetch_profile("u1").await?.unwrap();
        assert_eq!(profile.favorite_cuisines, vec!["Thai"]);
        assert!(profile.extra.contains_key("allergy_notes"));
        assert_eq!(store.fetch_nutrition_targets("u1").await?.unwrap().daily_calories, 1800.0);
        let constraints = store.fetch_constraints("u1").await?;
        assert_eq!(constraints.len(), 1);
        assert!(constraints[0].is_hard_constraint);
        Ok(())
    }

    #[tokio::test]
    async fn test_fixture_file_not_found() {
        let result = load_fixture_store(Path::new("no_such_catalog.json")).await;
        assert!(result.unwrap_err().to_string().contains("Fixture file not found"));
    }

    #[test]
    fn test_plan_archive_path() {
        assert_eq!(
            plan_archive_path(Path::new("demos/sample_catalog.json")),
            PathBuf::from("demos/sample_catalog.plans.json")
        );
    }

    #[tokio::test]
    async fn test_generated_plan_is_shown_on_next_run() -> Result<()> {
        use crate::planner::{MealPlanRequest, MealPlanner, PlannerOptions};
        use std::sync::Arc;

        let dir = tempfile::tempdir()?;
        let catalog = dir.path().join("catalog.json");
        std::fs::write(
            &catalog,
            r#"{
                "recipes": [
                    {"id": "b1", "title": "Porridge", "meal_type": "breakfast", "total_time": 10,
                     "nutrition": {"calories": 450, "protein": 15, "carbs": 60, "fat": 9}},
                    {"id": "l1", "title": "Lentil Soup", "meal_type": "lunch", "total_time": 30,
                     "nutrition": {"calories": 650, "protein": 30, "carbs": 80, "fat": 12}}
                ]
            }"#,
        )?;

        let first = Arc::new(load_fixture_store(&catalog).await?);
        let planner = MealPlanner::new(first.clone(), PlannerOptions::default());
        let request = MealPlanRequest {
            user_id: "u1".to_string(),
            week_start: "2024-03-04".to_string(),
            preferences: None,
        };
        let response = planner.generate(&request).await?;
        let archive_path = save_plan_archive(&first, &catalog).await?;
        assert!(archive_path.exists());

        let second = Arc::new(load_fixture_store(&catalog).await?);
        let planner = MealPlanner::new(second, PlannerOptions::default());
        let shown = planner.load_plan(&response.meal_plan_id).await?;
        assert_eq!(shown.plan_data, response.meal_plan);
        assert_eq!(shown.optimization_summary, response.optimization_summary);
        Ok(())
    }

    #[tokio::test]
    async fn test_fixture_without_recipes() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        write!(file, "{{}}")?;
        file.flush()?;
        let result = load_fixture_store(file.path()).await;
        assert!(result.unwrap_err().to_string().contains("No recipes found"));
        Ok(())
    }
}
