use anyhow::{Context, Result};
use meal_planner::api_connection::RestStore;
use meal_planner::cli::{parse_args, Command};
use meal_planner::config::{PlannerConfig, DATA_URL_VAR};
use meal_planner::errors::PlannerError;
use meal_planner::logging;
use meal_planner::planner::{MealPlanRequest, MealPlanner};
use meal_planner::store::{load_fixture_store, save_plan_archive, MemoryStore, PlannerStore};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tokio::fs;
use tracing::{error, info};

/// Opens the store for a run. In fixture mode the concrete memory store is
/// handed back too, so generated plans can be archived after the run.
async fn open_store(
    config: &PlannerConfig,
    fixtures: Option<&Path>,
) -> Result<(Arc<dyn PlannerStore>, Option<Arc<MemoryStore>>)> {
    if let Some(path) = fixtures {
        info!(path = %path.display(), "using fixture catalog");
        let memory = Arc::new(load_fixture_store(path).await?);
        let store: Arc<dyn PlannerStore> = memory.clone();
        return Ok((store, Some(memory)));
    }
    let data_url = config
        .data_url
        .as_deref()
        .with_context(|| format!("{} is not set and no --fixtures catalog was given", DATA_URL_VAR))?;
    info!(%data_url, "using hosted store");
    let store: Arc<dyn PlannerStore> = Arc::new(RestStore::new(data_url, &config.api_key_env_var));
    Ok((store, None))
}

async fn read_request(
    request_file: Option<PathBuf>,
    user_id: Option<String>,
    week_start: Option<String>,
) -> Result<MealPlanRequest> {
    let mut request = match request_file {
        Some(path) => {
            let content = fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read request file '{}'", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse request file '{}'", path.display()))?
        }
        None => MealPlanRequest::default(),
    };
    if let Some(user_id) = user_id {
        request.user_id = user_id;
    }
    if let Some(week_start) = week_start {
        request.week_start = week_start;
    }
    Ok(request)
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", out);
    Ok(())
}

fn exit_code(err: &PlannerError) -> i32 {
    match err.status_code() {
        400 => 2,
        404 => 5,
        502 => 3,
        _ => 4,
    }
}

/// Prints the failure body and exits; the run has already been aborted.
fn fail(err: PlannerError, pretty: bool) -> ! {
    error!(error = %err, details = %err.to_response().details, "meal plan run failed");
    if let Err(print_err) = print_json(&err.to_response(), pretty) {
        eprintln!("Failed to print error response: {}", print_err);
    }
    process::exit(exit_code(&err));
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = parse_args();
    let config = PlannerConfig::from_env().context("Failed to load configuration")?;
    logging::init(&config.log_level, config.log_json)?;

    match cli.command {
        Command::Generate { user_id, week_start, request, fixtures, pretty } => {
            let request = read_request(request, user_id, week_start).await?;
            let (store, memory) = open_store(&config, fixtures.as_deref()).await?;
            let planner = MealPlanner::new(store, config.planner_options());
            match planner.generate(&request).await {
                Ok(response) => {
                    if let (Some(memory), Some(catalog)) = (memory, fixtures.as_deref()) {
                        save_plan_archive(&memory, catalog).await?;
                    }
                    print_json(&response, pretty)?
                }
                Err(err) => fail(err, pretty),
            }
        }
        Command::Show { plan_id, fixtures, pretty } => {
            let (store, _) = open_store(&config, fixtures.as_deref()).await?;
            let planner = MealPlanner::new(store, config.planner_options());
            match planner.load_plan(&plan_id).await {
                Ok(record) => print_json(&record, pretty)?,
                Err(err) => fail(err, pretty),
            }
        }
    }

    Ok(())
}
