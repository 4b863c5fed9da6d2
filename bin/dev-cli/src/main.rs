mod error;
mod fixtures;
mod logger;

use std::env;
use std::process;

use hive_plan_executor::{QueryPlan, QueryPlanExecutor, RequestContext, ServiceRegistry};
use hive_plan_executor_config::{load_config, ExecutorConfig};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    error::DevCliError,
    fixtures::{into_endpoints, ServiceFixtures},
    logger::configure_logging,
};

const USAGE: &str = "Usage: plan-executor-dev-cli <command> [...]

Commands:
  print <plan.json>                                  Pretty-print a query plan
  validate <plan.json>                               Check the structure of a query plan
  execute <plan.json> <services.json> [variables.json]  Run a query plan against fixture services";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("{}", error);
        process::exit(1);
    }
}

async fn run() -> Result<(), DevCliError> {
    let config = load_config(env::var("PLAN_EXECUTOR_CONFIG_FILE_PATH").ok())?;
    configure_logging(&config.log);

    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("print") => {
            let plan = load_plan(required_arg(&args, 2)?)?;
            println!("{}", plan);
        }
        Some("validate") => {
            let plan = load_plan(required_arg(&args, 2)?)?;
            plan.validate()?;
            println!("Query plan is valid");
        }
        Some("execute") => {
            let plan = load_plan(required_arg(&args, 2)?)?;
            let fixtures_path = required_arg(&args, 3)?;
            let variables = match args.get(4) {
                Some(path) => load_variables(path)?,
                None => Map::new(),
            };
            let response = execute(&config, &plan, load_fixtures(fixtures_path)?, &variables).await;
            let response =
                serde_json::to_string_pretty(&response).map_err(DevCliError::Serialization)?;
            println!("{}", response);
        }
        _ => return Err(DevCliError::Usage(USAGE.to_string())),
    }

    Ok(())
}

async fn execute(
    config: &ExecutorConfig,
    plan: &QueryPlan,
    fixtures: ServiceFixtures,
    variables: &Map<String, Value>,
) -> Value {
    let registry = ServiceRegistry::from_config(&config.services, into_endpoints(fixtures));
    if let Err(validation_error) = plan.validate_services(&registry) {
        warn!("{}", validation_error);
    }

    let output = QueryPlanExecutor::new(&registry, &config.execution)
        .run(
            plan,
            variables,
            &RequestContext::default(),
            CancellationToken::new(),
        )
        .await;
    debug!("Plan executed with {} errors", output.errors.len());

    output.to_value()
}

fn required_arg(args: &[String], index: usize) -> Result<&str, DevCliError> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| DevCliError::Usage(USAGE.to_string()))
}

fn read_file(path: &str) -> Result<String, DevCliError> {
    std::fs::read_to_string(path).map_err(|source| DevCliError::ReadFile {
        path: path.to_string(),
        source,
    })
}

fn load_plan(path: &str) -> Result<QueryPlan, DevCliError> {
    Ok(QueryPlan::from_json(&read_file(path)?)?)
}

fn load_fixtures(path: &str) -> Result<ServiceFixtures, DevCliError> {
    serde_json::from_str(&read_file(path)?).map_err(|source| DevCliError::InvalidFixtures {
        path: path.to_string(),
        source,
    })
}

fn load_variables(path: &str) -> Result<Map<String, Value>, DevCliError> {
    serde_json::from_str(&read_file(path)?).map_err(|source| DevCliError::InvalidVariables {
        path: path.to_string(),
        source,
    })
}
