use hive_plan_executor::plan::{validation::PlanValidationError, PlanLoadError};
use hive_plan_executor_config::ExecutorConfigError;

#[derive(Debug, thiserror::Error)]
pub enum DevCliError {
    #[error("{0}")]
    Usage(String),
    #[error("Unable to read \"{path}\": {source}")]
    ReadFile {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    PlanLoad(#[from] PlanLoadError),
    #[error("{0}")]
    InvalidPlan(#[from] PlanValidationError),
    #[error("Invalid service fixtures in \"{path}\": {source}")]
    InvalidFixtures {
        path: String,
        source: serde_json::Error,
    },
    #[error("Invalid variables in \"{path}\": {source}")]
    InvalidVariables {
        path: String,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Config(#[from] ExecutorConfigError),
    #[error("Failed to serialize the response: {0}")]
    Serialization(serde_json::Error),
}
