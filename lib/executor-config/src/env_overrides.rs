use config::{builder::BuilderState, ConfigBuilder, ConfigError};
use envconfig::Envconfig;
use tracing::debug;

use crate::log::{LogFormat, LogLevel};

#[derive(Envconfig)]
pub struct EnvVarOverrides {
    // Logger overrides
    #[envconfig(from = "LOG_LEVEL")]
    pub log_level: Option<LogLevel>,
    #[envconfig(from = "LOG_EXECUTOR_LEVEL")]
    pub log_executor_level: Option<LogLevel>,
    #[envconfig(from = "LOG_FORMAT")]
    pub log_format: Option<LogFormat>,
    #[envconfig(from = "LOG_FILTER")]
    pub log_filter: Option<String>,

    // Execution overrides
    #[envconfig(from = "EXECUTION_TIMEOUT")]
    pub execution_timeout: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum EnvVarOverridesError {
    #[error("Failed to override configuration: {0}")]
    FailedToOverrideConfig(#[from] ConfigError),
    #[error("Invalid duration \"{value}\" in {variable}: {source}")]
    InvalidDuration {
        variable: &'static str,
        value: String,
        source: humantime::DurationError,
    },
}

impl EnvVarOverrides {
    pub fn apply_overrides<T: BuilderState>(
        mut self,
        mut config: ConfigBuilder<T>,
    ) -> Result<ConfigBuilder<T>, EnvVarOverridesError> {
        if let Some(log_level) = self.log_level.take() {
            debug!("[config-override] 'log.level' = {:?}", log_level);
            config = config.set_override("log.level", log_level.to_string())?;
        }
        if let Some(executor_level) = self.log_executor_level.take() {
            debug!("[config-override] 'log.executor_level' = {:?}", executor_level);
            config = config.set_override("log.executor_level", executor_level.to_string())?;
        }
        if let Some(log_format) = self.log_format.take() {
            debug!("[config-override] 'log.format' = {:?}", log_format);
            config = config.set_override("log.format", log_format.to_string())?;
        }
        if let Some(log_filter) = self.log_filter.take() {
            debug!("[config-override] 'log.filter' = {:?}", log_filter);
            config = config.set_override("log.filter", log_filter)?;
        }

        if let Some(execution_timeout) = self.execution_timeout.take() {
            humantime::parse_duration(&execution_timeout).map_err(|source| {
                EnvVarOverridesError::InvalidDuration {
                    variable: "EXECUTION_TIMEOUT",
                    value: execution_timeout.clone(),
                    source,
                }
            })?;
            debug!(
                "[config-override] 'execution.timeout' = {}",
                execution_timeout
            );
            config = config.set_override("execution.timeout", execution_timeout)?;
        }

        Ok(config)
    }
}
