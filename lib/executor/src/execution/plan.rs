use std::time::Duration;

use hive_plan_executor_config::execution::ExecutionConfig;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::{
    execution::{
        cancellation::ExecutionCancellation, context::ExecutionContext, node::NodeExecutor,
    },
    plan::QueryPlan,
    response::output::ExecutionOutput,
    services::{registry::ServiceRegistry, RequestContext},
};

/// Executes query plans against the services of a registry.
pub struct QueryPlanExecutor<'a> {
    registry: &'a ServiceRegistry,
    timeout: Option<Duration>,
}

impl<'a> QueryPlanExecutor<'a> {
    pub fn new(registry: &'a ServiceRegistry, config: &ExecutionConfig) -> Self {
        Self {
            registry,
            timeout: config.timeout,
        }
    }

    /// Runs the plan and returns everything that was fetched, with the errors of
    /// every region that could not be completed.
    ///
    /// Cancelling `cancellation` (or reaching the configured timeout) abandons the
    /// in-flight service calls. Data written before that point is kept.
    #[instrument(level = "debug", skip_all, name = "QueryPlan::execute")]
    pub async fn run(
        &self,
        plan: &QueryPlan,
        variables: &Map<String, Value>,
        request_context: &RequestContext,
        cancellation: CancellationToken,
    ) -> ExecutionOutput {
        let cancellation = ExecutionCancellation::new(cancellation.child_token());
        let ctx = ExecutionContext::new(
            self.registry,
            variables,
            request_context,
            cancellation.clone(),
        );

        match &plan.node {
            Some(node) => {
                let execution = NodeExecutor::new(&ctx).execute(node);
                match self.timeout {
                    Some(timeout) => {
                        let deadline = async {
                            tokio::time::sleep(timeout).await;
                            warn!("Execution timed out after {:?}", timeout);
                            cancellation.cancel_for_deadline();
                            // The execution still has to record its incomplete regions.
                            std::future::pending::<()>().await
                        };
                        tokio::select! {
                            _ = execution => {}
                            _ = deadline => {}
                        }
                    }
                    None => execution.await,
                }
            }
            None => debug!("Query plan is empty, nothing to execute"),
        }

        // Nothing outlives the execution.
        cancellation.cancel();

        let output = ctx.into_output();
        debug!("Execution finished with {} errors", output.errors.len());
        output
    }
}

/// Runs a plan without an execution timeout or an external cancellation signal.
pub async fn execute_query_plan(
    plan: &QueryPlan,
    registry: &ServiceRegistry,
    variables: &Map<String, Value>,
    request_context: &RequestContext,
) -> ExecutionOutput {
    QueryPlanExecutor::new(registry, &ExecutionConfig::default())
        .run(plan, variables, request_context, CancellationToken::new())
        .await
}
