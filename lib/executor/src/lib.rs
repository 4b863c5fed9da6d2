pub mod execution;
pub mod plan;
pub mod response;
pub mod services;

#[cfg(test)]
mod tests;

pub use execution::plan::{execute_query_plan, QueryPlanExecutor};
pub use plan::{PlanNode, QueryPlan};
pub use response::{graphql_error::ExecutionError, output::ExecutionOutput};
pub use services::{
    local::LocalServiceEndpoint, registry::ServiceRegistry, RequestContext, ServiceEndpoint,
    ServiceResult,
};
