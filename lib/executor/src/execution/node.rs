use futures::future::BoxFuture;
use tracing::{instrument, warn};

use crate::{
    execution::{
        concurrency::ConcurrencyScope,
        context::ExecutionContext,
        fetch::{execute_entity_fetch, execute_root_fetch},
    },
    plan::{FetchNode, FlattenNode, FlattenNodePath, ParallelNode, PlanNode, SequenceNode},
    response::{
        error_normalization::locate_at_flatten_path,
        graphql_error::{codes, ExecutionError},
    },
};

/// Executes plan nodes against the shared execution context.
///
/// Sequence children run one after another, so every step sees the writes of the
/// previous ones. Parallel children run concurrently through a join group.
/// A failing node only affects the region of the response it owns.
#[derive(Clone, Copy)]
pub struct NodeExecutor<'exec> {
    ctx: &'exec ExecutionContext<'exec>,
}

impl<'exec> NodeExecutor<'exec> {
    pub fn new(ctx: &'exec ExecutionContext<'exec>) -> Self {
        Self { ctx }
    }

    pub fn execute(self, node: &'exec PlanNode) -> BoxFuture<'exec, ()> {
        match node {
            PlanNode::Sequence(node) => Box::pin(self.execute_sequence(node)),
            PlanNode::Parallel(node) => Box::pin(self.execute_parallel(node)),
            PlanNode::Fetch(node) => Box::pin(self.execute_fetch(node)),
            PlanNode::Flatten(node) => Box::pin(self.execute_flatten(node)),
        }
    }

    #[instrument(level = "trace", skip_all, name = "SequenceNode::execute", fields(
        nodes = node.nodes.len(),
    ))]
    async fn execute_sequence(self, node: &'exec SequenceNode) {
        for child in &node.nodes {
            self.execute(child).await;
        }
    }

    #[instrument(level = "trace", skip_all, name = "ParallelNode::execute", fields(
        nodes = node.nodes.len(),
    ))]
    async fn execute_parallel(self, node: &'exec ParallelNode) {
        let mut scope = ConcurrencyScope::new();

        for child in &node.nodes {
            scope.spawn(self.execute(child));
        }

        scope.join_all().await;
    }

    async fn execute_fetch(self, node: &'exec FetchNode) {
        match node.requires.as_deref() {
            // Entities at the root of the response.
            Some(requires) => {
                execute_entity_fetch(self.ctx, &FlattenNodePath::default(), node, requires).await
            }
            None => execute_root_fetch(self.ctx, node).await,
        }
    }

    async fn execute_flatten(self, node: &'exec FlattenNode) {
        let fetch_node = match node.node.as_ref() {
            PlanNode::Fetch(fetch_node) => fetch_node,
            other => {
                self.report_invalid_flatten(
                    node,
                    format!("wraps a {} node instead of a Fetch node", other.kind()),
                );
                return;
            }
        };

        match fetch_node.requires.as_deref() {
            Some(requires) => {
                execute_entity_fetch(self.ctx, &node.path, fetch_node, requires).await;
            }
            None => self.report_invalid_flatten(
                node,
                format!(
                    "wraps a Fetch node to service \"{}\" that does not declare the fields it requires",
                    fetch_node.service_name
                ),
            ),
        }
    }

    /// The region of a malformed Flatten node is left untouched.
    fn report_invalid_flatten(self, node: &FlattenNode, reason: String) {
        warn!("Flatten node at \"{}\" {}, skipping it", node.path, reason);
        let error = ExecutionError::from(format!(
            "Invalid query plan: Flatten node at \"{}\" {}",
            node.path, reason
        ));
        let error =
            locate_at_flatten_path(error, &node.path).with_code(codes::INVALID_QUERY_PLAN);
        self.ctx.push_error(error);
    }
}
