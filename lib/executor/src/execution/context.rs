use std::sync::{Mutex, PoisonError};

use serde_json::{Map, Value};

use crate::{
    execution::cancellation::ExecutionCancellation,
    response::{graphql_error::ExecutionError, output::ExecutionOutput, tree::ResponseTree},
    services::{registry::ServiceRegistry, RequestContext},
};

/// State shared by every node of one execution.
pub struct ExecutionContext<'exec> {
    pub registry: &'exec ServiceRegistry,
    pub variables: &'exec Map<String, Value>,
    pub request_context: &'exec RequestContext,
    pub cancellation: ExecutionCancellation,
    pub response: ResponseTree,
    errors: Mutex<Vec<ExecutionError>>,
}

impl<'exec> ExecutionContext<'exec> {
    pub fn new(
        registry: &'exec ServiceRegistry,
        variables: &'exec Map<String, Value>,
        request_context: &'exec RequestContext,
        cancellation: ExecutionCancellation,
    ) -> Self {
        ExecutionContext {
            registry,
            variables,
            request_context,
            cancellation,
            response: ResponseTree::new(),
            errors: Mutex::new(Vec::new()),
        }
    }

    pub fn push_error(&self, error: ExecutionError) {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(error);
    }

    pub fn extend_errors(&self, errors: Vec<ExecutionError>) {
        if errors.is_empty() {
            return;
        }
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(errors);
    }

    pub fn into_output(self) -> ExecutionOutput {
        let errors = self
            .errors
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        ExecutionOutput::new(self.response.into_value(), errors)
    }
}
