use std::fmt::{Display, Formatter as FmtFormatter, Result as FmtResult};

use crate::{
    plan::{FetchNode, FlattenNode, PlanNode, QueryPlan},
    services::registry::ServiceRegistry,
};

/// A structural problem found in a query plan, located by the position of the
/// node in the plan tree (for example `Sequence[1].Flatten(topProducts.@)`).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanIssue {
    #[error("{0}: Flatten node must wrap a Fetch node")]
    FlattenWithoutFetch(String),
    #[error("{0}: Fetch node under a Flatten node must declare the fields it requires")]
    EntityFetchWithoutRequires(String),
    #[error("{0}: Fetch node has an empty service name")]
    EmptyServiceName(String),
    #[error("{0}: {1} node has no children")]
    EmptyGroup(String, &'static str),
    #[error("{0}: service \"{1}\" is not registered")]
    UnknownService(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanValidationError {
    pub issues: Vec<PlanIssue>,
}

impl Display for PlanValidationError {
    fn fmt(&self, f: &mut FmtFormatter<'_>) -> FmtResult {
        writeln!(f, "Query plan is invalid ({} issues):", self.issues.len())?;
        for issue in &self.issues {
            writeln!(f, "  - {}", issue)?;
        }
        Ok(())
    }
}

impl std::error::Error for PlanValidationError {}

impl QueryPlan {
    /// Checks the shape of the plan. The executor tolerates invalid plans at runtime
    /// (the affected regions are reported as errors), this is meant to catch them earlier.
    pub fn validate(&self) -> Result<(), PlanValidationError> {
        self.validate_with(None)
    }

    /// Same as [`QueryPlan::validate`], but also checks that every service used by the plan
    /// is registered.
    pub fn validate_services(&self, registry: &ServiceRegistry) -> Result<(), PlanValidationError> {
        self.validate_with(Some(registry))
    }

    fn validate_with(&self, registry: Option<&ServiceRegistry>) -> Result<(), PlanValidationError> {
        let mut issues = Vec::new();
        if let Some(node) = &self.node {
            validate_node(node, "root".to_string(), registry, &mut issues);
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(PlanValidationError { issues })
        }
    }
}

fn validate_node(
    node: &PlanNode,
    location: String,
    registry: Option<&ServiceRegistry>,
    issues: &mut Vec<PlanIssue>,
) {
    match node {
        PlanNode::Sequence(sequence) => {
            validate_group(&sequence.nodes, "Sequence", location, registry, issues)
        }
        PlanNode::Parallel(parallel) => {
            validate_group(&parallel.nodes, "Parallel", location, registry, issues)
        }
        PlanNode::Fetch(fetch) => validate_fetch(fetch, &location, registry, issues),
        PlanNode::Flatten(flatten) => validate_flatten(flatten, location, registry, issues),
    }
}

fn validate_group(
    nodes: &[PlanNode],
    kind: &'static str,
    location: String,
    registry: Option<&ServiceRegistry>,
    issues: &mut Vec<PlanIssue>,
) {
    if nodes.is_empty() {
        issues.push(PlanIssue::EmptyGroup(location.clone(), kind));
    }
    for (index, child) in nodes.iter().enumerate() {
        validate_node(child, format!("{location}.{kind}[{index}]"), registry, issues);
    }
}

fn validate_flatten(
    flatten: &FlattenNode,
    location: String,
    registry: Option<&ServiceRegistry>,
    issues: &mut Vec<PlanIssue>,
) {
    let location = format!("{location}.Flatten({})", flatten.path);
    match flatten.node.as_ref() {
        PlanNode::Fetch(fetch) => {
            if !fetch.is_entity_fetch() {
                issues.push(PlanIssue::EntityFetchWithoutRequires(location.clone()));
            }
            validate_fetch(fetch, &location, registry, issues);
        }
        other => {
            issues.push(PlanIssue::FlattenWithoutFetch(location.clone()));
            validate_node(other, location, registry, issues);
        }
    }
}

fn validate_fetch(
    fetch: &FetchNode,
    location: &str,
    registry: Option<&ServiceRegistry>,
    issues: &mut Vec<PlanIssue>,
) {
    if fetch.service_name.is_empty() {
        issues.push(PlanIssue::EmptyServiceName(location.to_string()));
        return;
    }
    if let Some(registry) = registry {
        if !registry.contains(&fetch.service_name) {
            issues.push(PlanIssue::UnknownService(
                location.to_string(),
                fetch.service_name.clone(),
            ));
        }
    }
}
