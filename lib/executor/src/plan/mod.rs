pub mod display;
pub mod operation;
pub mod path;
pub mod validation;

use serde::{Deserialize, Serialize};

pub use path::{FlattenNodePath, FlattenNodePathSegment};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryPlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<PlanNode>,
}

#[derive(Debug, thiserror::Error)]
pub enum PlanLoadError {
    #[error("Failed to parse the query plan: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl QueryPlan {
    pub fn new(node: PlanNode) -> Self {
        QueryPlan { node: Some(node) }
    }

    pub fn from_json(plan_json: &str) -> Result<Self, PlanLoadError> {
        Ok(serde_json::from_str(plan_json)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum PlanNode {
    Sequence(SequenceNode),
    Parallel(ParallelNode),
    Fetch(FetchNode),
    Flatten(FlattenNode),
}

impl PlanNode {
    pub fn kind(&self) -> &'static str {
        match self {
            PlanNode::Sequence(_) => "Sequence",
            PlanNode::Parallel(_) => "Parallel",
            PlanNode::Fetch(_) => "Fetch",
            PlanNode::Flatten(_) => "Flatten",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceNode {
    pub nodes: Vec<PlanNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParallelNode {
    pub nodes: Vec<PlanNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchNode {
    pub service_name: String,
    /// The operation document sent to the service.
    pub operation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    /// The selection used to build entity representations.
    /// Present only for fetches that extend entities found in the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires: Option<Vec<RequiresSelection>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variable_usages: Vec<VariableUsage>,
}

impl FetchNode {
    pub fn is_entity_fetch(&self) -> bool {
        self.requires.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlattenNode {
    pub path: FlattenNodePath,
    pub node: Box<PlanNode>,
}

/// Describes where the value of a variable sent to a service comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableUsage {
    /// Forwards the request variable with the same name.
    Variable(String),
    /// Reads the value from the response tree, as written by a previous step.
    /// Paths going through lists produce a list of the values found.
    Response {
        name: String,
        path: FlattenNodePath,
    },
}

impl VariableUsage {
    pub fn name(&self) -> &str {
        match self {
            VariableUsage::Variable(name) => name,
            VariableUsage::Response { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum RequiresSelection {
    Field(FieldSelection),
    InlineFragment(InlineFragmentSelection),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSelection {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selections: Option<Vec<RequiresSelection>>,
}

impl FieldSelection {
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineFragmentSelection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_condition: Option<String>,
    pub selections: Vec<RequiresSelection>,
}
