use std::fmt::{Display, Formatter as FmtFormatter, Result as FmtResult};

use crate::plan::{FetchNode, FlattenNode, PlanNode, QueryPlan, RequiresSelection};

pub fn get_indent(depth: usize) -> String {
    "  ".repeat(depth)
}

pub trait PrettyDisplay {
    fn pretty_fmt(&self, f: &mut FmtFormatter<'_>, depth: usize) -> FmtResult;
}

impl Display for QueryPlan {
    fn fmt(&self, f: &mut FmtFormatter<'_>) -> FmtResult {
        self.pretty_fmt(f, 0)
    }
}

impl Display for PlanNode {
    fn fmt(&self, f: &mut FmtFormatter<'_>) -> FmtResult {
        self.pretty_fmt(f, 0)
    }
}

impl PrettyDisplay for QueryPlan {
    fn pretty_fmt(&self, f: &mut FmtFormatter<'_>, depth: usize) -> FmtResult {
        let indent = get_indent(depth);
        writeln!(f, "{indent}QueryPlan {{")?;
        if let Some(node) = &self.node {
            node.pretty_fmt(f, depth + 1)?;
        }
        writeln!(f, "{indent}}},")
    }
}

impl PrettyDisplay for PlanNode {
    fn pretty_fmt(&self, f: &mut FmtFormatter<'_>, depth: usize) -> FmtResult {
        match self {
            PlanNode::Fetch(node) => node.pretty_fmt(f, depth),
            PlanNode::Flatten(node) => node.pretty_fmt(f, depth),
            PlanNode::Sequence(node) => write_group(f, depth, "Sequence", &node.nodes),
            PlanNode::Parallel(node) => write_group(f, depth, "Parallel", &node.nodes),
        }
    }
}

fn write_group(
    f: &mut FmtFormatter<'_>,
    depth: usize,
    variant: &str,
    nodes: &[PlanNode],
) -> FmtResult {
    let indent = get_indent(depth);
    writeln!(f, "{indent}{variant} {{")?;
    for node in nodes {
        node.pretty_fmt(f, depth + 1)?;
    }
    writeln!(f, "{indent}}},")
}

impl PrettyDisplay for FetchNode {
    fn pretty_fmt(&self, f: &mut FmtFormatter<'_>, depth: usize) -> FmtResult {
        let indent = get_indent(depth);
        writeln!(f, "{indent}Fetch(service: \"{}\") {{", self.service_name)?;
        if let Some(requires) = &self.requires {
            writeln!(f, "{indent}  {{")?;
            for selection in requires {
                selection.pretty_fmt(f, depth + 2)?;
            }
            writeln!(f, "{indent}  }} =>")?;
        }
        writeln!(f, "{indent}  {{")?;
        for line in self.operation.lines() {
            let line = line.trim();
            if !line.is_empty() {
                writeln!(f, "{indent}    {line}")?;
            }
        }
        writeln!(f, "{indent}  }}")?;
        writeln!(f, "{indent}}},")
    }
}

impl PrettyDisplay for FlattenNode {
    fn pretty_fmt(&self, f: &mut FmtFormatter<'_>, depth: usize) -> FmtResult {
        let indent = get_indent(depth);
        writeln!(f, "{indent}Flatten(path: \"{}\") {{", self.path)?;
        self.node.pretty_fmt(f, depth + 1)?;
        writeln!(f, "{indent}}},")
    }
}

impl PrettyDisplay for RequiresSelection {
    fn pretty_fmt(&self, f: &mut FmtFormatter<'_>, depth: usize) -> FmtResult {
        let indent = get_indent(depth);
        let (header, selections) = match self {
            RequiresSelection::Field(field) => {
                let header = match &field.alias {
                    Some(alias) => format!("{alias}: {}", field.name),
                    None => field.name.clone(),
                };
                (header, field.selections.as_deref())
            }
            RequiresSelection::InlineFragment(fragment) => {
                let header = match &fragment.type_condition {
                    Some(type_condition) => format!("... on {type_condition}"),
                    None => "...".to_string(),
                };
                (header, Some(fragment.selections.as_slice()))
            }
        };

        match selections {
            Some(selections) if !selections.is_empty() => {
                writeln!(f, "{indent}{header} {{")?;
                for selection in selections {
                    selection.pretty_fmt(f, depth + 1)?;
                }
                writeln!(f, "{indent}}}")
            }
            _ => writeln!(f, "{indent}{header}"),
        }
    }
}
