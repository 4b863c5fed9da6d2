use std::collections::{HashMap, HashSet};

use graphql_parser::query::{
    parse_query, Definition, FragmentDefinition, OperationDefinition, Selection, SelectionSet,
};
use tracing::warn;

use crate::plan::FetchNode;

impl FetchNode {
    /// The top-level response keys written by this fetch, in selection order.
    ///
    /// A root fetch owns these keys of the response tree; they are set to `null`
    /// when the fetch fails without producing data.
    pub fn root_response_keys(&self) -> Vec<String> {
        let document = match parse_query::<&str>(&self.operation) {
            Ok(document) => document,
            Err(err) => {
                warn!(
                    service_name = %self.service_name,
                    "Failed to parse the operation of a fetch node: {}", err
                );
                return vec![];
            }
        };

        let mut fragments = HashMap::new();
        let mut operations = Vec::new();
        for definition in &document.definitions {
            match definition {
                Definition::Fragment(fragment) => {
                    fragments.insert(fragment.name, fragment);
                }
                Definition::Operation(operation) => operations.push(operation),
            }
        }

        let operation = operations
            .iter()
            .find(|operation| {
                self.operation_name.is_some()
                    && operation_name(operation) == self.operation_name.as_deref()
            })
            .or_else(|| operations.first());

        let mut keys = Vec::new();
        if let Some(operation) = operation {
            let mut visited_fragments = HashSet::new();
            collect_response_keys(
                selection_set(operation),
                &fragments,
                &mut visited_fragments,
                &mut keys,
            );
        }
        keys
    }
}

fn operation_name<'a>(operation: &OperationDefinition<'a, &'a str>) -> Option<&'a str> {
    match operation {
        OperationDefinition::SelectionSet(_) => None,
        OperationDefinition::Query(query) => query.name,
        OperationDefinition::Mutation(mutation) => mutation.name,
        OperationDefinition::Subscription(subscription) => subscription.name,
    }
}

fn selection_set<'a, 'b>(
    operation: &'b OperationDefinition<'a, &'a str>,
) -> &'b SelectionSet<'a, &'a str> {
    match operation {
        OperationDefinition::SelectionSet(selection_set) => selection_set,
        OperationDefinition::Query(query) => &query.selection_set,
        OperationDefinition::Mutation(mutation) => &mutation.selection_set,
        OperationDefinition::Subscription(subscription) => &subscription.selection_set,
    }
}

/// Each fragment is expanded at most once, so cyclic spreads terminate.
fn collect_response_keys<'a>(
    selection_set: &SelectionSet<'a, &'a str>,
    fragments: &HashMap<&'a str, &FragmentDefinition<'a, &'a str>>,
    visited_fragments: &mut HashSet<&'a str>,
    keys: &mut Vec<String>,
) {
    for selection in &selection_set.items {
        match selection {
            Selection::Field(field) => {
                let key = field.alias.unwrap_or(field.name);
                if key != "__typename" && !keys.iter().any(|existing| existing == key) {
                    keys.push(key.to_string());
                }
            }
            Selection::InlineFragment(fragment) => collect_response_keys(
                &fragment.selection_set,
                fragments,
                visited_fragments,
                keys,
            ),
            Selection::FragmentSpread(spread) => {
                if !visited_fragments.insert(spread.fragment_name) {
                    continue;
                }
                if let Some(fragment) = fragments.get(spread.fragment_name) {
                    collect_response_keys(
                        &fragment.selection_set,
                        fragments,
                        visited_fragments,
                        keys,
                    )
                }
            }
        }
    }
}
