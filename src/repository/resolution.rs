//! Dependency processing for registered extensions.
//!
//! Every extension's declared requirements are checked against what is actually
//! registered. Problems are recorded per extension and never abort the whole
//! repository: an extension is in error when a requirement is missing, crosses
//! source parsers illegally, sits on a dependency cycle, or is itself in error.
//! Unrelated extensions stay available.

use std::collections::{BTreeMap, HashMap};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{debug, warn};

use super::extension::{DataExtensionDependencies, DataExtensionId};
use crate::cookers::DataCookerPath;

/// Requirements of one extension as declared by its descriptor.
#[derive(Debug)]
pub(crate) struct DeclaredRequirements<'a> {
    pub cookers: &'a [DataCookerPath],
    pub processors: &'a [super::extension::DataProcessorId],
}

/// Outcome of processing one extension's dependencies.
#[derive(Debug, Default)]
pub(crate) struct ResolvedDependencies {
    pub errors: Vec<String>,
    pub dependencies: DataExtensionDependencies,
}

/// Process the dependencies of every extension in `declared`.
///
/// Returns one entry per extension. An entry with no errors is available.
pub(crate) fn process_dependencies(
    declared: &BTreeMap<DataExtensionId, DeclaredRequirements<'_>>,
) -> HashMap<DataExtensionId, ResolvedDependencies> {
    let mut graph: DiGraph<DataExtensionId, ()> = DiGraph::new();
    let mut node_map: HashMap<DataExtensionId, NodeIndex> = HashMap::new();
    let mut resolved: HashMap<DataExtensionId, ResolvedDependencies> = HashMap::new();

    for id in declared.keys() {
        node_map.insert(id.clone(), graph.add_node(id.clone()));
        resolved.insert(id.clone(), ResolvedDependencies::default());
    }

    // Edges point from dependent to requirement
    for (id, requirements) in declared {
        let from = node_map[id];
        let mut errors = Vec::new();

        for path in requirements.cookers {
            if let DataExtensionId::SourceDataCooker(own) = id
                && path.source_parser_id() != own.source_parser_id()
            {
                errors.push(format!(
                    "Requires data cooker '{path}' from a different source parser; \
                     source cookers may only require cookers of '{}'",
                    own.source_parser_id()
                ));
                continue;
            }

            let required = DataExtensionId::for_data_cooker(path);
            match node_map.get(&required) {
                Some(&to) => {
                    if !graph.contains_edge(from, to) {
                        graph.add_edge(from, to, ());
                    }
                }
                None => errors.push(format!("Required data cooker '{path}' is not registered")),
            }
        }

        for processor in requirements.processors {
            let required = DataExtensionId::DataProcessor(processor.clone());
            match node_map.get(&required) {
                Some(&to) => {
                    if !graph.contains_edge(from, to) {
                        graph.add_edge(from, to, ());
                    }
                }
                None => {
                    errors.push(format!("Required data processor '{processor}' is not registered"))
                }
            }
        }

        if let Some(entry) = resolved.get_mut(id) {
            entry.errors = errors;
        }
    }

    // Strongly connected components come out requirements-first
    for component in tarjan_scc(&graph) {
        let is_cycle = component.len() > 1
            || component.iter().any(|&node| graph.contains_edge(node, node));

        if is_cycle {
            let mut members: Vec<&DataExtensionId> =
                component.iter().map(|&node| &graph[node]).collect();
            members.sort();
            let mut chain: Vec<String> = members.iter().map(ToString::to_string).collect();
            chain.push(members[0].to_string());
            let message = format!("Circular dependency: {}", chain.join(" → "));

            for member in members {
                warn!("{member} is on a dependency cycle");
                if let Some(entry) = resolved.get_mut(member) {
                    entry.errors.push(message.clone());
                }
            }
            continue;
        }

        let node = component[0];
        let id = &graph[node];
        let mut errors = Vec::new();
        let mut dependencies = DataExtensionDependencies::default();

        for requirement in graph.neighbors(node) {
            let required = &graph[requirement];
            if let Some(state) = resolved.get(required) {
                if state.errors.is_empty() {
                    dependencies.include(required, &state.dependencies);
                } else {
                    errors.push(format!("Required {required} is unavailable"));
                }
            }
        }

        if let Some(entry) = resolved.get_mut(id) {
            entry.errors.extend(errors);
            entry.dependencies = dependencies;
            if entry.errors.is_empty() {
                debug!("{id} is available");
            } else {
                debug!("{id} is in error: {}", entry.errors.join("; "));
            }
        }
    }

    resolved
}
