//! Scheduling nodes and the placement algorithm.
//!
//! Every cooker handed to a scheduler becomes one [`SchedulingNode`]. Nodes are
//! immutable once built; placement state lives in a [`Placer`], which walks the
//! dependency graph depth-first and assigns each node a [`Placement`].
//!
//! # Placement rules
//!
//! A node starts at pass 0, block 0 (as-required nodes start at the pass of the
//! consumer that needs them). Each dependency is placed first; when it lands in
//! the node's pass or later:
//!
//! - an aligned dependency on a post-source-parsing producer moves the node to the
//!   pass after the producer, because the producer's output only exists once its
//!   pass has finished;
//! - otherwise a producer in a later pass pulls the node into that pass;
//! - a producer left in the same pass pushes the node into a later block.
//!
//! Moving to another pass always resets the block to 0.
//!
//! # As-required nodes
//!
//! An as-required cooker runs in every pass that consumes it. Its node is placed
//! once per distinct consumer pass and remembers the passes it already serves, so
//! one cooker may occupy several passes of the final schedule.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::debug;

use super::graph::{NodeId, Placement, SchedulingGraph};
use crate::cookers::{
    DataCookerDependencyType, DataCookerPath, DataProductionStrategy, SourceDataCookerDescriptor,
};
use crate::core::TracecookError;

/// One cooker and its resolved dependency edges.
#[derive(Debug)]
pub struct SchedulingNode {
    descriptor: Arc<dyn SourceDataCookerDescriptor>,
    dependencies: Vec<NodeId>,
}

impl SchedulingNode {
    /// The cooker this node schedules.
    pub fn descriptor(&self) -> &Arc<dyn SourceDataCookerDescriptor> {
        &self.descriptor
    }

    /// The cooker's path.
    pub fn path(&self) -> &DataCookerPath {
        self.descriptor.path()
    }

    /// The cooker's production strategy.
    pub fn strategy(&self) -> DataProductionStrategy {
        self.descriptor.data_production_strategy()
    }

    /// Whether the node is placed on demand, once per consuming pass.
    pub fn is_as_required(&self) -> bool {
        self.strategy() == DataProductionStrategy::AsRequired
    }

    /// Dependency nodes: normal ones first, then as-required ones, each group in
    /// declaration order.
    pub fn dependencies(&self) -> &[NodeId] {
        &self.dependencies
    }
}

/// All nodes of one scheduler, addressable by path.
#[derive(Debug)]
pub struct SchedulingNodes {
    nodes: Vec<SchedulingNode>,
    index: HashMap<DataCookerPath, NodeId>,
}

impl SchedulingNodes {
    /// Build one node per descriptor, in the given order.
    ///
    /// Fails when a requirement has no node of its own or when an as-required
    /// cooker requires a cooker that is not as-required.
    pub fn build(
        descriptors: Vec<Arc<dyn SourceDataCookerDescriptor>>,
    ) -> Result<Self, TracecookError> {
        let mut index = HashMap::with_capacity(descriptors.len());
        for (id, descriptor) in descriptors.iter().enumerate() {
            if index.insert(descriptor.path().clone(), id).is_some() {
                return Err(TracecookError::DuplicateDataCooker {
                    cooker: descriptor.path().to_string(),
                });
            }
        }

        let mut nodes = Self {
            nodes: Vec::with_capacity(descriptors.len()),
            index,
        };

        for descriptor in &descriptors {
            let mut normal = Vec::new();
            let mut as_required = Vec::new();

            for required in descriptor.required_data_cookers() {
                let dependency = nodes.get_scheduling_node(descriptor.path(), required)?;
                let dependency_strategy = descriptors[dependency].data_production_strategy();

                if dependency_strategy == DataProductionStrategy::AsRequired {
                    as_required.push(dependency);
                } else if descriptor.data_production_strategy() == DataProductionStrategy::AsRequired
                {
                    return Err(TracecookError::AsRequiredNormalDependency {
                        cooker: descriptor.path().to_string(),
                        dependency: required.to_string(),
                    });
                } else {
                    normal.push(dependency);
                }
            }

            normal.extend(as_required);
            nodes.nodes.push(SchedulingNode {
                descriptor: Arc::clone(descriptor),
                dependencies: normal,
            });
        }

        Ok(nodes)
    }

    /// Look up the node for `required`, a requirement of `cooker`.
    ///
    /// A miss means the enabling pipeline handed over a cooker without its
    /// dependencies.
    pub fn get_scheduling_node(
        &self,
        cooker: &DataCookerPath,
        required: &DataCookerPath,
    ) -> Result<NodeId, TracecookError> {
        self.index.get(required).copied().ok_or_else(|| TracecookError::MissingSchedulingNode {
            cooker: cooker.to_string(),
            required: required.to_string(),
        })
    }

    /// Node `id`.
    pub fn get(&self, id: NodeId) -> Option<&SchedulingNode> {
        self.nodes.get(id)
    }

    /// Nodes in build order.
    pub fn as_slice(&self) -> &[SchedulingNode] {
        &self.nodes
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether there are no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    NotVisited,
    InProgress,
    Done(Placement),
}

#[derive(Debug)]
struct NodeState {
    visit: Visit,
    /// Consumer pass → placement; only used by as-required nodes.
    served_passes: BTreeMap<usize, Placement>,
}

/// Depth-first placement of a fixed node set into a [`SchedulingGraph`].
pub struct Placer<'a> {
    nodes: &'a [SchedulingNode],
    graph: SchedulingGraph,
    states: Vec<NodeState>,
    stack: Vec<NodeId>,
}

impl<'a> Placer<'a> {
    /// A placer with an empty graph.
    pub fn new(nodes: &'a SchedulingNodes) -> Self {
        let nodes = nodes.as_slice();
        Self {
            nodes,
            graph: SchedulingGraph::new(),
            states: nodes
                .iter()
                .map(|_| NodeState {
                    visit: Visit::NotVisited,
                    served_passes: BTreeMap::new(),
                })
                .collect(),
            stack: Vec::new(),
        }
    }

    /// Place `id` and everything it depends on.
    ///
    /// Already placed nodes are skipped. As-required nodes are left alone here;
    /// they are placed when a consumer needs them.
    pub fn schedule(&mut self, id: NodeId) -> Result<(), TracecookError> {
        if self.nodes[id].is_as_required() {
            debug!("Deferring as-required cooker '{}' until it is consumed", self.nodes[id].path());
            return Ok(());
        }
        self.place(id, 0).map(|_| ())
    }

    /// Consume the placer, returning the graph and each node's placements.
    ///
    /// Normal nodes have exactly one placement. As-required nodes have one per
    /// consumer pass, in pass order, and none if nothing consumed them.
    pub fn finish(self) -> (SchedulingGraph, Vec<Vec<Placement>>) {
        let placements = self
            .states
            .into_iter()
            .map(|state| match state.visit {
                Visit::Done(placement) => vec![placement],
                _ => state.served_passes.into_values().collect(),
            })
            .collect();
        (self.graph, placements)
    }

    /// Place `id` for a consumer in `dependent_pass` and return where it landed.
    ///
    /// Normal nodes ignore `dependent_pass`: they are placed once, as early as
    /// their own dependencies allow.
    fn place(&mut self, id: NodeId, dependent_pass: usize) -> Result<Placement, TracecookError> {
        let nodes = self.nodes;

        if nodes[id].is_as_required() {
            if let Some(placement) = self.states[id].served_passes.get(&dependent_pass) {
                return Ok(*placement);
            }
            self.enter(id)?;
            let placement = self.place_after_dependencies(id, dependent_pass)?;
            self.states[id].served_passes.insert(dependent_pass, placement);
            self.leave(id, Visit::NotVisited);
            return Ok(placement);
        }

        if let Visit::Done(placement) = self.states[id].visit {
            return Ok(placement);
        }
        self.enter(id)?;
        let placement = self.place_after_dependencies(id, 0)?;
        self.leave(id, Visit::Done(placement));
        Ok(placement)
    }

    fn place_after_dependencies(
        &mut self,
        id: NodeId,
        start_pass: usize,
    ) -> Result<Placement, TracecookError> {
        let nodes = self.nodes;
        let node = &nodes[id];
        let mut placement = Placement::new(start_pass, 0);

        for &dependency_id in node.dependencies() {
            let dependency = &nodes[dependency_id];
            let produced = self.place(dependency_id, placement.pass)?;
            if produced.pass < placement.pass {
                continue;
            }

            let dependency_type = node.descriptor().dependency_type(dependency.path());
            let producer = dependency.strategy();

            if producer == DataProductionStrategy::AsRequired
                && dependency_type != DataCookerDependencyType::AlignedWithProductionStrategy
            {
                return Err(TracecookError::InvalidDependencyType {
                    cooker: node.path().to_string(),
                    dependency: dependency.path().to_string(),
                    dependency_type: dependency_type.to_string(),
                    strategy: producer.to_string(),
                });
            }

            if producer == DataProductionStrategy::PostSourceParsing
                && dependency_type == DataCookerDependencyType::AlignedWithProductionStrategy
            {
                placement = Placement::new(self.graph.next_pass_or_create(produced.pass)?, 0);
            } else if produced.pass > placement.pass {
                placement = Placement::new(produced.pass, 0);
            }

            if produced.pass == placement.pass
                && must_follow_in_pass(dependency_type, producer)
                && produced.block >= placement.block
            {
                placement.block = self.graph.next_block_or_create(produced.pass, produced.block)?;
            }

            debug!(
                "'{}' after '{}' ({dependency_type}, {producer}): now at pass {} block {}",
                node.path(),
                dependency.path(),
                placement.pass,
                placement.block
            );
        }

        self.graph.push_node(placement, id)?;
        debug!(
            "Placed data cooker '{}' at pass {} block {}",
            node.path(),
            placement.pass,
            placement.block
        );
        Ok(placement)
    }

    fn enter(&mut self, id: NodeId) -> Result<(), TracecookError> {
        if self.states[id].visit == Visit::InProgress {
            return Err(self.circular_dependency(id));
        }
        self.states[id].visit = Visit::InProgress;
        self.stack.push(id);
        Ok(())
    }

    fn leave(&mut self, id: NodeId, visit: Visit) {
        self.stack.pop();
        self.states[id].visit = visit;
    }

    fn circular_dependency(&self, id: NodeId) -> TracecookError {
        let start = self.stack.iter().position(|&on_stack| on_stack == id).unwrap_or(0);
        let chain = self.stack[start..]
            .iter()
            .chain(std::iter::once(&id))
            .map(|&node| self.nodes[node].path().to_string())
            .collect::<Vec<_>>()
            .join(" → ");
        TracecookError::CircularDependency {
            chain,
        }
    }
}

/// Whether a consumer sharing a pass with its producer must sit in a later block.
///
/// Only an aligned dependency on a post-source-parsing producer is exempt, and
/// that combination never shares a pass in the first place.
fn must_follow_in_pass(
    dependency_type: DataCookerDependencyType,
    producer: DataProductionStrategy,
) -> bool {
    !(dependency_type == DataCookerDependencyType::AlignedWithProductionStrategy
        && producer == DataProductionStrategy::PostSourceParsing)
}
