//! Source data cooker scheduling.
//!
//! Re-reading a source trace is expensive, so every cooker that consumes a given
//! source parser is grouped into as few sequential passes over the source as
//! possible. [`SourceDataCookerScheduler`] assigns each cooker a `(pass, block)`
//! coordinate and emits the cookers of each pass in block order:
//!
//! - **Pass**: one full traversal of the source data. A consumer of a
//!   post-source-parsing producer cannot run before the producer's pass is over,
//!   so it lands in a later pass.
//! - **Block**: ordering inside a pass. A consumer reading its producer while the
//!   pass runs lands in a later block of the same pass.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tracecook::cookers::{DataCookerDescriptor, DataCookerSpec, SourceDataCookerDescriptor};
//! use tracecook::scheduler::SourceDataCookerScheduler;
//!
//! let c1 = DataCookerSpec::source("S", "C1");
//! let c2 = DataCookerSpec::source("S", "C2");
//! let c3 = DataCookerSpec::source("S", "C3")
//!     .requires(c1.path().clone())
//!     .requires(c2.path().clone());
//!
//! let cookers: Vec<Arc<dyn SourceDataCookerDescriptor>> =
//!     vec![Arc::new(c1), Arc::new(c2), Arc::new(c3)];
//!
//! let mut scheduler = SourceDataCookerScheduler::new("S");
//! scheduler.schedule_data_cookers(cookers)?;
//!
//! let passes = scheduler.data_cookers_by_source_pass();
//! assert_eq!(passes.len(), 2);
//! assert_eq!(passes[0].len(), 2);
//! assert_eq!(passes[1][0].path().data_cooker_id(), "C3");
//! # Ok::<(), tracecook::core::TracecookError>(())
//! ```
//!
//! # Ordering within a block
//!
//! Nodes enter a block when their placement completes. The scheduler walks
//! cookers in the order they were handed over, and each cooker walks its
//! requirements in declaration order (normal before as-required), so the output
//! is deterministic for a given input order.

pub mod graph;
pub mod node;

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

pub use graph::{NodeId, Placement, SchedulingBlock, SchedulingGraph, SchedulingPass};
pub use node::{Placer, SchedulingNode, SchedulingNodes};

use crate::cookers::{DataCookerPath, SourceDataCookerDescriptor};
use crate::core::TracecookError;

/// Cookers of one source parser, grouped by pass.
pub type CookersByPass = Vec<Vec<Arc<dyn SourceDataCookerDescriptor>>>;

/// Schedules every enabled cooker of one source parser.
///
/// [`schedule_data_cookers`](Self::schedule_data_cookers) may be called once. A
/// failed call still consumes that one attempt: configuration errors are plugin
/// bugs and the source processor is not expected to retry.
#[derive(Debug)]
pub struct SourceDataCookerScheduler {
    source_parser_id: String,
    attempted: bool,
    scheduled: bool,
    data_cookers_by_source_pass: CookersByPass,
    placements: HashMap<DataCookerPath, Vec<Placement>>,
}

impl SourceDataCookerScheduler {
    /// A scheduler for cookers of `source_parser_id`.
    pub fn new(source_parser_id: impl Into<String>) -> Self {
        Self {
            source_parser_id: source_parser_id.into(),
            attempted: false,
            scheduled: false,
            data_cookers_by_source_pass: Vec::new(),
            placements: HashMap::new(),
        }
    }

    /// The source parser this scheduler serves.
    pub fn source_parser_id(&self) -> &str {
        &self.source_parser_id
    }

    /// Whether a schedule has been produced.
    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    /// Place `cookers` into passes and blocks.
    ///
    /// # Errors
    ///
    /// - [`TracecookError::AlreadyScheduled`] on any call after the first
    /// - [`TracecookError::WrongSourceParser`] for a cooker of another source
    /// - [`TracecookError::CrossSourceDependency`] for a requirement on another source
    /// - [`TracecookError::DuplicateDataCooker`] for a path given twice
    /// - [`TracecookError::MissingSchedulingNode`] for a requirement not given
    /// - [`TracecookError::AsRequiredNormalDependency`] and
    ///   [`TracecookError::InvalidDependencyType`] for illegal dependency combinations
    /// - [`TracecookError::CircularDependency`] for dependency cycles
    ///
    /// On error no schedule is produced.
    pub fn schedule_data_cookers<I>(&mut self, cookers: I) -> Result<(), TracecookError>
    where
        I: IntoIterator<Item = Arc<dyn SourceDataCookerDescriptor>>,
    {
        if self.attempted {
            return Err(TracecookError::AlreadyScheduled {
                source_parser_id: self.source_parser_id.clone(),
            });
        }
        self.attempted = true;

        let descriptors: Vec<_> = cookers.into_iter().collect();
        for descriptor in &descriptors {
            self.validate(descriptor.as_ref())?;
        }

        let nodes = SchedulingNodes::build(descriptors)?;
        let mut placer = Placer::new(&nodes);
        for id in 0..nodes.len() {
            placer.schedule(id)?;
        }
        let (graph, placements) = placer.finish();

        self.data_cookers_by_source_pass = graph
            .passes()
            .iter()
            .map(|pass| {
                pass.nodes()
                    .filter_map(|id| nodes.get(id).map(|node| Arc::clone(node.descriptor())))
                    .collect()
            })
            .collect();

        self.placements = nodes
            .as_slice()
            .iter()
            .zip(placements)
            .map(|(node, placements)| (node.path().clone(), placements))
            .collect();

        self.scheduled = true;
        info!(
            "Scheduled {} data cooker(s) for source parser '{}' into {} pass(es)",
            nodes.len(),
            self.source_parser_id,
            self.data_cookers_by_source_pass.len()
        );
        for (index, pass) in self.data_cookers_by_source_pass.iter().enumerate() {
            debug!(
                "Pass {index}: {}",
                pass.iter().map(|cooker| cooker.path().to_string()).collect::<Vec<_>>().join(", ")
            );
        }

        Ok(())
    }

    /// Cookers per pass, in pass order, each pass in block order.
    ///
    /// Empty until [`schedule_data_cookers`](Self::schedule_data_cookers) succeeds.
    /// As-required cookers appear once in every pass that consumes them.
    pub fn data_cookers_by_source_pass(&self) -> &CookersByPass {
        &self.data_cookers_by_source_pass
    }

    /// Every `(pass, block)` the cooker at `path` occupies, in pass order.
    ///
    /// Normal cookers occupy exactly one; as-required cookers one per consuming
    /// pass, possibly none.
    pub fn placements(&self, path: &DataCookerPath) -> &[Placement] {
        self.placements.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of passes in the schedule.
    pub fn pass_count(&self) -> usize {
        self.data_cookers_by_source_pass.len()
    }

    /// Number of cooker entries across all passes.
    pub fn cooker_count(&self) -> usize {
        self.data_cookers_by_source_pass.iter().map(Vec::len).sum()
    }

    fn validate(&self, descriptor: &dyn SourceDataCookerDescriptor) -> Result<(), TracecookError> {
        let path = descriptor.path();
        if path.source_parser_id() != self.source_parser_id {
            return Err(TracecookError::WrongSourceParser {
                cooker: path.to_string(),
                source_parser_id: self.source_parser_id.clone(),
            });
        }

        if let Some(required) = descriptor
            .required_data_cookers()
            .iter()
            .find(|required| required.source_parser_id() != self.source_parser_id)
        {
            return Err(TracecookError::CrossSourceDependency {
                cooker: path.to_string(),
                required: required.to_string(),
            });
        }

        Ok(())
    }
}
