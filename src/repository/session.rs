//! Per-source processing sessions.
//!
//! A session collects the cookers enabled for one source parser and turns them
//! into a pass schedule once enabling is done.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use tracing::debug;

use super::DataExtensionLookup;
use super::enabling::SourceDataProcessor;
use crate::cookers::{DataCookerPath, SourceDataCookerDescriptor};
use crate::core::TracecookError;
use crate::scheduler::SourceDataCookerScheduler;

/// Enabled cookers of one source parser, in enabling order.
#[derive(Debug, Clone)]
pub struct SourceProcessingSession {
    source_parser_id: String,
    enabled: Vec<Arc<dyn SourceDataCookerDescriptor>>,
    enabled_paths: HashSet<DataCookerPath>,
}

impl SourceProcessingSession {
    /// A session with nothing enabled.
    pub fn new(source_parser_id: impl Into<String>) -> Self {
        Self {
            source_parser_id: source_parser_id.into(),
            enabled: Vec::new(),
            enabled_paths: HashSet::new(),
        }
    }

    /// Cookers enabled so far.
    pub fn enabled_data_cookers(&self) -> &[Arc<dyn SourceDataCookerDescriptor>] {
        &self.enabled
    }

    /// Schedule the enabled cookers.
    ///
    /// # Errors
    ///
    /// Any scheduling error from
    /// [`SourceDataCookerScheduler::schedule_data_cookers`].
    pub fn build_schedule(&self) -> Result<SourceDataCookerScheduler, TracecookError> {
        let mut scheduler = SourceDataCookerScheduler::new(self.source_parser_id.clone());
        scheduler.schedule_data_cookers(self.enabled.iter().cloned())?;
        Ok(scheduler)
    }
}

impl SourceDataProcessor for SourceProcessingSession {
    fn source_parser_id(&self) -> &str {
        &self.source_parser_id
    }

    fn enable_data_cooker(&mut self, cooker: Arc<dyn SourceDataCookerDescriptor>) -> bool {
        let path = cooker.path();
        if path.source_parser_id() != self.source_parser_id {
            debug!("Session '{}' ignores cooker '{path}'", self.source_parser_id);
            return false;
        }
        if !self.enabled_paths.insert(path.clone()) {
            return false;
        }
        self.enabled.push(cooker);
        true
    }

    fn is_data_cooker_enabled(&self, path: &DataCookerPath) -> bool {
        self.enabled_paths.contains(path)
    }
}

/// One empty session per source parser that has registered cookers, ordered
/// by source parser id.
pub fn sessions_for_repository<R: DataExtensionLookup>(repository: &R) -> Vec<SourceProcessingSession> {
    repository
        .source_data_cookers()
        .keys()
        .map(DataCookerPath::source_parser_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(SourceProcessingSession::new)
        .collect()
}
