//! tracecook - source data cooker scheduling for trace processing
//!
//! Trace processing plugins contribute *data extensions*: source data cookers
//! that consume elements from a source parser, composite cookers that combine
//! other cookers, data processors, and tables. Reading a large trace is
//! expensive, so the cookers a table needs are grouped into as few sequential
//! passes over the source as possible while respecting when each producer's
//! output becomes available.
//!
//! # Architecture Overview
//!
//! ```text
//! catalogs ──► DataExtensionRepositoryBuilder ──finalize──► DataExtensionRepository
//!                                                                 │
//!                          table selection ──► enabling helpers ◄─┘
//!                                                   │
//!                                  SourceProcessingSession (one per source parser)
//!                                                   │
//!                                      SourceDataCookerScheduler
//!                                                   │
//!                                  passes of cookers, each in block order
//! ```
//!
//! # Core Modules
//!
//! - [`cookers`] - Cooker paths, production strategies, dependency types and descriptors
//! - [`scheduler`] - Pass/block placement of one source parser's cookers
//! - [`repository`] - Extension registration, dependency resolution and enabling
//! - [`core`] - Error types and user-facing error rendering
//!
//! ## Supporting Modules
//!
//! - [`config`] - TOML extension catalogs and environment configuration
//! - [`cli`] - The `tracecook` command-line interface
//! - [`constants`] - Shared constants
//!
//! # Scheduling Rules
//!
//! For a cooker `A` requiring `B` of the same source:
//!
//! - If `B` produces post source parsing and `A` depends on it aligned with
//!   that strategy, `A` runs in a later pass than `B`.
//! - Otherwise `A` runs in the same pass as `B` (or later) but in a later block.
//! - As-required cookers run in every pass that needs them, just ahead of the
//!   consumer, and may only depend on other as-required cookers.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tracecook::cookers::{DataCookerPath, DataCookerSpec};
//! use tracecook::repository::{
//!     DataExtensionRepositoryBuilder, SourceDataProcessor, SourceProcessingSession,
//!     TableDescriptor, TableSelection, enable_source_data_cookers_for_tables,
//!     get_enabled_table_extension_references,
//! };
//! use uuid::Uuid;
//!
//! let threads = DataCookerPath::for_source("LTTng", "Threads");
//! let builder = DataExtensionRepositoryBuilder::new();
//! builder.add_source_data_cooker(Arc::new(DataCookerSpec::new(threads.clone())));
//! builder.add_source_data_cooker(Arc::new(
//!     DataCookerSpec::source("LTTng", "Sched").requires(threads),
//! ));
//! builder.add_table(
//!     TableDescriptor::new(Uuid::nil(), "CPU")
//!         .requires(DataCookerPath::for_source("LTTng", "Sched")),
//! );
//! let repository = builder.finalize_data_extensions();
//!
//! let mut sessions = vec![SourceProcessingSession::new("LTTng")];
//! let tables = get_enabled_table_extension_references(&repository, &sessions, &TableSelection::All);
//! enable_source_data_cookers_for_tables(&repository, &mut sessions, &tables);
//!
//! let scheduler = sessions[0].build_schedule()?;
//! assert_eq!(scheduler.pass_count(), 2);
//! assert_eq!(sessions[0].source_parser_id(), "LTTng");
//! # Ok::<(), tracecook::core::TracecookError>(())
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod cookers;
pub mod core;
pub mod repository;
pub mod scheduler;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
