//! Data cooker identity and descriptor contracts.
//!
//! A data cooker consumes keyed elements from one pass over a source (or the
//! output of other cookers) and produces derived data. This module defines the
//! immutable values the rest of the crate works with:
//!
//! - [`DataCookerPath`] - `(source parser id, cooker id)`, the cooker's identity
//! - [`DataProductionStrategy`] - when a cooker's output becomes visible
//! - [`DataCookerDependencyType`] - how a consumer reads one requirement
//! - [`DataCookerDescriptor`] / [`SourceDataCookerDescriptor`] - the contracts
//!   plugin authors implement
//! - [`DataCookerSpec`] - a value implementation of both contracts

pub mod descriptor;
pub mod path;

pub use descriptor::{
    DataCookerDependencyType, DataCookerDescriptor, DataCookerSpec, DataProductionStrategy,
    SourceDataCookerDescriptor,
};
pub use path::DataCookerPath;
