//! Identity of a data cooker.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::TracecookError;

/// Separator between the source parser id and the cooker id in the text form.
pub const PATH_SEPARATOR: char = '/';

/// Identifies exactly one data cooker across the whole system.
///
/// Source cookers carry the id of the source parser they consume; composite
/// cookers carry an empty source parser id. Equality and ordering are ordinal
/// over both strings.
///
/// The text form is `source/cooker`, or `/cooker` for composite cookers. Source
/// parser ids therefore must not contain `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DataCookerPath {
    source_parser_id: String,
    data_cooker_id: String,
}

impl DataCookerPath {
    /// Path of a cooker that consumes elements from `source_parser_id`.
    ///
    /// The source parser id must not contain [`PATH_SEPARATOR`]; use
    /// [`DataCookerPath::try_for_source`] for ids that are not known to be valid.
    pub fn for_source(source_parser_id: impl Into<String>, data_cooker_id: impl Into<String>) -> Self {
        let source_parser_id = source_parser_id.into();
        debug_assert!(
            !source_parser_id.contains(PATH_SEPARATOR),
            "source parser id '{source_parser_id}' contains '{PATH_SEPARATOR}'"
        );
        Self {
            source_parser_id,
            data_cooker_id: data_cooker_id.into(),
        }
    }

    /// Checked form of [`DataCookerPath::for_source`].
    ///
    /// # Errors
    ///
    /// [`TracecookError::InvalidDataCookerPath`] if the source parser id contains
    /// [`PATH_SEPARATOR`] or the cooker id is blank.
    pub fn try_for_source(source_parser_id: &str, data_cooker_id: &str) -> Result<Self, TracecookError> {
        let invalid = |reason: &str| TracecookError::InvalidDataCookerPath {
            path: format!("{source_parser_id}{PATH_SEPARATOR}{data_cooker_id}"),
            reason: reason.to_string(),
        };

        if source_parser_id.contains(PATH_SEPARATOR) {
            return Err(invalid("source parser id must not contain '/'"));
        }
        if data_cooker_id.trim().is_empty() {
            return Err(invalid("cooker id is empty"));
        }
        Ok(Self::for_source(source_parser_id, data_cooker_id))
    }

    /// Path of a composite cooker, which is not bound to any source parser.
    pub fn for_composite(data_cooker_id: impl Into<String>) -> Self {
        Self {
            source_parser_id: String::new(),
            data_cooker_id: data_cooker_id.into(),
        }
    }

    /// The source parser id; empty for composite cookers.
    pub fn source_parser_id(&self) -> &str {
        &self.source_parser_id
    }

    /// The cooker id, unique within its source parser.
    pub fn data_cooker_id(&self) -> &str {
        &self.data_cooker_id
    }

    /// Whether this path names a source cooker.
    pub fn is_source_data_cooker(&self) -> bool {
        !self.source_parser_id.is_empty()
    }

    /// Whether this path names a composite cooker.
    pub fn is_composite_data_cooker(&self) -> bool {
        self.source_parser_id.is_empty()
    }
}

impl fmt::Display for DataCookerPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.source_parser_id, PATH_SEPARATOR, self.data_cooker_id)
    }
}

impl FromStr for DataCookerPath {
    type Err = TracecookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| TracecookError::InvalidDataCookerPath {
            path: s.to_string(),
            reason: reason.to_string(),
        };

        let (source, cooker) =
            s.split_once(PATH_SEPARATOR).ok_or_else(|| invalid("missing '/' separator"))?;
        if cooker.trim().is_empty() {
            return Err(invalid("cooker id is empty"));
        }
        if source != source.trim() || cooker != cooker.trim() {
            return Err(invalid("ids must not have surrounding whitespace"));
        }

        // split_once stops at the first separator, so `source` never contains one
        Ok(Self::for_source(source, cooker))
    }
}

impl TryFrom<String> for DataCookerPath {
    type Error = TracecookError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DataCookerPath> for String {
    fn from(path: DataCookerPath) -> Self {
        path.to_string()
    }
}
