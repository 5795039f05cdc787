//! Error handling for tracecook
//!
//! This module provides the error taxonomy for cooker scheduling and data-extension
//! resolution, plus user-friendly reporting for the command-line harness. The error
//! system follows two rules:
//! 1. **Strongly-typed errors** so library callers can match on the failure mode
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Error Categories
//!
//! - **Configuration**: [`TracecookError::CrossSourceDependency`],
//!   [`TracecookError::InvalidDependencyType`], [`TracecookError::AsRequiredNormalDependency`],
//!   [`TracecookError::AlreadyScheduled`], [`TracecookError::DuplicateDataCooker`]
//! - **Dependency graph**: [`TracecookError::CircularDependency`]
//! - **Internal consistency**: [`TracecookError::MissingSchedulingNode`],
//!   [`TracecookError::SchedulingGraphAppend`]
//! - **Catalogs**: [`TracecookError::CatalogParseError`]
//! - **Lookups**: [`TracecookError::ExtensionNotFound`], [`TracecookError::InvalidDataCookerPath`]
//!
//! Configuration and dependency-graph errors abort scheduling of the affected
//! source entirely; there is no partial schedule. Repository-level dependency
//! problems are not errors of this type: they are recorded per extension as an
//! availability state (see [`crate::repository`]).
//!
//! # Examples
//!
//! ```rust,no_run
//! use tracecook::core::{TracecookError, user_friendly_error};
//!
//! let error = TracecookError::CircularDependency {
//!     chain: "LTTng/A → LTTng/B → LTTng/A".to_string(),
//! };
//! let context = user_friendly_error(anyhow::Error::from(error));
//! context.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for tracecook operations.
#[derive(Error, Debug, Clone)]
pub enum TracecookError {
    /// A dependency cycle was found while placing cookers or resolving extensions.
    ///
    /// # Fields
    /// - `chain`: The dependency chain showing the circular reference
    #[error("Circular dependency detected: {chain}")]
    CircularDependency {
        /// String representation of the circular dependency chain
        chain: String,
    },

    /// A source cooker requires a cooker that belongs to a different source parser.
    #[error("Data cooker '{cooker}' requires '{required}' from a different source parser")]
    CrossSourceDependency {
        /// The requiring cooker
        cooker: String,
        /// The required cooker from another source
        required: String,
    },

    /// A cooker was handed to the scheduler of a source parser it does not target.
    #[error("Data cooker '{cooker}' does not target source parser '{source_parser_id}'")]
    WrongSourceParser {
        /// The offending cooker
        cooker: String,
        /// The source parser the scheduler was created for
        source_parser_id: String,
    },

    /// A dependency type is not legal for the dependency's production strategy.
    ///
    /// An as-required producer runs wherever it is consumed, so only the aligned
    /// dependency type has a meaning for it.
    #[error(
        "Data cooker '{cooker}' declares dependency type {dependency_type} on '{dependency}', \
         which produces data {strategy}"
    )]
    InvalidDependencyType {
        /// The consuming cooker
        cooker: String,
        /// The producing cooker
        dependency: String,
        /// The declared dependency type
        dependency_type: String,
        /// The producer's production strategy
        strategy: String,
    },

    /// An as-required cooker depends on a cooker that is not itself as-required.
    #[error("As-required data cooker '{cooker}' cannot depend on '{dependency}', which is not as-required")]
    AsRequiredNormalDependency {
        /// The as-required cooker
        cooker: String,
        /// Its non as-required dependency
        dependency: String,
    },

    /// `schedule_data_cookers` was called more than once on the same scheduler.
    #[error("Data cookers for source parser '{source_parser_id}' have already been scheduled")]
    AlreadyScheduled {
        /// The scheduler's source parser
        source_parser_id: String,
    },

    /// The same cooker path was handed to a scheduler twice.
    #[error("Data cooker '{cooker}' was provided more than once")]
    DuplicateDataCooker {
        /// The duplicated cooker path
        cooker: String,
    },

    /// A required cooker has no scheduling node.
    ///
    /// This means a cooker was enabled without its dependencies being enabled,
    /// which is a bug in the enabling pipeline rather than in a plugin.
    #[error("Data cooker '{required}' required by '{cooker}' was not provided to the scheduler")]
    MissingSchedulingNode {
        /// The requiring cooker
        cooker: String,
        /// The required cooker with no node
        required: String,
    },

    /// A pass or block was appended somewhere other than after the current tail.
    #[error("Cannot append after {kind} {index}: it is not the last {kind}")]
    SchedulingGraphAppend {
        /// "pass" or "block"
        kind: &'static str,
        /// The index the append was attempted from
        index: usize,
    },

    /// A requested extension is not registered.
    #[error("Data extension '{id}' is not registered")]
    ExtensionNotFound {
        /// Display form of the missing extension id
        id: String,
    },

    /// A data cooker path string could not be parsed.
    #[error("Invalid data cooker path '{path}': {reason}")]
    InvalidDataCookerPath {
        /// The text that failed to parse
        path: String,
        /// Why it was rejected
        reason: String,
    },

    /// An extension catalog could not be interpreted.
    #[error("Invalid extension catalog {file}: {reason}")]
    CatalogParseError {
        /// Path of the catalog
        file: String,
        /// Parser or validation message
        reason: String,
    },

    /// Catch-all
    #[error("{message}")]
    Other {
        /// The error message
        message: String,
    },
}

impl TracecookError {
    /// Whether this error signals a bug in the enabling pipeline or the
    /// scheduler itself, as opposed to a misconfigured plugin.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::MissingSchedulingNode { .. } | Self::SchedulingGraphAppend { .. })
    }
}

/// Error wrapper carrying a suggestion and details for terminal display.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: TracecookError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: TracecookError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr: error in red, details in yellow, suggestion in green.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with suggestions for the CLI.
///
/// [`TracecookError`] values anywhere in the chain get tailored suggestions;
/// anything else is reported with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(tracecook_error) =
        error.chain().find_map(|cause| cause.downcast_ref::<TracecookError>())
    {
        return create_error_context(tracecook_error.clone());
    }

    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(TracecookError::Other {
        message,
    })
}

fn create_error_context(error: TracecookError) -> ErrorContext {
    match &error {
        TracecookError::CircularDependency {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Remove one of the requirements on the cycle")
            .with_details("Cookers on a dependency cycle can never observe each other's output"),
        TracecookError::CrossSourceDependency {
            ..
        } => ErrorContext::new(error).with_suggestion(
            "Source cookers may only require cookers of their own source parser; \
             use a composite cooker to combine data from several sources",
        ),
        TracecookError::InvalidDependencyType {
            ..
        } => ErrorContext::new(error).with_suggestion(
            "Declare as-required dependencies with the aligned-with-production-strategy type",
        ),
        TracecookError::AsRequiredNormalDependency {
            ..
        } => ErrorContext::new(error).with_details(
            "As-required cookers run in every pass that consumes them and cannot wait for other passes",
        ),
        TracecookError::MissingSchedulingNode {
            ..
        }
        | TracecookError::SchedulingGraphAppend {
            ..
        } => ErrorContext::new(error)
            .with_details("This is an internal consistency failure, not a plugin error"),
        TracecookError::ExtensionNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Run 'tracecook validate' to list the registered extensions"),
        TracecookError::InvalidDataCookerPath {
            ..
        } => ErrorContext::new(error).with_suggestion(
            "Write source cookers as 'source/cooker' and composite cookers as '/cooker'",
        ),
        TracecookError::CatalogParseError {
            ..
        } => {
            ErrorContext::new(error).with_suggestion("Check the TOML syntax of the extension catalog")
        }
        _ => ErrorContext::new(error),
    }
}
