//! Core types shared by every tracecook module.
//!
//! Currently this is the error taxonomy: [`TracecookError`] for library callers
//! that need to match on failure modes, and [`ErrorContext`] /
//! [`user_friendly_error`] for presenting failures in the terminal.

pub mod error;

pub use error::{ErrorContext, TracecookError, user_friendly_error};
