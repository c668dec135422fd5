/// Error types shared across the crate.
///
/// Only two things can go wrong inside the engine: a source document cannot
/// be loaded, or a value object is handed malformed data. Lookups that find
/// nothing are not errors and return `None` or an empty list instead.
use std::path::PathBuf;

use thiserror::Error;

/// Failure to obtain the raw text of one document.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no document registered for '{id}'")]
    Missing { id: String },
}

/// Rejection of a value object whose fields break its invariants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    #[error("{field} must match {pattern}, got '{value}'")]
    Pattern {
        field: &'static str,
        pattern: &'static str,
        value: String,
    },

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("{field} cannot be negative, got {value}")]
    Negative { field: &'static str, value: i64 },

    #[error("invalid URI '{value}'")]
    InvalidUri { value: String },
}

impl ValidationError {
    pub fn missing(field: &'static str) -> Self {
        Self::Missing { field }
    }

    pub fn empty(field: &'static str) -> Self {
        Self::Empty { field }
    }
}
