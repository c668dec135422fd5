/// Field checks shared by the value-object constructors.
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationError;
use crate::uri;

pub const SLUG_PATTERN: &str = "^[a-z]+$";

static SLUG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(SLUG_PATTERN).unwrap());

pub fn non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::empty(field));
    }
    Ok(())
}

/// Lowercase-letters-only document identifier.
pub fn slug(field: &'static str, value: &str) -> Result<(), ValidationError> {
    non_empty(field, value)?;
    if !SLUG_RE.is_match(value) {
        return Err(ValidationError::Pattern {
            field,
            pattern: SLUG_PATTERN,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Relevance score in `[0, 1]`; NaN is rejected.
pub fn unit_score(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field,
            min: 0.0,
            max: 1.0,
            value,
        });
    }
    Ok(())
}

pub fn count(field: &'static str, value: i64) -> Result<usize, ValidationError> {
    usize::try_from(value).map_err(|_| ValidationError::Negative { field, value })
}

pub fn resource_uri(value: &str) -> Result<(), ValidationError> {
    non_empty("uri", value)?;
    if !uri::is_well_formed(value) {
        return Err(ValidationError::InvalidUri {
            value: value.to_string(),
        });
    }
    Ok(())
}
