//! Field-level validation shared by record inputs.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validation failure for a create input or a patched record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text is empty after trim.
    BlankField(&'static str),
    /// Numeric value is below the allowed minimum.
    BelowMinimum {
        field: &'static str,
        value: i64,
        min: i64,
    },
    /// Text exceeds the allowed character count.
    TooLong {
        field: &'static str,
        max_chars: usize,
        actual: usize,
    },
    /// Floating point value is NaN, infinite, or negative.
    InvalidNumber(&'static str),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "`{field}` must not be blank"),
            Self::BelowMinimum { field, value, min } => {
                write!(f, "`{field}` must be >= {min}, got {value}")
            }
            Self::TooLong {
                field,
                max_chars,
                actual,
            } => write!(
                f,
                "`{field}` must be at most {max_chars} characters, got {actual}"
            ),
            Self::InvalidNumber(field) => {
                write!(f, "`{field}` must be a finite non-negative number")
            }
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    Ok(())
}

pub(crate) fn require_min(field: &'static str, value: i64, min: i64) -> Result<(), ValidationError> {
    if value < min {
        return Err(ValidationError::BelowMinimum { field, value, min });
    }
    Ok(())
}

pub(crate) fn require_max_chars(
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual > max_chars {
        return Err(ValidationError::TooLong {
            field,
            max_chars,
            actual,
        });
    }
    Ok(())
}

pub(crate) fn require_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::InvalidNumber(field));
    }
    Ok(())
}
