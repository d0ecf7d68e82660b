//! Filter compile errors

use serde_json::Value;
use thiserror::Error;

use crate::utils::json::json_kind;

/// Errors raised while compiling a filter document
///
/// Every variant is terminal: the whole document is rejected and no partial
/// predicate tree is produced.
#[derive(Error, Debug)]
pub enum FilterError {
    /// Input bytes are not valid JSON
    #[error("Filter is not valid JSON: {0}")]
    MalformedInput(#[source] serde_json::Error),

    /// A value has the wrong JSON kind for its grammar position
    #[error("Invalid filter at {path}: expected {expected}, got {actual}")]
    InvalidShape {
        path: String,
        expected: String,
        actual: String,
    },

    /// A key under a field operand is not a known comparison operator
    #[error("Unknown filter operator '{operator}' at {path}")]
    UnknownOperator { path: String, operator: String },

    /// Input exceeds the configured size limit
    ///
    /// `size` is the number of bytes seen, which for streamed input stops one
    /// byte past `max`.
    #[error("Filter JSON exceeds the maximum of {max} bytes ({size} bytes read)")]
    TooLarge { size: usize, max: usize },
}

impl FilterError {
    /// Create a shape error naming the kind actually found
    pub fn invalid_shape(path: &str, expected: impl Into<String>, actual: &Value) -> Self {
        Self::InvalidShape {
            path: path.to_string(),
            expected: expected.into(),
            actual: json_kind(actual).to_string(),
        }
    }

    /// Create an unknown operator error
    pub fn unknown_operator(path: &str, operator: &str) -> Self {
        Self::UnknownOperator {
            path: path.to_string(),
            operator: operator.to_string(),
        }
    }

    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedInput(_) => "INVALID_FILTER_JSON",
            Self::InvalidShape { .. } => "INVALID_FILTER_SHAPE",
            Self::UnknownOperator { .. } => "UNKNOWN_FILTER_OPERATOR",
            Self::TooLarge { .. } => "FILTER_JSON_TOO_LARGE",
        }
    }
}
