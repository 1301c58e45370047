//! Error types for filter invocations.

use thiserror::Error;

/// Error type for filter invocations.
///
/// Every variant is recoverable: the runner rejects the invocation and the
/// image keeps its pre-invocation contents.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// A parameter is missing, mistyped, or outside its declared choices.
    #[error("invalid parameter `{key}`: {reason}")]
    InvalidParameter {
        /// Schema key of the offending parameter.
        key: String,
        /// Human readable explanation.
        reason: String,
    },

    /// Mask or buffer dimensions disagree with the source.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A result could not be stored without silently wrapping.
    #[error("numeric overflow in `{filter}`: value {value} does not fit the storage type")]
    NumericOverflow {
        /// Key of the filter that produced the value.
        filter: String,
        /// First offending value.
        value: f64,
    },

    /// No catalog entry has the requested key.
    #[error("unknown filter: {0}")]
    UnknownFilter(String),

    /// The filter lacks the capability this request needs.
    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

impl FilterError {
    pub(crate) fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        FilterError::InvalidParameter {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for filter invocations.
pub type FilterResult<T> = Result<T, FilterError>;
