//! Error types for fluentsql

use thiserror::Error;

/// Result type alias for query building operations
pub type QbResult<T> = Result<T, QbError>;

/// Errors raised while constructing or rendering a query.
///
/// Every variant is detected locally and synchronously; nothing here is
/// produced by a database.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QbError {
    /// Number of supplied values does not match the number of `?` placeholders
    #[error("Argument count mismatch: expected {expected} value(s), got {actual}")]
    ArgumentCount { expected: usize, actual: usize },

    /// Function called with too few arguments
    #[error("{function}() requires at least {min} argument(s), got {actual}")]
    FunctionArity {
        function: &'static str,
        min: usize,
        actual: usize,
    },

    /// A required list was empty or missing
    #[error("Missing required list: {0}")]
    MissingList(&'static str),

    /// Builder is in a state that does not allow the requested operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Conversion that would silently drop information
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl QbError {
    /// Create an argument count error
    pub fn argument_count(expected: usize, actual: usize) -> Self {
        Self::ArgumentCount { expected, actual }
    }

    /// Create an invalid state error
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Create an unsupported conversion error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    /// Check if this is an argument count error
    pub fn is_argument_count(&self) -> bool {
        matches!(self, Self::ArgumentCount { .. })
    }

    /// Check if this is a structural state error
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState(_))
    }

    /// Check if the error was caused by a bad argument rather than builder state
    ///
    /// Covers argument count, function arity and missing lists.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::ArgumentCount { .. } | Self::FunctionArity { .. } | Self::MissingList(_)
        )
    }
}
