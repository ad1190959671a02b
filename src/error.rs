//! Error Types and Handling
//!
//! Error types for the Headwater projection pipeline, with structured error
//! codes for programmatic handling and recovery hints for host UIs that need
//! to turn failures into user-facing states.
//!
//! # Error Categories
//!
//! Errors are organized into categories with numeric codes:
//!
//! | Range | Category | Examples |
//! |-------|----------|----------|
//! | 1xxx | Graph | RootNotFound, DuplicateId, InvalidGraph |
//! | 2xxx | Serialization | Serialization |
//! | 3xxx | Interaction | NodeNotFound, InvalidState |
//!
//! # Example
//!
//! ```rust
//! use headwater::error::{HeadwaterError, Result, Recoverable};
//!
//! fn example_operation() -> Result<()> {
//!     Err(HeadwaterError::RootNotFound("orders_mart".to_string()))
//! }
//!
//! fn handle_error(err: HeadwaterError) {
//!     let code = err.error_code();
//!     println!("Error code: {:?} ({})", code, code.code());
//!
//!     match err {
//!         HeadwaterError::RootNotFound(id) => {
//!             println!("Root model '{}' absent from node set", id);
//!         }
//!         _ => println!("Other error: {}", err),
//!     }
//! }
//! ```
//!
//! Data-quality defects inside a well-formed graph (dangling edge endpoints,
//! duplicate IDs in a deserialized payload, expansion IDs that no longer
//! exist) are deliberately *not* errors: the pipeline skips them and records
//! the fact in pass diagnostics. Only conditions that make a projection
//! meaningless (no root to anchor the layout) surface here.

use thiserror::Error;

/// Error code categories for programmatic error handling.
///
/// Each error code belongs to a category indicated by its numeric range.
/// Use [`ErrorCode::category()`] to get the human-readable category name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Root model ID absent from the node set
    RootNotFound = 1001,
    /// A node with this ID was declared twice
    DuplicateId = 1002,
    /// Graph violates a structural invariant
    InvalidGraph = 1003,

    /// Failed to serialize or deserialize a graph payload
    SerializationFailed = 2001,

    /// Referenced node does not exist in the current projection
    NodeNotFound = 3001,
    /// Interaction API called in the wrong state
    InvalidState = 3002,
}

impl ErrorCode {
    /// Get the numeric error code
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a brief description of the error category
    pub fn category(&self) -> &'static str {
        match self {
            ErrorCode::RootNotFound | ErrorCode::DuplicateId | ErrorCode::InvalidGraph => "Graph",
            ErrorCode::SerializationFailed => "Serialization",
            ErrorCode::NodeNotFound | ErrorCode::InvalidState => "Interaction",
        }
    }
}

/// A recovery hint providing actionable guidance for resolving errors
#[derive(Debug, Clone)]
pub struct RecoveryHint {
    /// Short summary of the recovery action
    pub summary: String,
    /// Detailed steps or explanation
    pub details: Option<String>,
}

impl RecoveryHint {
    /// Create a new recovery hint with just a summary
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            details: None,
        }
    }

    /// Add detailed recovery steps
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl std::fmt::Display for RecoveryHint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.summary)?;
        if let Some(details) = &self.details {
            write!(f, "\n  Details: {}", details)?;
        }
        Ok(())
    }
}

/// Trait for errors that can provide recovery hints
pub trait Recoverable {
    /// Get the error code for this error
    fn error_code(&self) -> ErrorCode;

    /// Get recovery hints for this error
    fn recovery_hints(&self) -> Vec<RecoveryHint>;

    /// Check if the error is retryable
    fn is_retryable(&self) -> bool;
}

/// Error types for Headwater projection operations
#[must_use]
#[derive(Error, Debug)]
pub enum HeadwaterError {
    /// The root model ID named in the graph metadata has no matching node.
    /// No meaningful layout can proceed; the caller should render an
    /// empty/error state rather than retry.
    #[error("root model '{0}' not found in node set")]
    RootNotFound(String),

    /// A node ID was declared more than once during validated construction.
    #[error("duplicate node ID: '{0}'")]
    DuplicateId(String),

    /// The graph violates a structural invariant (e.g. root level != 0).
    #[error("invalid graph: {0}")]
    InvalidGraph(String),

    /// Serialization error from the JSON wire contract.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An interaction API referenced a node absent from the projection.
    #[error("node '{0}' not found in projection")]
    NodeNotFound(String),

    /// An interaction API was called in the wrong state.
    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl Recoverable for HeadwaterError {
    fn error_code(&self) -> ErrorCode {
        match self {
            HeadwaterError::RootNotFound(_) => ErrorCode::RootNotFound,
            HeadwaterError::DuplicateId(_) => ErrorCode::DuplicateId,
            HeadwaterError::InvalidGraph(_) => ErrorCode::InvalidGraph,
            HeadwaterError::Serialization(_) => ErrorCode::SerializationFailed,
            HeadwaterError::NodeNotFound(_) => ErrorCode::NodeNotFound,
            HeadwaterError::InvalidState(_) => ErrorCode::InvalidState,
        }
    }

    fn recovery_hints(&self) -> Vec<RecoveryHint> {
        match self {
            HeadwaterError::RootNotFound(id) => vec![
                RecoveryHint::new(format!("Verify the lineage payload contains node '{}'", id))
                    .with_details("metadata.root_model_id must reference a node in the node list"),
                RecoveryHint::new("Render an empty lineage state instead of retrying"),
            ],

            HeadwaterError::DuplicateId(id) => vec![
                RecoveryHint::new(format!("Remove the duplicate declaration of '{}'", id)),
                RecoveryHint::new("Node IDs must be unique across the graph"),
            ],

            HeadwaterError::InvalidGraph(reason) => vec![
                RecoveryHint::new(format!("Fix graph structure: {}", reason)),
                RecoveryHint::new("The root node must carry level 0 and levels must be non-negative"),
            ],

            HeadwaterError::Serialization(_) => vec![
                RecoveryHint::new("Check the payload against the LineageGraph wire contract")
                    .with_details("Node objects use camelCase field names (isSource, sourceName)"),
            ],

            HeadwaterError::NodeNotFound(id) => vec![
                RecoveryHint::new(format!("Node '{}' is not part of the current projection", id)),
                RecoveryHint::new("Re-project before issuing interactions against new nodes"),
            ],

            HeadwaterError::InvalidState(reason) => vec![
                RecoveryHint::new(format!("Interaction out of order: {}", reason)),
                RecoveryHint::new("Drag interactions must follow begin -> move -> commit/cancel"),
            ],
        }
    }

    fn is_retryable(&self) -> bool {
        // Every failure here is structural; retrying the same inputs cannot
        // succeed.
        false
    }
}

/// Convenient Result type alias for Headwater operations
pub type Result<T> = std::result::Result<T, HeadwaterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            HeadwaterError::RootNotFound("r".into()).error_code().code(),
            1001
        );
        assert_eq!(
            HeadwaterError::NodeNotFound("n".into()).error_code().code(),
            3001
        );
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(ErrorCode::RootNotFound.category(), "Graph");
        assert_eq!(ErrorCode::SerializationFailed.category(), "Serialization");
        assert_eq!(ErrorCode::InvalidState.category(), "Interaction");
    }

    #[test]
    fn test_recovery_hints_present() {
        let err = HeadwaterError::RootNotFound("orders".into());
        let hints = err.recovery_hints();
        assert!(!hints.is_empty());
        assert!(hints[0].summary.contains("orders"));
    }

    #[test]
    fn test_nothing_is_retryable() {
        assert!(!HeadwaterError::RootNotFound("r".into()).is_retryable());
        assert!(!HeadwaterError::InvalidState("x".into()).is_retryable());
    }

    #[test]
    fn test_display_formatting() {
        let err = HeadwaterError::RootNotFound("orders_mart".into());
        assert_eq!(err.to_string(), "root model 'orders_mart' not found in node set");

        let hint = RecoveryHint::new("do a thing").with_details("like this");
        let rendered = hint.to_string();
        assert!(rendered.contains("do a thing"));
        assert!(rendered.contains("like this"));
    }
}
