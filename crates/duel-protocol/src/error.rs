//! Error types for the duel protocol.

use thiserror::Error;

/// Errors that can occur when working with the duel protocol.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A line exceeded the maximum accepted length.
    #[error("line too long: max {max} bytes, got {actual}")]
    LineTooLong { max: usize, actual: usize },
}

/// Result type alias for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
