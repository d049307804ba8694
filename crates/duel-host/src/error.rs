//! Error types for the host coordinator.

use std::time::Duration;

use duel_link::LinkError;
use thiserror::Error;

use crate::coordinator::HostPhase;

/// Errors that abort a session or a round.
///
/// Protocol violations and unrecognized lines are deliberately absent: those
/// are recovered by logging and ignoring, never surfaced as errors.
#[derive(Debug, Error)]
pub enum HostError {
    /// The transport failed. Fatal to the session.
    #[error("transport failure: {0}")]
    Link(#[from] LinkError),

    /// An expected message never arrived within the bounded wait.
    #[error("no {waiting_for} received within {timeout:?}")]
    Stall {
        waiting_for: &'static str,
        timeout: Duration,
    },

    /// The operator interrupted the session.
    #[error("interrupted by operator")]
    Interrupted,

    /// A round was requested while the coordinator was not ready for one.
    #[error("coordinator not ready for a round (phase {phase:?})")]
    NotReady { phase: HostPhase },

    /// The session configuration is unusable.
    #[error("invalid session config: {0}")]
    InvalidConfig(String),
}

/// Result type alias for coordinator operations.
pub type HostResult<T> = Result<T, HostError>;
