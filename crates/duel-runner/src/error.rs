//! Runner error type.

use duel_device::DeviceError;
use duel_host::HostError;
use thiserror::Error;

/// Errors surfaced by the `rxnduel` binary.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Console or socket I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The YAML session file could not be parsed.
    #[error("session config error: {0}")]
    Config(#[from] serde_yaml::Error),

    /// The host coordinator failed.
    #[error(transparent)]
    Host(#[from] HostError),

    /// The device trigger could not be built.
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// A simulated player was configured with unusable parameters.
    #[error("invalid simulated player: {0}")]
    SimPlayer(String),

    /// The Ctrl-C handler could not be installed.
    #[error("signal handler error: {0}")]
    Signal(#[from] ctrlc::Error),
}
