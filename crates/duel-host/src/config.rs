//! Session configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HostError, HostResult};

/// Default bounded wait for the handshake `ack`.
pub const DEFAULT_HANDSHAKE_TIMEOUT_SECS: u64 = 10;

/// Configuration for a duel session.
///
/// All fields have defaults so a YAML session file only needs to name what it
/// overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Display name for the player on the first button (`P1`).
    pub player_one_name: String,
    /// Display name for the player on the second button (`P2`).
    pub player_two_name: String,
    /// Shortest fairness delay, whole seconds.
    pub min_duel_secs: u64,
    /// Longest fairness delay, whole seconds (inclusive).
    pub max_duel_secs: u64,
    /// Bounded wait for the handshake `ack`, in seconds.
    ///
    /// `None` restores the reference behavior of waiting forever on a
    /// presumed-perfect physical connection.
    pub handshake_timeout_secs: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            player_one_name: duel_protocol::PLAYER_ONE.to_string(),
            player_two_name: duel_protocol::PLAYER_TWO.to_string(),
            min_duel_secs: 1,
            max_duel_secs: 10,
            handshake_timeout_secs: Some(DEFAULT_HANDSHAKE_TIMEOUT_SECS),
        }
    }
}

impl SessionConfig {
    /// Check the configuration for values the coordinator cannot run with.
    pub fn validate(&self) -> HostResult<()> {
        if self.min_duel_secs < 1 {
            return Err(HostError::InvalidConfig(
                "min_duel_secs must be at least 1".to_string(),
            ));
        }
        if self.min_duel_secs > self.max_duel_secs {
            return Err(HostError::InvalidConfig(format!(
                "min_duel_secs ({}) exceeds max_duel_secs ({})",
                self.min_duel_secs, self.max_duel_secs
            )));
        }
        Ok(())
    }

    /// The handshake timeout as a [`Duration`], if bounded.
    pub fn handshake_timeout(&self) -> Option<Duration> {
        self.handshake_timeout_secs.map(Duration::from_secs)
    }
}
