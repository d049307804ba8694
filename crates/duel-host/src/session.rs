//! Per-round session bookkeeping.

use std::time::Instant;

/// Host-owned state for a duel session.
///
/// Mutated only by the coordinator in response to protocol events. The
/// invariants are: `winner_id` is set if and only if `is_duel_won`, and
/// `duel_started_at` is only meaningful while `is_duel_running`.
#[derive(Debug, Clone)]
pub struct DuelSession {
    /// Display name for `P1`.
    pub player_one_name: String,
    /// Display name for `P2`.
    pub player_two_name: String,
    /// Fairness delay for the current round, seconds. Regenerated per round.
    pub duel_length_seconds: f64,
    /// When the current round was armed.
    pub duel_started_at: Option<Instant>,
    /// Winner of the current round, if resolved.
    pub winner_id: Option<String>,
    /// A round is in progress.
    pub is_duel_running: bool,
    /// The current round has been won.
    pub is_duel_won: bool,
}

impl DuelSession {
    /// Create a fresh session for the named players.
    pub fn new(player_one_name: String, player_two_name: String) -> Self {
        DuelSession {
            player_one_name,
            player_two_name,
            duel_length_seconds: 0.0,
            duel_started_at: None,
            winner_id: None,
            is_duel_running: false,
            is_duel_won: false,
        }
    }

    /// Arm a round with the sampled fairness delay.
    pub fn arm(&mut self, duel_length_seconds: f64) {
        self.duel_length_seconds = duel_length_seconds;
        self.duel_started_at = Some(Instant::now());
        self.winner_id = None;
        self.is_duel_running = true;
        self.is_duel_won = false;
    }

    /// Record the winner, resolving the round.
    pub fn record_winner(&mut self, winner_id: String) {
        self.winner_id = Some(winner_id);
        self.is_duel_won = true;
        self.is_duel_running = false;
    }

    /// Reset the round fields to defaults, keeping the player names.
    pub fn reset(&mut self) {
        self.duel_length_seconds = 0.0;
        self.duel_started_at = None;
        self.winner_id = None;
        self.is_duel_running = false;
        self.is_duel_won = false;
    }

    /// Map a wire player id to the configured display name.
    ///
    /// Unknown ids come back unchanged; the codec treats ids as opaque and so
    /// does the announcement.
    pub fn player_name_for<'a>(&'a self, player_id: &'a str) -> &'a str {
        match player_id {
            duel_protocol::PLAYER_ONE => &self.player_one_name,
            duel_protocol::PLAYER_TWO => &self.player_two_name,
            other => other,
        }
    }
}
