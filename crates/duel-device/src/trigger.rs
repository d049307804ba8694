//! The reflex-trigger state machine.

use duel_protocol::ProtocolMessage;
use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::display::DisplayIndicator;

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for a reflex-trigger device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Player id reported for the first button.
    pub player_one_id: String,
    /// Player id reported for the second button.
    pub player_two_id: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            player_one_id: duel_protocol::PLAYER_ONE.to_string(),
            player_two_id: duel_protocol::PLAYER_TWO.to_string(),
        }
    }
}

/// Errors raised when building a trigger.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// A configured player id is empty.
    #[error("player id for {button:?} is empty")]
    EmptyPlayerId { button: PlayerButton },
}

// ============================================================================
// Events
// ============================================================================

/// The two physical button inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerButton {
    /// First player's button.
    A,
    /// Second player's button.
    B,
}

/// An event delivered to the trigger.
///
/// Each event corresponds to one interrupt-style handler invocation on the
/// embedded target and runs to completion before the next one.
#[derive(Debug, Clone)]
pub enum DeviceEvent {
    /// A button was pressed.
    ButtonPressed(PlayerButton),
    /// A complete line arrived on the serial endpoint.
    SerialLine(String),
}

// ============================================================================
// Trigger Phases
// ============================================================================

/// Where the trigger is in its round cycle.
///
/// The resolved state after a win folds straight back into `Idle`; the next
/// `ready` starts the cycle over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerPhase {
    /// No round requested.
    Idle,
    /// A round was requested; the next loop iteration arms it.
    AwaitingStart,
    /// Armed, waiting for the host's `go`. The device has no internal timer.
    Armed,
    /// Live window open; the first press wins.
    Live,
}

// ============================================================================
// Reflex Trigger
// ============================================================================

/// The device-side duel state machine.
///
/// Drive it with [`handle_event`](ReflexTrigger::handle_event) for button and
/// serial input and [`tick`](ReflexTrigger::tick) for main-loop iterations,
/// and drain emitted protocol lines with
/// [`drain_outbox`](ReflexTrigger::drain_outbox).
pub struct ReflexTrigger {
    config: DeviceConfig,
    phase: TriggerPhase,
    display: DisplayIndicator,
    last_winner: Option<String>,
    outbox: Vec<String>,
}

impl ReflexTrigger {
    /// Create a new trigger showing its start-up banner.
    pub fn new(config: DeviceConfig) -> Result<Self, DeviceError> {
        if config.player_one_id.is_empty() {
            return Err(DeviceError::EmptyPlayerId { button: PlayerButton::A });
        }
        if config.player_two_id.is_empty() {
            return Err(DeviceError::EmptyPlayerId { button: PlayerButton::B });
        }
        Ok(ReflexTrigger {
            config,
            phase: TriggerPhase::Idle,
            display: DisplayIndicator::Banner,
            last_winner: None,
            outbox: Vec::new(),
        })
    }

    /// Current round phase.
    pub fn phase(&self) -> TriggerPhase {
        self.phase
    }

    /// What the display should currently show.
    pub fn display(&self) -> DisplayIndicator {
        self.display
    }

    /// A round has been requested and not yet resolved or aborted.
    pub fn is_game_active(&self) -> bool {
        self.phase != TriggerPhase::Idle
    }

    /// A duel is armed or live.
    pub fn is_duel_running(&self) -> bool {
        matches!(self.phase, TriggerPhase::Armed | TriggerPhase::Live)
    }

    /// The live window is open.
    pub fn is_duel_live(&self) -> bool {
        self.phase == TriggerPhase::Live
    }

    /// Winner of the most recently resolved duel, if any.
    pub fn last_winner(&self) -> Option<&str> {
        self.last_winner.as_deref()
    }

    /// Take all protocol lines emitted since the last drain, in order.
    pub fn drain_outbox(&mut self) -> Vec<String> {
        std::mem::take(&mut self.outbox)
    }

    /// Run one main-loop iteration.
    ///
    /// The loop only renders display state and performs the arm step; all
    /// other transitions happen in [`handle_event`](Self::handle_event).
    pub fn tick(&mut self) {
        match self.phase {
            TriggerPhase::Idle => {
                self.display = DisplayIndicator::Awaiting;
            }
            TriggerPhase::AwaitingStart => {
                self.display = DisplayIndicator::GetReady;
                self.emit(ProtocolMessage::Start);
                self.phase = TriggerPhase::Armed;
                debug!("round armed, awaiting go");
            }
            TriggerPhase::Armed => {
                self.display = DisplayIndicator::Armed;
            }
            TriggerPhase::Live => {
                self.display = DisplayIndicator::Live;
            }
        }
    }

    /// Handle one button or serial event.
    ///
    /// Runs to completion; on the embedded target this is the body of the
    /// corresponding interrupt handler and is therefore atomic with respect
    /// to the main loop.
    pub fn handle_event(&mut self, event: DeviceEvent) {
        match event {
            DeviceEvent::ButtonPressed(button) => self.handle_button(button),
            DeviceEvent::SerialLine(line) => self.handle_serial_line(&line),
        }
    }

    fn handle_button(&mut self, button: PlayerButton) {
        let player_id = match button {
            PlayerButton::A => self.config.player_one_id.clone(),
            PlayerButton::B => self.config.player_two_id.clone(),
        };

        match self.phase {
            TriggerPhase::Live => {
                // First press during the live window wins; clearing the live
                // phase here makes every later press in the window a no-op.
                info!("{player_id} wins the duel");
                self.last_winner = Some(player_id.clone());
                self.emit(ProtocolMessage::Winner(player_id));
                self.phase = TriggerPhase::Idle;
            }
            TriggerPhase::Armed => {
                // Informational only; the duel keeps running.
                debug!("{player_id} pressed before the live window");
                self.emit(ProtocolMessage::EarlyPress(player_id));
            }
            TriggerPhase::Idle | TriggerPhase::AwaitingStart => {
                trace!("button {button:?} pressed while no duel is running");
            }
        }
    }

    fn handle_serial_line(&mut self, line: &str) {
        match ProtocolMessage::decode(line) {
            ProtocolMessage::Handshake => {
                debug!("handshake received");
                self.emit(ProtocolMessage::Ack);
            }
            ProtocolMessage::Ready => {
                if self.phase == TriggerPhase::Idle {
                    debug!("round requested");
                    self.phase = TriggerPhase::AwaitingStart;
                } else {
                    warn!("ready received mid-round (phase {:?}), ignoring", self.phase);
                }
            }
            ProtocolMessage::Go => {
                if self.phase == TriggerPhase::Armed {
                    debug!("live window open");
                    self.phase = TriggerPhase::Live;
                    self.display = DisplayIndicator::Live;
                } else {
                    warn!("go received while not armed (phase {:?}), ignoring", self.phase);
                }
            }
            ProtocolMessage::Abort => {
                if self.phase != TriggerPhase::Idle {
                    info!("round aborted by host");
                    self.phase = TriggerPhase::Idle;
                }
            }
            ProtocolMessage::Unrecognized(raw) => {
                // Unknown lines are dropped so newer hosts keep working.
                trace!("ignoring unrecognized line: {raw}");
            }
            other => {
                warn!("host-bound message {other:?} received by device, ignoring");
            }
        }
    }

    fn emit(&mut self, msg: ProtocolMessage) {
        self.outbox.push(msg.encode());
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn trigger() -> ReflexTrigger {
        ReflexTrigger::new(DeviceConfig::default()).unwrap()
    }

    fn armed_trigger() -> ReflexTrigger {
        let mut t = trigger();
        t.handle_event(DeviceEvent::SerialLine("rxn-duel:ready".to_string()));
        t.tick();
        t.drain_outbox();
        t
    }

    #[test]
    fn test_empty_player_id_rejected() {
        let config = DeviceConfig { player_one_id: String::new(), ..Default::default() };
        assert!(ReflexTrigger::new(config).is_err());
    }

    #[test]
    fn test_banner_then_awaiting() {
        let mut t = trigger();
        assert_eq!(t.display(), DisplayIndicator::Banner);
        t.tick();
        assert_eq!(t.display(), DisplayIndicator::Awaiting);
    }

    #[test]
    fn test_handshake_acknowledged() {
        let mut t = trigger();
        t.handle_event(DeviceEvent::SerialLine("rxn-duel:handshake".to_string()));
        assert_eq!(t.drain_outbox(), vec!["rxn-duel:ack".to_string()]);
        assert_eq!(t.phase(), TriggerPhase::Idle);
    }

    #[test]
    fn test_ready_arms_and_emits_start() {
        let mut t = trigger();
        t.handle_event(DeviceEvent::SerialLine("rxn-duel:ready".to_string()));
        assert_eq!(t.phase(), TriggerPhase::AwaitingStart);
        assert!(t.is_game_active());
        assert!(!t.is_duel_running());

        t.tick();
        assert_eq!(t.phase(), TriggerPhase::Armed);
        assert!(t.is_duel_running());
        assert!(!t.is_duel_live());
        assert_eq!(t.drain_outbox(), vec!["rxn-duel:start".to_string()]);
    }

    #[test]
    fn test_go_opens_live_window() {
        let mut t = armed_trigger();
        t.handle_event(DeviceEvent::SerialLine("rxn-duel:go".to_string()));
        assert!(t.is_duel_live());
        assert_eq!(t.display(), DisplayIndicator::Live);
        assert!(t.drain_outbox().is_empty());
    }

    #[test]
    fn test_press_while_idle_is_noop() {
        let mut t = trigger();
        t.tick();
        t.handle_event(DeviceEvent::ButtonPressed(PlayerButton::A));
        t.handle_event(DeviceEvent::ButtonPressed(PlayerButton::B));
        assert!(t.drain_outbox().is_empty());
        assert!(t.last_winner().is_none());
    }

    #[test]
    fn test_press_before_arm_is_noop() {
        let mut t = trigger();
        t.handle_event(DeviceEvent::SerialLine("rxn-duel:ready".to_string()));
        // AwaitingStart: the duel is not running yet.
        t.handle_event(DeviceEvent::ButtonPressed(PlayerButton::A));
        assert!(t.drain_outbox().is_empty());
    }

    #[test]
    fn test_early_press_is_informational() {
        let mut t = armed_trigger();
        t.handle_event(DeviceEvent::ButtonPressed(PlayerButton::A));
        assert_eq!(t.drain_outbox(), vec!["rxn-duel:early-P1".to_string()]);
        // The duel keeps running and can still go live.
        assert_eq!(t.phase(), TriggerPhase::Armed);
        t.handle_event(DeviceEvent::SerialLine("rxn-duel:go".to_string()));
        assert!(t.is_duel_live());
    }

    #[test]
    fn test_first_press_wins() {
        let mut t = armed_trigger();
        t.handle_event(DeviceEvent::SerialLine("rxn-duel:go".to_string()));
        t.handle_event(DeviceEvent::ButtonPressed(PlayerButton::B));
        assert_eq!(t.drain_outbox(), vec!["rxn-duel:winner-P2".to_string()]);
        assert_eq!(t.last_winner(), Some("P2"));
        assert_eq!(t.phase(), TriggerPhase::Idle);
    }

    #[test]
    fn test_second_press_in_window_is_noop() {
        let mut t = armed_trigger();
        t.handle_event(DeviceEvent::SerialLine("rxn-duel:go".to_string()));
        t.handle_event(DeviceEvent::ButtonPressed(PlayerButton::A));
        t.handle_event(DeviceEvent::ButtonPressed(PlayerButton::B));
        // Exactly one winner line, attributed to the first press.
        assert_eq!(t.drain_outbox(), vec!["rxn-duel:winner-P1".to_string()]);
        assert_eq!(t.last_winner(), Some("P1"));
    }

    #[test]
    fn test_go_while_not_armed_ignored() {
        let mut t = trigger();
        t.handle_event(DeviceEvent::SerialLine("rxn-duel:go".to_string()));
        assert!(!t.is_duel_live());
        assert!(t.drain_outbox().is_empty());
    }

    #[test]
    fn test_unrecognized_line_ignored() {
        let mut t = armed_trigger();
        t.handle_event(DeviceEvent::SerialLine("rxn-duel:telemetry-7".to_string()));
        t.handle_event(DeviceEvent::SerialLine("noise".to_string()));
        assert_eq!(t.phase(), TriggerPhase::Armed);
        assert!(t.drain_outbox().is_empty());
    }

    #[test]
    fn test_abort_returns_to_idle() {
        let mut t = armed_trigger();
        t.handle_event(DeviceEvent::SerialLine("rxn-duel:abort".to_string()));
        assert_eq!(t.phase(), TriggerPhase::Idle);
        t.tick();
        assert_eq!(t.display(), DisplayIndicator::Awaiting);
    }

    #[test]
    fn test_full_round_cycle_repeats() {
        let mut t = trigger();
        for round in 0..2 {
            t.handle_event(DeviceEvent::SerialLine("rxn-duel:ready".to_string()));
            t.tick();
            assert_eq!(t.drain_outbox(), vec!["rxn-duel:start".to_string()], "round {round}");
            t.handle_event(DeviceEvent::SerialLine("rxn-duel:go".to_string()));
            t.handle_event(DeviceEvent::ButtonPressed(PlayerButton::A));
            assert_eq!(t.drain_outbox(), vec!["rxn-duel:winner-P1".to_string()]);
            t.tick();
            assert_eq!(t.display(), DisplayIndicator::Awaiting);
        }
    }
}
