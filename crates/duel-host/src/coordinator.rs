//! The duel coordinator state machine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use duel_link::{LineLink, LinkError, LinkRecvError};
use duel_protocol::ProtocolMessage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, trace, warn};

use crate::config::SessionConfig;
use crate::error::{HostError, HostResult};
use crate::session::DuelSession;

/// How often blocking waits wake up to check for operator cancellation.
const CANCEL_POLL: Duration = Duration::from_millis(100);

// ============================================================================
// Phases
// ============================================================================

/// Where the coordinator is in the session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPhase {
    /// No transport attached yet.
    Disconnected,
    /// Transport open, handshake not yet sent.
    Connecting,
    /// Handshake sent, awaiting `ack`.
    HandshakePending,
    /// Session established, no round in flight.
    Ready,
    /// `ready` sent, awaiting `start`.
    WaitingForStart,
    /// Fairness delay running; `go` not yet sent.
    Armed,
    /// `go` sent, awaiting `winner-*`.
    Live,
    /// Round resolved; reset before the next one.
    Won,
}

/// Outcome of a resolved round.
#[derive(Debug, Clone)]
pub struct DuelOutcome {
    /// Wire id of the winner (e.g. `P2`).
    pub winner_id: String,
    /// Configured display name for the winner.
    pub winner_name: String,
    /// Reaction time relative to `go`, seconds. Never negative.
    pub reaction_seconds: f64,
    /// The fairness delay this round used, seconds.
    pub duel_length_seconds: f64,
}

// ============================================================================
// Coordinator
// ============================================================================

/// Host-side duel coordinator.
///
/// Owns the link and the [`DuelSession`]; one instance runs one session, one
/// round at a time.
pub struct DuelCoordinator<L: LineLink> {
    link: L,
    config: SessionConfig,
    session: DuelSession,
    phase: HostPhase,
    rng: StdRng,
    cancel: Arc<AtomicBool>,
    early_handler: Option<Box<dyn FnMut(&str) + Send>>,
}

impl<L: LineLink> DuelCoordinator<L> {
    /// Create a coordinator over an open link.
    pub fn new(link: L, config: SessionConfig) -> HostResult<Self> {
        Self::with_rng(link, config, StdRng::from_entropy())
    }

    /// Create a coordinator with an explicit RNG (deterministic tests).
    pub fn with_rng(link: L, config: SessionConfig, rng: StdRng) -> HostResult<Self> {
        config.validate()?;
        let session = DuelSession::new(
            config.player_one_name.clone(),
            config.player_two_name.clone(),
        );
        Ok(DuelCoordinator {
            link,
            config,
            session,
            phase: HostPhase::Disconnected,
            rng,
            cancel: Arc::new(AtomicBool::new(false)),
            early_handler: None,
        })
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> HostPhase {
        self.phase
    }

    /// The session bookkeeping.
    pub fn session(&self) -> &DuelSession {
        &self.session
    }

    /// Flag that interrupts any blocking wait when set (wire it to Ctrl-C).
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Install a handler invoked for every `early-<id>` the device reports.
    pub fn on_early_press(&mut self, handler: impl FnMut(&str) + Send + 'static) {
        self.early_handler = Some(Box::new(handler));
    }

    // ========================================================================
    // Session lifecycle
    // ========================================================================

    /// Establish the session: send `handshake`, wait for `ack`.
    ///
    /// The wait is bounded by the configured handshake timeout; a silent
    /// device surfaces as [`HostError::Stall`].
    pub fn connect(&mut self) -> HostResult<()> {
        if self.phase != HostPhase::Disconnected {
            return Err(HostError::NotReady { phase: self.phase });
        }
        self.phase = HostPhase::Connecting;

        debug!("initiating handshake");
        self.send(&ProtocolMessage::Handshake)?;
        self.phase = HostPhase::HandshakePending;

        self.await_ack()?;
        info!("handshake successful");
        self.phase = HostPhase::Ready;
        Ok(())
    }

    /// Run one full round: arm, fairness delay, live window, resolution.
    pub fn play_round(&mut self) -> HostResult<DuelOutcome> {
        if self.phase != HostPhase::Ready {
            return Err(HostError::NotReady { phase: self.phase });
        }

        debug!("requesting round");
        self.send(&ProtocolMessage::Ready)?;
        self.phase = HostPhase::WaitingForStart;

        self.await_start()?;
        info!("duel started");

        let length = self.sample_duel_length();
        self.session.arm(length);
        self.phase = HostPhase::Armed;
        debug!(duel_length_seconds = length, "fairness delay armed");

        self.run_fairness_delay()?;
        self.send(&ProtocolMessage::Go)?;
        self.phase = HostPhase::Live;
        debug!("live window open");

        let outcome = self.await_winner()?;
        self.phase = HostPhase::Won;
        info!(
            winner = %outcome.winner_name,
            reaction_seconds = outcome.reaction_seconds,
            "duel won"
        );
        Ok(outcome)
    }

    /// Reset the session for the next round (`Won → Ready`).
    pub fn reset_round(&mut self) {
        self.session.reset();
        if self.phase == HostPhase::Won {
            self.phase = HostPhase::Ready;
        }
    }

    /// Tear the session down.
    ///
    /// Sends the optional `abort` so a mid-round device returns to idle; the
    /// send is best-effort because the link may already be gone.
    pub fn shutdown(&mut self) {
        if self.phase != HostPhase::Disconnected {
            if let Err(e) = self.send(&ProtocolMessage::Abort) {
                debug!("abort not delivered during shutdown: {e}");
            }
            self.phase = HostPhase::Disconnected;
        }
        self.session.reset();
    }

    /// Release the link.
    pub fn into_link(self) -> L {
        self.link
    }

    // ========================================================================
    // Waits
    // ========================================================================

    fn send(&self, msg: &ProtocolMessage) -> Result<(), LinkError> {
        self.link.send_line(&msg.encode())
    }

    /// Receive for at most one cancellation slice.
    ///
    /// `Ok(None)` means the slice elapsed without a line.
    fn recv_slice(&mut self, slice: Duration) -> HostResult<Option<ProtocolMessage>> {
        if self.cancel.load(Ordering::Relaxed) {
            return Err(HostError::Interrupted);
        }
        match self.link.recv_line_timeout(slice) {
            Ok(line) => Ok(Some(ProtocolMessage::decode(&line))),
            Err(LinkRecvError::Timeout) => Ok(None),
            Err(LinkRecvError::Closed) => Err(HostError::Link(LinkError::Closed)),
        }
    }

    /// Log-and-ignore policy for lines that are not the one being awaited.
    fn ignore(&mut self, msg: ProtocolMessage, waiting_for: &'static str) {
        match msg {
            ProtocolMessage::EarlyPress(id) => {
                debug!("early press by {id}");
                if let Some(handler) = self.early_handler.as_mut() {
                    handler(&id);
                }
            }
            ProtocolMessage::Unrecognized(raw) => {
                trace!("ignoring unrecognized line while awaiting {waiting_for}: {raw}");
            }
            other => {
                warn!("protocol violation: {other:?} while awaiting {waiting_for}, ignoring");
            }
        }
    }

    fn await_ack(&mut self) -> HostResult<()> {
        let timeout = self.config.handshake_timeout();
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            let slice = match deadline {
                Some(d) => {
                    let remaining = d.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Err(HostError::Stall {
                            waiting_for: "ack",
                            timeout: timeout.unwrap_or_default(),
                        });
                    }
                    remaining.min(CANCEL_POLL)
                }
                None => CANCEL_POLL,
            };
            match self.recv_slice(slice)? {
                Some(ProtocolMessage::Ack) => return Ok(()),
                Some(other) => self.ignore(other, "ack"),
                None => {}
            }
        }
    }

    fn await_start(&mut self) -> HostResult<()> {
        loop {
            match self.recv_slice(CANCEL_POLL)? {
                Some(ProtocolMessage::Start) => return Ok(()),
                Some(other) => self.ignore(other, "start"),
                None => {}
            }
        }
    }

    /// Wait out the fairness delay, still servicing inbound lines.
    ///
    /// Early presses arriving here are reported but never move the state; the
    /// `go` moment depends on nothing the device sends.
    fn run_fairness_delay(&mut self) -> HostResult<()> {
        let started = self
            .session
            .duel_started_at
            .unwrap_or_else(Instant::now);
        let go_at = started + Duration::from_secs_f64(self.session.duel_length_seconds);
        loop {
            let remaining = go_at.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(());
            }
            match self.recv_slice(remaining.min(CANCEL_POLL))? {
                Some(other) => self.ignore(other, "go deadline"),
                None => {}
            }
        }
    }

    fn await_winner(&mut self) -> HostResult<DuelOutcome> {
        loop {
            match self.recv_slice(CANCEL_POLL)? {
                Some(ProtocolMessage::Winner(id)) => {
                    let elapsed = self
                        .session
                        .duel_started_at
                        .map(|t| t.elapsed().as_secs_f64())
                        .unwrap_or_default();
                    let reaction = elapsed - self.session.duel_length_seconds;
                    if reaction < 0.0 {
                        // A winner cannot predate the live window; this is a
                        // malformed or out-of-order line.
                        warn!("protocol violation: winner {id} with negative reaction time, ignoring");
                        continue;
                    }
                    self.session.record_winner(id.clone());
                    let winner_name = self.session.player_name_for(&id).to_string();
                    return Ok(DuelOutcome {
                        winner_id: id,
                        winner_name,
                        reaction_seconds: reaction,
                        duel_length_seconds: self.session.duel_length_seconds,
                    });
                }
                Some(other) => self.ignore(other, "winner"),
                None => {}
            }
        }
    }

    /// Sample the fairness delay: whole seconds, uniform over the configured
    /// closed range.
    fn sample_duel_length(&mut self) -> f64 {
        self.rng
            .gen_range(self.config.min_duel_secs..=self.config.max_duel_secs) as f64
    }
}

// ============================================================================
// Tests
// ============================================================================
