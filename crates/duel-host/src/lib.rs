//! # duel-host
//!
//! Host-side coordinator for Reaction Duel.
//!
//! The coordinator owns the serial endpoint and the session bookkeeping, and
//! drives each round through its state machine:
//!
//! ```text
//! Disconnected → Connecting → HandshakePending → Ready
//!     → WaitingForStart → Armed → Live → Won → (reset to Ready)
//! ```
//!
//! Every wait is a blocking receive with a deadline on the link's channel, so
//! the host burns no CPU between messages and a stalled peer surfaces as
//! [`HostError::Stall`] instead of a hang. The fairness delay between `start`
//! and `go` is sampled by the host alone and never put on the wire, so
//! neither player can anticipate the live window.

mod config;
mod coordinator;
mod error;
mod session;

pub use config::*;
pub use coordinator::*;
pub use error::*;
pub use session::*;
