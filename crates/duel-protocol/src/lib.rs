//! Reaction Duel wire protocol.
//!
//! The host controller and the reflex-trigger device exchange newline-delimited
//! ASCII lines over a serial-equivalent byte stream. Every protocol line starts
//! with the `rxn-duel:` prefix; anything else on the wire is ignored.
//!
//! # Message catalogue
//!
//! - **Host → Device**: `handshake`, `ready`, `go`, `abort`
//! - **Device → Host**: `ack`, `start`, `early-<playerId>`, `winner-<playerId>`
//!
//! `playerId` is an opaque short token such as `P1`. Lines that carry the
//! prefix but an unknown suffix decode to [`ProtocolMessage::Unrecognized`]
//! and must be dropped by both sides; that is the forward-compatibility
//! policy, not an error.
//!
//! # Example
//!
//! ```
//! use duel_protocol::ProtocolMessage;
//!
//! let line = ProtocolMessage::Winner("P2".to_string()).encode();
//! assert_eq!(line, "rxn-duel:winner-P2");
//! assert_eq!(ProtocolMessage::decode(&line), ProtocolMessage::Winner("P2".to_string()));
//! ```

mod codec;
mod error;
mod message;

pub use codec::*;
pub use error::*;
pub use message::*;
