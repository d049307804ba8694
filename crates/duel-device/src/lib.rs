//! # duel-device
//!
//! Reflex-trigger logic of the Reaction Duel device, ported off the embedded
//! target so it can run and be tested anywhere a line transport exists.
//!
//! The device is a cooperative single-threaded machine: a main loop that only
//! renders display state, plus interrupt-style handlers for the two buttons
//! and for received serial lines. Handlers run to completion before the loop
//! resumes, so every state mutation inside [`ReflexTrigger::handle_event`] is
//! atomic with respect to everything else. The host embedding (thread, test,
//! or firmware main) feeds events in and drains emitted protocol lines out;
//! no synchronization primitive is needed beyond that queue contract.
//!
//! ## Usage
//!
//! ```
//! use duel_device::{DeviceConfig, DeviceEvent, PlayerButton, ReflexTrigger};
//!
//! let mut trigger = ReflexTrigger::new(DeviceConfig::default()).unwrap();
//! trigger.handle_event(DeviceEvent::SerialLine("rxn-duel:handshake".to_string()));
//! assert_eq!(trigger.drain_outbox(), vec!["rxn-duel:ack".to_string()]);
//! ```

mod display;
mod trigger;

pub use display::*;
pub use trigger::*;
