//! Runner library for the `rxnduel` binary.
//!
//! Wires the host coordinator and the reflex trigger to real surfaces: a
//! terminal console, a TCP bridge standing in for the physical serial port,
//! and simulated players for the self-contained demo mode.

pub mod cli;
pub mod console;
pub mod device_service;
pub mod error;
pub mod sim_players;
pub mod tcp_bridge;

pub use error::RunnerError;
