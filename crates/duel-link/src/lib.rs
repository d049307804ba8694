//! Line-oriented transport for the duel protocol.
//!
//! The protocol only needs a reliable byte stream with line framing, so the
//! link surface is deliberately small: send a whole line, receive a whole
//! line, FIFO order, one line per physical line, no duplication. The physical
//! serial port, a TCP socket, or an in-process pipe all fit behind it.
//!
//! Receiving blocks on a channel rather than spinning on a flag; a bounded
//! wait is expressed with a deadline so callers can surface stalls instead of
//! hanging forever.

use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use log::trace;
use thiserror::Error;

/// Capacity of an in-process line pipe.
///
/// Lines are consumed continuously on both sides; a small buffer only has to
/// absorb scheduling jitter.
const PIPE_CAPACITY: usize = 64;

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised by a transport endpoint.
///
/// Transport failures are fatal to the session: the caller must release the
/// link and report, never retry blindly.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The peer endpoint is gone.
    #[error("link closed by peer")]
    Closed,

    /// The underlying carrier failed (socket error, serial fault).
    #[error("link I/O failure: {0}")]
    Io(String),
}

/// Outcome of a bounded receive.
#[derive(Debug, Error)]
pub enum LinkRecvError {
    /// No line arrived before the deadline.
    #[error("timed out waiting for a line")]
    Timeout,

    /// The peer endpoint is gone.
    #[error("link closed by peer")]
    Closed,
}

// ============================================================================
// Link Trait
// ============================================================================

/// A reliable, in-order, line-framed duplex channel.
pub trait LineLink: Send {
    /// Send one line (terminator handled by the carrier).
    fn send_line(&self, line: &str) -> Result<(), LinkError>;

    /// Wait up to `timeout` for the next line.
    fn recv_line_timeout(&self, timeout: Duration) -> Result<String, LinkRecvError>;
}

// ============================================================================
// Channel-backed Endpoint
// ============================================================================

/// A link endpoint backed by a pair of line channels.
///
/// This is the concrete endpoint for both the in-process loopback and any
/// byte carrier whose framing is pumped into channels (the TCP bridge in the
/// runner does exactly that).
pub struct ChannelLink {
    tx: Sender<String>,
    rx: Receiver<String>,
}

impl ChannelLink {
    /// Build an endpoint from an outbound sender and inbound receiver.
    pub fn from_channels(tx: Sender<String>, rx: Receiver<String>) -> Self {
        ChannelLink { tx, rx }
    }

    /// The raw inbound receiver, for callers that multiplex with `select!`.
    pub fn receiver(&self) -> &Receiver<String> {
        &self.rx
    }
}

impl LineLink for ChannelLink {
    fn send_line(&self, line: &str) -> Result<(), LinkError> {
        trace!("link send: {line}");
        self.tx.send(line.to_string()).map_err(|_| LinkError::Closed)
    }

    fn recv_line_timeout(&self, timeout: Duration) -> Result<String, LinkRecvError> {
        match self.rx.recv_timeout(timeout) {
            Ok(line) => {
                trace!("link recv: {line}");
                Ok(line)
            }
            Err(RecvTimeoutError::Timeout) => Err(LinkRecvError::Timeout),
            Err(RecvTimeoutError::Disconnected) => Err(LinkRecvError::Closed),
        }
    }
}

/// The raw channel ends of one side of a loopback pipe.
///
/// The device service consumes this form directly so it can `select!` over
/// serial lines and button events in one loop.
pub struct PipeEnd {
    /// Lines this side sends to the peer.
    pub tx: Sender<String>,
    /// Lines arriving from the peer.
    pub rx: Receiver<String>,
}

impl PipeEnd {
    /// Wrap this end as a [`ChannelLink`].
    pub fn into_link(self) -> ChannelLink {
        ChannelLink::from_channels(self.tx, self.rx)
    }
}

/// Create a connected in-process loopback pair.
///
/// Whatever one end sends, the other receives, in order. A drop of either end
/// surfaces as [`LinkError::Closed`] / [`LinkRecvError::Closed`] on the peer.
pub fn loopback() -> (PipeEnd, PipeEnd) {
    let (a_tx, b_rx) = bounded(PIPE_CAPACITY);
    let (b_tx, a_rx) = bounded(PIPE_CAPACITY);
    (PipeEnd { tx: a_tx, rx: a_rx }, PipeEnd { tx: b_tx, rx: b_rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loopback_round_trip() {
        let (a, b) = loopback();
        let (a, b) = (a.into_link(), b.into_link());

        a.send_line("rxn-duel:handshake").unwrap();
        let line = b.recv_line_timeout(Duration::from_millis(100)).unwrap();
        assert_eq!(line, "rxn-duel:handshake");

        b.send_line("rxn-duel:ack").unwrap();
        let line = a.recv_line_timeout(Duration::from_millis(100)).unwrap();
        assert_eq!(line, "rxn-duel:ack");
    }

    #[test]
    fn test_loopback_preserves_order() {
        let (a, b) = loopback();
        let (a, b) = (a.into_link(), b.into_link());

        for i in 0..10 {
            a.send_line(&format!("line-{i}")).unwrap();
        }
        for i in 0..10 {
            let line = b.recv_line_timeout(Duration::from_millis(100)).unwrap();
            assert_eq!(line, format!("line-{i}"));
        }
    }

    #[test]
    fn test_recv_timeout() {
        let (a, _b) = loopback();
        let a = a.into_link();
        let err = a.recv_line_timeout(Duration::from_millis(10)).unwrap_err();
        assert!(matches!(err, LinkRecvError::Timeout));
    }

    #[test]
    fn test_peer_drop_closes_link() {
        let (a, b) = loopback();
        let a = a.into_link();
        drop(b);

        assert!(matches!(a.send_line("x"), Err(LinkError::Closed)));
        assert!(matches!(
            a.recv_line_timeout(Duration::from_millis(10)),
            Err(LinkRecvError::Closed)
        ));
    }
}
