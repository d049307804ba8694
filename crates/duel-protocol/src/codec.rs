//! Line framing for the serial byte stream.
//!
//! The transport delivers raw bytes; this codec accumulates them and yields
//! whole newline-terminated lines. Both `\n` and `\r\n` terminators are
//! accepted because host serial stacks differ on what a "WriteLine" emits.

use bytes::BytesMut;

use crate::error::{ProtocolError, ProtocolResult};
use crate::message::ProtocolMessage;

/// Maximum accepted line length.
///
/// Protocol lines are short; anything past this is a misbehaving peer or a
/// desynchronized stream, and the buffered fragment is discarded.
pub const MAX_LINE_LENGTH: usize = 160;

/// Accumulates serial bytes and yields complete lines.
#[derive(Debug, Default)]
pub struct LineCodec {
    /// Buffer for accumulating incoming data.
    buffer: BytesMut,
}

impl LineCodec {
    /// Create a new line codec.
    pub fn new() -> Self {
        LineCodec {
            buffer: BytesMut::with_capacity(MAX_LINE_LENGTH * 2),
        }
    }

    /// Add received data to the buffer.
    ///
    /// If the unterminated tail grows past [`MAX_LINE_LENGTH`] it is dropped
    /// and reported as [`ProtocolError::LineTooLong`], so a corrupted stream
    /// cannot grow the buffer without bound. Framing resumes with the next
    /// push.
    pub fn push(&mut self, data: &[u8]) -> ProtocolResult<()> {
        self.buffer.extend_from_slice(data);

        if self.buffer.len() > MAX_LINE_LENGTH && !self.buffer.contains(&b'\n') {
            let actual = self.buffer.len();
            self.buffer.clear();
            return Err(ProtocolError::LineTooLong { max: MAX_LINE_LENGTH, actual });
        }
        Ok(())
    }

    /// Try to take a complete line from the buffer.
    ///
    /// Returns the line without its terminator, or `None` if no full line is
    /// buffered yet. Empty lines are skipped.
    pub fn decode_line(&mut self) -> Option<String> {
        loop {
            let end = self.buffer.iter().position(|&b| b == b'\n')?;

            let line_data = self.buffer.split_to(end + 1);
            let line = String::from_utf8_lossy(&line_data[..end])
                .trim_end_matches('\r')
                .to_string();

            if !line.is_empty() {
                return Some(line);
            }
        }
    }

    /// Decode the next complete line straight into a [`ProtocolMessage`].
    pub fn decode_message(&mut self) -> Option<ProtocolMessage> {
        self.decode_line().map(|line| ProtocolMessage::decode(&line))
    }

    /// Encode a message for transmission, appending the newline terminator.
    pub fn encode_line(msg: &ProtocolMessage) -> Vec<u8> {
        let line = msg.encode();
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
        buf
    }

    /// Get the number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_line() {
        let encoded = LineCodec::encode_line(&ProtocolMessage::Go);
        assert_eq!(encoded, b"rxn-duel:go\n");
    }

    #[test]
    fn test_decode_single_line() {
        let mut codec = LineCodec::new();
        codec.push(b"rxn-duel:ack\n").unwrap();
        assert_eq!(codec.decode_line(), Some("rxn-duel:ack".to_string()));
        assert!(codec.decode_line().is_none());
    }

    #[test]
    fn test_decode_crlf_line() {
        let mut codec = LineCodec::new();
        codec.push(b"rxn-duel:start\r\n").unwrap();
        assert_eq!(codec.decode_line(), Some("rxn-duel:start".to_string()));
    }

    #[test]
    fn test_partial_line() {
        let mut codec = LineCodec::new();
        codec.push(b"rxn-duel:win").unwrap();
        assert!(codec.decode_line().is_none());

        codec.push(b"ner-P1\n").unwrap();
        assert_eq!(codec.decode_line(), Some("rxn-duel:winner-P1".to_string()));
    }

    #[test]
    fn test_multiple_lines_in_order() {
        let mut codec = LineCodec::new();
        codec.push(b"rxn-duel:early-P2\nrxn-duel:winner-P1\n").unwrap();
        assert_eq!(codec.decode_message(), Some(ProtocolMessage::EarlyPress("P2".to_string())));
        assert_eq!(codec.decode_message(), Some(ProtocolMessage::Winner("P1".to_string())));
        assert!(codec.decode_message().is_none());
    }

    #[test]
    fn test_blank_lines_skipped() {
        let mut codec = LineCodec::new();
        codec.push(b"\r\n\nrxn-duel:go\n").unwrap();
        assert_eq!(codec.decode_line(), Some("rxn-duel:go".to_string()));
    }

    #[test]
    fn test_unterminated_overflow_discarded() {
        let mut codec = LineCodec::new();
        let err = codec.push(&[b'x'; MAX_LINE_LENGTH + 1]).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::LineTooLong { max: MAX_LINE_LENGTH, actual } if actual == MAX_LINE_LENGTH + 1
        ));
        assert_eq!(codec.buffered_len(), 0);

        // Stream recovers once framing resumes.
        codec.push(b"rxn-duel:ack\n").unwrap();
        assert_eq!(codec.decode_line(), Some("rxn-duel:ack".to_string()));
    }
}
