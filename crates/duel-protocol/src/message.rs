//! Protocol message vocabulary shared by the host and the device.

/// Prefix carried by every protocol line.
pub const MESSAGE_PREFIX: &str = "rxn-duel:";

/// Conventional player ids used by the two-button reference device.
pub const PLAYER_ONE: &str = "P1";
pub const PLAYER_TWO: &str = "P2";

/// A single protocol message.
///
/// The wire representation is the single source of truth between the two
/// nodes; no state is shared except through these lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolMessage {
    /// Host → Device: request session start.
    Handshake,
    /// Device → Host: handshake accepted.
    Ack,
    /// Host → Device: arm a new round.
    Ready,
    /// Device → Host: round armed, host may begin its fairness delay.
    Start,
    /// Host → Device: the live window begins.
    Go,
    /// Host → Device: drop the current round and return to idle.
    ///
    /// Optional extension; a device that predates it ignores the line.
    Abort,
    /// Device → Host: a press occurred before the live window.
    EarlyPress(String),
    /// Device → Host: a press occurred during the live window and won.
    Winner(String),
    /// Any line that does not match a recognized form. Dropped by both
    /// consumers.
    Unrecognized(String),
}

impl ProtocolMessage {
    /// Decode a single line (without its newline terminator).
    ///
    /// Never fails: anything that is not a recognized form comes back as
    /// [`Unrecognized`](ProtocolMessage::Unrecognized) carrying the raw text.
    pub fn decode(line: &str) -> ProtocolMessage {
        let line = line.trim();
        let suffix = match line.strip_prefix(MESSAGE_PREFIX) {
            Some(s) => s,
            None => return ProtocolMessage::Unrecognized(line.to_string()),
        };

        match suffix {
            "handshake" => ProtocolMessage::Handshake,
            "ack" => ProtocolMessage::Ack,
            "ready" => ProtocolMessage::Ready,
            "start" => ProtocolMessage::Start,
            "go" => ProtocolMessage::Go,
            "abort" => ProtocolMessage::Abort,
            _ => {
                if let Some(id) = suffix.strip_prefix("early-") {
                    if !id.is_empty() {
                        return ProtocolMessage::EarlyPress(id.to_string());
                    }
                }
                if let Some(id) = suffix.strip_prefix("winner-") {
                    if !id.is_empty() {
                        return ProtocolMessage::Winner(id.to_string());
                    }
                }
                ProtocolMessage::Unrecognized(line.to_string())
            }
        }
    }

    /// Encode this message as a protocol line (without newline terminator).
    ///
    /// [`Unrecognized`](ProtocolMessage::Unrecognized) encodes back to its raw
    /// text so a relay can pass unknown lines through unchanged.
    pub fn encode(&self) -> String {
        match self {
            ProtocolMessage::Handshake => format!("{MESSAGE_PREFIX}handshake"),
            ProtocolMessage::Ack => format!("{MESSAGE_PREFIX}ack"),
            ProtocolMessage::Ready => format!("{MESSAGE_PREFIX}ready"),
            ProtocolMessage::Start => format!("{MESSAGE_PREFIX}start"),
            ProtocolMessage::Go => format!("{MESSAGE_PREFIX}go"),
            ProtocolMessage::Abort => format!("{MESSAGE_PREFIX}abort"),
            ProtocolMessage::EarlyPress(id) => format!("{MESSAGE_PREFIX}early-{id}"),
            ProtocolMessage::Winner(id) => format!("{MESSAGE_PREFIX}winner-{id}"),
            ProtocolMessage::Unrecognized(raw) => raw.clone(),
        }
    }

    /// The player id carried by this message, if any.
    pub fn player_id(&self) -> Option<&str> {
        match self {
            ProtocolMessage::EarlyPress(id) | ProtocolMessage::Winner(id) => Some(id),
            _ => None,
        }
    }

    /// Whether this line failed to match any recognized form.
    pub fn is_unrecognized(&self) -> bool {
        matches!(self, ProtocolMessage::Unrecognized(_))
    }
}
