//! Observable session events.
//!
//! None of these is fatal.  Each failure the session sees degrades to a log
//! line plus one of these events, so a UI can surface it without the
//! session ever stopping.

use nautica_core::MessageKind;
use serde_json::Value;

/// Something that happened on the session, published to every subscriber.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The transport opened and the handshake was sent.
    Connected { url: String },
    /// The transport closed.  `reconnecting` is `true` when a reconnect has
    /// been scheduled.
    Disconnected { reconnecting: bool },
    /// The device sent an `error` packet; carries its content.
    ProtocolError(Value),
    /// A well-formed packet arrived whose kind has no handler.
    Unroutable(MessageKind),
    /// A text frame could not be decoded into a packet.
    MalformedFrame(String),
    /// The socket reported a low-level failure.
    TransportError(String),
    /// A packet was passed to `send` while no connection was open.
    SendDropped(MessageKind),
}
