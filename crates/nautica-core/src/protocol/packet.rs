//! Packets and the JSON text-frame codec.
//!
//! Wire format: one JSON object per WebSocket text frame.
//!
//! ```text
//! {"id":"<message kind>", <payload fields>...}
//! ```
//!
//! The `id` field is mandatory and must be a non-empty string.  No other
//! field is validated here; the payload is a contract between the sender
//! and whichever handler receives it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::protocol::kind::MessageKind;
use crate::protocol::servers::ServerSummary;

/// Errors that can occur while encoding, decoding or inspecting a packet.
#[derive(Debug, Error)]
pub enum PacketError {
    /// The frame is not valid JSON, is not an object, or has a non-string
    /// or missing `id`.
    #[error("malformed packet: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The `id` field is present but empty.
    #[error("packet has an empty `id` field")]
    EmptyId,

    /// A field required by a typed accessor is absent.
    #[error("packet `{kind}` has no `{field}` field")]
    MissingField {
        kind: MessageKind,
        field: &'static str,
    },
}

/// One JSON message exchanged over the control WebSocket.
///
/// `fields` holds every key except `id`.  When serialized, `id` is written
/// first, so a handshake packet looks exactly like
/// `{"id":"auth","accessKey":"K"}`.
///
/// # Examples
///
/// ```rust
/// use nautica_core::{encode_packet, Packet};
///
/// let packet = Packet::new("lights.set").with("level", 80);
/// assert_eq!(encode_packet(&packet).unwrap(), r#"{"id":"lights.set","level":80}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    /// The message type.
    pub id: MessageKind,

    /// Payload fields.  Never contains an `id` key: `with` drops it and
    /// deserialization routes it to `id`.
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Packet {
    /// Creates a packet of the given kind with no payload.
    pub fn new(id: impl Into<MessageKind>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    /// Adds (or replaces) a payload field and returns the packet.
    ///
    /// An `id` key is ignored: the message kind is fixed at construction.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key != "id" {
            self.fields.insert(key, value.into());
        }
        self
    }

    /// The authentication handshake: `{"id":"auth","accessKey":<key>}`.
    pub fn auth(access_key: &str) -> Self {
        Self::new(MessageKind::Auth).with("accessKey", access_key)
    }

    /// The server-list request sent as the local handshake: `{"id":"nr.list"}`.
    pub fn list() -> Self {
        Self::new(MessageKind::List)
    }

    /// An error notification carrying `content`.
    pub fn error(content: impl Into<Value>) -> Self {
        Self::new(MessageKind::Error).with("content", content)
    }

    /// All payload fields, without `id`.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Returns a payload field by name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Returns the `content` field, if present.
    pub fn content(&self) -> Option<&Value> {
        self.get("content")
    }

    /// Returns the payload of an error notification.
    ///
    /// Clients put the detail in `content`; the Nautica server's own error
    /// replies put it in `error`.  Whichever is present is returned, with
    /// `content` taking precedence, or `null` when neither is.
    pub fn error_content(&self) -> Value {
        self.content()
            .or_else(|| self.get("error"))
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// The server's `ok` status flag, when the packet carries one.
    pub fn is_ok(&self) -> Option<bool> {
        self.get("ok").and_then(Value::as_bool)
    }

    /// Decodes the `servers` list of an `nr.list` reply.
    ///
    /// # Errors
    ///
    /// Returns [`PacketError::MissingField`] when there is no `servers`
    /// field, and [`PacketError::Malformed`] when an entry does not have the
    /// expected shape.
    pub fn servers(&self) -> Result<Vec<ServerSummary>, PacketError> {
        let raw = self.get("servers").ok_or_else(|| PacketError::MissingField {
            kind: self.id.clone(),
            field: "servers",
        })?;
        Ok(Vec::<ServerSummary>::deserialize(raw)?)
    }
}

/// Serializes a packet into the text of one WebSocket frame.
///
/// # Errors
///
/// Returns [`PacketError::Malformed`] if serialization fails.
pub fn encode_packet(packet: &Packet) -> Result<String, PacketError> {
    Ok(serde_json::to_string(packet)?)
}

/// Parses the text of one WebSocket frame into a [`Packet`].
///
/// # Errors
///
/// Returns [`PacketError::Malformed`] for non-JSON input, JSON that is not an
/// object, and objects without a string `id`; [`PacketError::EmptyId`] for
/// `"id":""`.
pub fn decode_packet(text: &str) -> Result<Packet, PacketError> {
    let packet: Packet = serde_json::from_str(text)?;
    if packet.id.as_str().is_empty() {
        return Err(PacketError::EmptyId);
    }
    Ok(packet)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
