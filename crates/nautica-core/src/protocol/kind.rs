//! Typed message identifiers.
//!
//! On the wire the message type is a free-form string in the `id` field.
//! The handful of identifiers the client itself understands get their own
//! variant; everything else is carried verbatim in [`MessageKind::Other`] so
//! applications can route their own message types without touching this
//! crate.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Wire string of the authentication handshake.
pub const AUTH_ID: &str = "auth";
/// Wire string of the server-list request and its reply.
pub const LIST_ID: &str = "nr.list";
/// Wire string of the reserved error notification.
pub const ERROR_ID: &str = "error";

/// The type of a packet, parsed from its `id` field.
///
/// Equality and hashing compare the wire string, so
/// `MessageKind::Other("auth".into())` and [`MessageKind::Auth`] are the same
/// key in a handler table.  Prefer `MessageKind::from(...)`, which always
/// picks the dedicated variant.
///
/// # Examples
///
/// ```rust
/// use nautica_core::MessageKind;
///
/// assert_eq!(MessageKind::from("error"), MessageKind::Error);
/// assert_eq!(MessageKind::from("lights.set").as_str(), "lights.set");
/// ```
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageKind {
    /// Client → device: authenticate with a pre-shared access key.
    Auth,
    /// Client → device request for the server list, and the device's reply.
    List,
    /// Device → client error notification.  Reserved; never routed to an
    /// ordinary handler.
    Error,
    /// Any application-defined identifier.
    Other(String),
}

impl MessageKind {
    /// Returns the identifier exactly as it appears on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            MessageKind::Auth => AUTH_ID,
            MessageKind::List => LIST_ID,
            MessageKind::Error => ERROR_ID,
            MessageKind::Other(id) => id,
        }
    }

    /// Returns `true` for the kinds the client handles internally.
    ///
    /// Compares the wire string, so an `Other` spelled `"error"` is
    /// reserved too.
    pub fn is_reserved(&self) -> bool {
        self.as_str() == ERROR_ID
    }
}

impl PartialEq for MessageKind {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Hash for MessageKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for MessageKind {
    fn from(id: &str) -> Self {
        match id {
            AUTH_ID => MessageKind::Auth,
            LIST_ID => MessageKind::List,
            ERROR_ID => MessageKind::Error,
            other => MessageKind::Other(other.to_string()),
        }
    }
}

impl From<String> for MessageKind {
    fn from(id: String) -> Self {
        match id.as_str() {
            AUTH_ID | LIST_ID | ERROR_ID => MessageKind::from(id.as_str()),
            _ => MessageKind::Other(id),
        }
    }
}

impl From<MessageKind> for String {
    fn from(kind: MessageKind) -> Self {
        match kind {
            MessageKind::Other(id) => id,
            known => known.as_str().to_string(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
