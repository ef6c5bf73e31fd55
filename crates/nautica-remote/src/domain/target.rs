//! Connection targets and the two deployment variants.
//!
//! A [`Target`] says where to connect *and* which policy applies there:
//!
//! | Variant         | Path              | Handshake                      | Auto-reconnect |
//! |-----------------|-------------------|--------------------------------|----------------|
//! | `Local`         | `/nautica-remote` | `{"id":"nr.list"}`             | yes            |
//! | `Authenticated` | `/nautica:remote` | `{"id":"auth","accessKey":K}`  | no             |
//!
//! The local variant assumes a trusted LAN and keeps retrying forever; the
//! authenticated variant waits for the caller to connect again, so a wrong
//! access key is not retried in a loop.

use std::fmt;

use nautica_core::Packet;

/// Endpoint path of the unauthenticated (local network) variant.
pub const LOCAL_PATH: &str = "nautica-remote";

/// Endpoint path of the authenticated (remote) variant.
pub const AUTHENTICATED_PATH: &str = "nautica:remote";

/// Where a session connects, and under which policy.
#[derive(Clone, PartialEq, Eq)]
pub enum Target {
    /// Trusted local endpoint: no credentials, reconnects automatically.
    Local { host: String, port: u16 },
    /// Remote endpoint guarded by a pre-shared access key.
    Authenticated {
        host: String,
        port: u16,
        access_key: String,
    },
}

impl Target {
    pub fn local(host: impl Into<String>, port: u16) -> Self {
        Target::Local {
            host: host.into(),
            port,
        }
    }

    pub fn authenticated(host: impl Into<String>, port: u16, access_key: impl Into<String>) -> Self {
        Target::Authenticated {
            host: host.into(),
            port,
            access_key: access_key.into(),
        }
    }

    pub fn host(&self) -> &str {
        match self {
            Target::Local { host, .. } | Target::Authenticated { host, .. } => host,
        }
    }

    pub fn port(&self) -> u16 {
        match self {
            Target::Local { port, .. } | Target::Authenticated { port, .. } => *port,
        }
    }

    /// Fixed path suffix of this variant's endpoint.
    pub fn path(&self) -> &'static str {
        match self {
            Target::Local { .. } => LOCAL_PATH,
            Target::Authenticated { .. } => AUTHENTICATED_PATH,
        }
    }

    /// Full WebSocket URL, e.g. `ws://10.0.0.5:9000/nautica:remote`.
    pub fn url(&self) -> String {
        format!("ws://{}:{}/{}", self.host(), self.port(), self.path())
    }

    /// The first packet sent once the socket is open.
    pub fn handshake(&self) -> Packet {
        match self {
            Target::Local { .. } => Packet::list(),
            Target::Authenticated { access_key, .. } => Packet::auth(access_key),
        }
    }

    /// Whether a closed connection is reopened without the caller asking.
    pub fn reconnects(&self) -> bool {
        matches!(self, Target::Local { .. })
    }
}

// Hand-written so the access key never ends up in a log line.
impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Local { host, port } => f
                .debug_struct("Local")
                .field("host", host)
                .field("port", port)
                .finish(),
            Target::Authenticated { host, port, .. } => f
                .debug_struct("Authenticated")
                .field("host", host)
                .field("port", port)
                .field("access_key", &"<redacted>")
                .finish(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
