//! Entries of the device's server list.
//!
//! The device answers an `nr.list` request with every server it knows
//! about.  Its stored records also hold an access key, which the device
//! strips before replying, so a summary never carries credentials.

use serde::{Deserialize, Serialize};

/// One server advertised in an `nr.list` reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSummary {
    /// Human-readable server label (at most 128 characters on the device).
    pub label: String,
    /// Node label the server belongs to (at most 40 characters).
    pub node: String,
    /// Address the server's own control socket listens on.
    pub ip: String,
    /// Port of the server's control socket.
    pub port: u16,
}

impl ServerSummary {
    /// Returns `host:port` for this server.
    pub fn address(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}
