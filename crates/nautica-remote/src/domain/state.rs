//! Connection state and the traffic log.
//!
//! Both values are owned by the session actor and published to observers
//! as snapshots.  Observers never mutate them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of the session's connection.
///
/// ```text
/// Idle --connect()--> Connecting --(socket open)--> Connected
/// Connected --(socket closed)--> Disconnected
/// Disconnected --(local target, after delay)--> Connecting
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// No connection has been attempted yet.
    #[default]
    Idle,
    /// A transport is being opened.
    Connecting,
    /// The transport is open and the handshake has been sent.
    Connected,
    /// The last transport closed.
    Disconnected,
}

impl ConnectionState {
    /// Lower-case name as shown to the UI layer.
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of every text frame sent and received on the current connection.
///
/// Append-only while a connection lives; emptied in full when it closes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficLog {
    /// Frames received, exactly as they arrived.
    pub incoming: Vec<String>,
    /// Frames sent, exactly as they were written to the socket.
    pub outgoing: Vec<String>,
}

impl TrafficLog {
    pub fn record_incoming(&mut self, frame: impl Into<String>) {
        self.incoming.push(frame.into());
    }

    pub fn record_outgoing(&mut self, frame: impl Into<String>) {
        self.outgoing.push(frame.into());
    }

    pub fn clear(&mut self) {
        self.incoming.clear();
        self.outgoing.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.incoming.is_empty() && self.outgoing.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_idle() {
        assert_eq!(ConnectionState::default(), ConnectionState::Idle);
    }

    #[test]
    fn test_state_serializes_lowercase() {
        let json = serde_json::to_string(&ConnectionState::Disconnected).unwrap();
        assert_eq!(json, "\"disconnected\"");
        assert_eq!(ConnectionState::Connecting.to_string(), "connecting");
    }

    #[test]
    fn test_traffic_log_keeps_order_per_direction() {
        // Arrange
        let mut log = TrafficLog::default();

        // Act
        log.record_outgoing("a");
        log.record_incoming("x");
        log.record_outgoing("b");

        // Assert
        assert_eq!(log.outgoing, vec!["a", "b"]);
        assert_eq!(log.incoming, vec!["x"]);
    }

    #[test]
    fn test_clear_empties_both_directions() {
        let mut log = TrafficLog::default();
        log.record_outgoing("a");
        log.record_incoming("x");

        log.clear();

        assert!(log.is_empty());
    }

    #[test]
    fn test_traffic_log_serializes_for_ui() {
        let mut log = TrafficLog::default();
        log.record_incoming("{\"id\":\"nr.list\"}");

        let json = serde_json::to_value(&log).unwrap();

        assert_eq!(json["incoming"][0], "{\"id\":\"nr.list\"}");
        assert!(json["outgoing"].as_array().unwrap().is_empty());
    }
}
