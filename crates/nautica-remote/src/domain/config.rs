//! Runtime configuration.
//!
//! [`RemoteConfig`] is what a user writes: which device to reach, with which
//! access key, and how patiently to retry.  It can be read from a TOML file;
//! every field is optional there, so an empty file is a valid config:
//!
//! ```toml
//! host = "10.0.0.5"
//! port = 9000
//! access_key = "K"          # omit for the local, unauthenticated variant
//! reconnect_delay_ms = 1000
//! ```
//!
//! [`SessionConfig`] is the part the session actor itself needs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::target::Target;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8300
}

fn default_reconnect_delay_ms() -> u64 {
    1000
}

fn default_event_capacity() -> usize {
    64
}

/// User-facing configuration of a remote connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Device host name or IP address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Device WebSocket port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Pre-shared access key.  Its presence selects the authenticated
    /// variant.
    #[serde(default)]
    pub access_key: Option<String>,

    /// Fixed delay before the local variant reconnects.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    /// How many session events a slow subscriber may lag behind.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            access_key: None,
            reconnect_delay_ms: default_reconnect_delay_ms(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl RemoteConfig {
    /// Reads a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if it is not valid TOML for this schema.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parses config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on invalid TOML.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Builds the connection target.  An empty access key counts as none.
    pub fn target(&self) -> Target {
        match self.access_key.as_deref() {
            Some(key) if !key.is_empty() => Target::authenticated(&self.host, self.port, key),
            _ => Target::local(&self.host, self.port),
        }
    }

    /// Extracts the settings the session actor uses.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            reconnect_delay: Duration::from_millis(self.reconnect_delay_ms),
            event_capacity: self.event_capacity.max(1),
        }
    }
}

/// Settings of the session actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Fixed delay between a close and the next automatic connect attempt.
    /// Never grows; there is no attempt limit.
    pub reconnect_delay: Duration,

    /// Capacity of the [`SessionEvent`](crate::domain::SessionEvent)
    /// broadcast channel.  Must be at least 1.
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        RemoteConfig::default().session_config()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
