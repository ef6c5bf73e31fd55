//! Domain layer for nautica-remote.
//!
//! Pure types that describe a session without doing any I/O: what state the
//! connection is in, what traffic it has seen, where it connects to, and how
//! it is configured.
//!
//! # What does NOT belong here?
//!
//! - Any `tokio`, `TcpStream`, or `WebSocket` types
//! - Handler invocation (that is the application layer)

pub mod config;
pub mod events;
pub mod state;
pub mod target;

pub use config::{ConfigError, RemoteConfig, SessionConfig};
pub use events::SessionEvent;
pub use state::{ConnectionState, TrafficLog};
pub use target::{Target, AUTHENTICATED_PATH, LOCAL_PATH};
