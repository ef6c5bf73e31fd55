//! nautica-remote library crate.
//!
//! This crate owns the one piece of the control panel with real design
//! content: the session that talks to a Nautica device over its control
//! WebSocket.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! UI / console (observes state, traffic, events)
//!         ↕
//! [nautica-remote]
//!   ├── domain/           Pure types: ConnectionState, TrafficLog, Target, config
//!   ├── application/      Router: message kind → handler, error subscribers
//!   └── infrastructure/
//!         ├── link/       One WebSocket transport instance (tokio-tungstenite)
//!         └── session/    RemoteSession handle + single-writer actor task
//!         ↕
//! Nautica device (JSON packets over WebSocket)
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async code.
//! - `application` depends on `domain` and `nautica-core` only.
//! - `infrastructure` depends on all other layers plus `tokio` and `tungstenite`.

/// Domain layer: pure session types (no I/O).
pub mod domain;

/// Application layer: packet routing.
pub mod application;

/// Infrastructure layer: WebSocket transport and the session actor.
pub mod infrastructure;

pub use application::{Dispatch, RouteError, Router};
pub use domain::{ConnectionState, RemoteConfig, SessionConfig, SessionEvent, Target, TrafficLog};
pub use infrastructure::{RemoteSession, SessionError};
