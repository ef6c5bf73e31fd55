//! Infrastructure layer for nautica-remote.
//!
//! Everything that touches the network or spawns tasks lives here.
//!
//! # Responsibilities
//!
//! - Opening one WebSocket per connection attempt (`link`)
//! - Owning session state on a single task and scheduling reconnects
//!   (`session`)
//!
//! # What does NOT belong here?
//!
//! - Deciding which handler a packet goes to (that is the application layer)
//! - Config file parsing (that is the domain layer and `main.rs`)

pub mod link;
pub mod session;

pub use session::{RemoteSession, SessionError};
