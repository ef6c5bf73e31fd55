//! Application layer for nautica-remote.
//!
//! Knows *what* to do with an inbound packet (which handler runs, who hears
//! about errors) without knowing how packets arrive.
//!
//! # What does NOT belong here?
//!
//! - Opening sockets or scheduling reconnects (that is infrastructure)
//! - JSON parsing (that is `nautica-core`)

pub mod router;

pub use router::{Dispatch, ErrorSubscriber, Handler, RouteError, Router};
