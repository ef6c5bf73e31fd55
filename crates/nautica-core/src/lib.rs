//! # nautica-core
//!
//! Shared protocol types for talking to a Nautica device over its control
//! WebSocket.
//!
//! This crate has zero dependencies on sockets, async runtimes, or UI code.
//! It only knows what a packet looks like on the wire and how to turn text
//! frames into typed values and back.
//!
//! # Protocol overview (for beginners)
//!
//! Every WebSocket text frame carries exactly one JSON object.  The object
//! always has a string field `id` that names the message type; every other
//! field is payload whose shape depends on the type:
//!
//! ```json
//! {"id":"auth","accessKey":"K"}
//! {"id":"nr.list","ok":true,"servers":[{"label":"lab","node":"n1","ip":"10.0.0.5","port":9000}]}
//! {"id":"error","content":"bad-key"}
//! ```
//!
//! - **`protocol::kind`** – [`MessageKind`], the typed form of the `id` field.
//! - **`protocol::packet`** – [`Packet`] plus the [`encode_packet`] /
//!   [`decode_packet`] codec.
//! - **`protocol::servers`** – [`ServerSummary`], the entries of an
//!   `nr.list` reply.

pub mod protocol;

pub use protocol::kind::MessageKind;
pub use protocol::packet::{decode_packet, encode_packet, Packet, PacketError};
pub use protocol::servers::ServerSummary;
