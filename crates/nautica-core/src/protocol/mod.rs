//! Protocol module containing message kinds, packets and the JSON codec.

pub mod kind;
pub mod packet;
pub mod servers;

pub use kind::MessageKind;
pub use packet::{decode_packet, encode_packet, Packet, PacketError};
pub use servers::ServerSummary;
