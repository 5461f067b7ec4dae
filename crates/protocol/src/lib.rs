//! Packetline Protocol
//!
//! Packet and message types shared by the timeline aggregator and its
//! callers. Packets are serialized as tagged JSON, one per line in
//! recorded streams.

use uuid::Uuid;

pub mod packet;
pub mod types;

pub use packet::{DecodeError, Packet, PacketObj};
pub use types::*;

/// Generate a new unique ID
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
