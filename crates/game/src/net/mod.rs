mod codec;
mod connection;
mod protocol;
mod registry;
mod stats;

pub use codec::{encode_frame, read_packet, write_frame, write_packet};
pub use connection::{ClientConnection, ConnectionManager, Delivery, FanOut, FrameSender};
pub use protocol::{
    DEFAULT_PORT, DENY_PROTOCOL_MISMATCH, DENY_SERVER_FULL, GameMessage, MAX_PACKET_SIZE,
    PROTOCOL_MAGIC, PROTOCOL_VERSION, Packet, PacketError, PacketHeader, PacketType,
};
pub use registry::{MessageKind, MessageRegistry};
pub use stats::{ConnectionCounters, NetworkStats};
