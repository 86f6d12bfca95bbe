use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize, rancor};

pub const MAX_PACKET_SIZE: usize = 1200;
pub const PROTOCOL_VERSION: u32 = 1;
pub const PROTOCOL_MAGIC: u32 = 0x534B524D;
pub const DEFAULT_PORT: u16 = 54555;

pub const DENY_SERVER_FULL: &str = "Server full";
pub const DENY_PROTOCOL_MISMATCH: &str = "Protocol mismatch";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub struct PacketHeader {
    pub magic: u32,
    pub version: u32,
}

impl Default for PacketHeader {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketHeader {
    pub fn new() -> Self {
        Self {
            magic: PROTOCOL_MAGIC,
            version: PROTOCOL_VERSION,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.magic == PROTOCOL_MAGIC && self.version == PROTOCOL_VERSION
    }
}

/// The closed set of gameplay messages peers exchange through the relay.
/// Every field is a primitive or a short string.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum GameMessage {
    PlayerUpdate {
        id: u32,
        x: f32,
        y: f32,
        alive: bool,
        health: f32,
        rotation: f32,
        username: String,
        kills: u32,
    },
    BulletUpdate {
        player_id: u32,
        x: f32,
        y: f32,
        dir_x: f32,
        dir_y: f32,
        damage: f32,
    },
    PlayerHit {
        source_id: u32,
        target_id: u32,
        damage: f32,
        fatal: bool,
        new_kill_count: u32,
    },
    PingRequest {
        timestamp: u64,
    },
    PingResponse {
        timestamp: u64,
    },
    PlayerDisconnected {
        id: u32,
    },
    KillFeed {
        killer_id: u32,
        victim_id: u32,
        killer_name: String,
        victim_name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum PacketType {
    ConnectionRequest {
        protocol_version: u32,
        registry_fingerprint: u64,
    },
    ConnectionAccepted {
        client_id: u32,
    },
    ConnectionDenied {
        reason: String,
    },
    Message(GameMessage),
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct Packet {
    pub header: PacketHeader,
    pub payload: PacketType,
}

#[derive(Debug, thiserror::Error)]
pub enum PacketError {
    #[error("serialization failed: {0}")]
    Serialize(rancor::Error),
    #[error("deserialization failed: {0}")]
    Deserialize(rancor::Error),
    #[error("packet of {0} bytes exceeds the size limit")]
    TooLarge(usize),
    #[error("invalid packet header")]
    InvalidHeader,
    #[error("message kind {0} is not registered")]
    Unregistered(&'static str),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Packet {
    pub fn new(payload: PacketType) -> Self {
        Self {
            header: PacketHeader::new(),
            payload,
        }
    }

    pub fn message(message: GameMessage) -> Self {
        Self::new(PacketType::Message(message))
    }

    pub fn serialize(&self) -> Result<Vec<u8>, PacketError> {
        let bytes = rkyv::to_bytes::<rancor::Error>(self)
            .map(|aligned| aligned.into_vec())
            .map_err(PacketError::Serialize)?;
        if bytes.len() > MAX_PACKET_SIZE {
            return Err(PacketError::TooLarge(bytes.len()));
        }
        Ok(bytes)
    }

    pub fn deserialize(data: &[u8]) -> Result<Self, PacketError> {
        if data.len() > MAX_PACKET_SIZE {
            return Err(PacketError::TooLarge(data.len()));
        }
        let mut aligned = AlignedVec::<16>::with_capacity(data.len());
        aligned.extend_from_slice(data);

        let packet = rkyv::from_bytes::<Self, rancor::Error>(&aligned)
            .map_err(PacketError::Deserialize)?;
        if !packet.header.is_valid() {
            return Err(PacketError::InvalidHeader);
        }
        Ok(packet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_update_round_trip() {
        let packet = Packet::message(GameMessage::PlayerUpdate {
            id: 3,
            x: 120.5,
            y: -4.25,
            alive: true,
            health: 94.0,
            rotation: 270.0,
            username: "ada".into(),
            kills: 7,
        });

        let bytes = packet.serialize().unwrap();
        assert_eq!(Packet::deserialize(&bytes).unwrap(), packet);
    }

    #[test]
    fn rejects_foreign_header() {
        let mut packet = Packet::message(GameMessage::PingRequest { timestamp: 1 });
        packet.header.magic = 0xDEAD_BEEF;
        let bytes = packet.serialize().unwrap();

        assert!(matches!(
            Packet::deserialize(&bytes),
            Err(PacketError::InvalidHeader)
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert!(Packet::deserialize(&[1, 2, 3]).is_err());
        assert!(matches!(
            Packet::deserialize(&vec![0u8; MAX_PACKET_SIZE + 1]),
            Err(PacketError::TooLarge(_))
        ));
    }

    #[test]
    fn oversized_username_refused() {
        let packet = Packet::message(GameMessage::KillFeed {
            killer_id: 1,
            victim_id: 2,
            killer_name: "x".repeat(2_000),
            victim_name: String::new(),
        });
        assert!(matches!(packet.serialize(), Err(PacketError::TooLarge(_))));
    }
}
