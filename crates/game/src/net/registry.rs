use super::protocol::{GameMessage, PacketError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MessageKind {
    PlayerUpdate,
    BulletUpdate,
    PlayerHit,
    PingRequest,
    PingResponse,
    PlayerDisconnected,
    KillFeed,
}

impl MessageKind {
    pub const ALL: [MessageKind; 7] = [
        MessageKind::PlayerUpdate,
        MessageKind::BulletUpdate,
        MessageKind::PlayerHit,
        MessageKind::PingRequest,
        MessageKind::PingResponse,
        MessageKind::PlayerDisconnected,
        MessageKind::KillFeed,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MessageKind::PlayerUpdate => "PlayerUpdate",
            MessageKind::BulletUpdate => "BulletUpdate",
            MessageKind::PlayerHit => "PlayerHit",
            MessageKind::PingRequest => "PingRequest",
            MessageKind::PingResponse => "PingResponse",
            MessageKind::PlayerDisconnected => "PlayerDisconnected",
            MessageKind::KillFeed => "KillFeed",
        }
    }
}

impl GameMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            GameMessage::PlayerUpdate { .. } => MessageKind::PlayerUpdate,
            GameMessage::BulletUpdate { .. } => MessageKind::BulletUpdate,
            GameMessage::PlayerHit { .. } => MessageKind::PlayerHit,
            GameMessage::PingRequest { .. } => MessageKind::PingRequest,
            GameMessage::PingResponse { .. } => MessageKind::PingResponse,
            GameMessage::PlayerDisconnected { .. } => MessageKind::PlayerDisconnected,
            GameMessage::KillFeed { .. } => MessageKind::KillFeed,
        }
    }
}

/// Set of message kinds an endpoint agrees to send and receive. Both ends of
/// a connection compare fingerprints during the handshake, so a mismatch is
/// caught before any gameplay traffic flows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageRegistry {
    kinds: Vec<MessageKind>,
}

impl MessageRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn standard() -> Self {
        let mut registry = Self::empty();
        for kind in MessageKind::ALL {
            registry.register(kind);
        }
        registry
    }

    pub fn register(&mut self, kind: MessageKind) -> &mut Self {
        if let Err(pos) = self.kinds.binary_search(&kind) {
            self.kinds.insert(pos, kind);
        }
        self
    }

    pub fn contains(&self, kind: MessageKind) -> bool {
        self.kinds.binary_search(&kind).is_ok()
    }

    pub fn kinds(&self) -> &[MessageKind] {
        &self.kinds
    }

    /// FNV-1a over the sorted kind names.
    pub fn fingerprint(&self) -> u64 {
        const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
        const PRIME: u64 = 0x0000_0100_0000_01b3;

        let mut hash = OFFSET;
        for kind in &self.kinds {
            for byte in kind.name().bytes().chain(std::iter::once(0)) {
                hash ^= u64::from(byte);
                hash = hash.wrapping_mul(PRIME);
            }
        }
        hash
    }

    pub fn ensure_registered(&self, message: &GameMessage) -> Result<(), PacketError> {
        let kind = message.kind();
        if self.contains(kind) {
            Ok(())
        } else {
            Err(PacketError::Unregistered(kind.name()))
        }
    }
}
