use glam::Vec2;

/// Gameplay data the receive path hands to the tick loop, which alone turns
/// it into bullets or damage.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    BulletFired {
        owner_id: u32,
        origin: Vec2,
        velocity: Vec2,
        damage: f32,
    },
    Hit {
        source_id: u32,
        damage: f32,
        fatal: bool,
    },
}

/// Notices for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    PlayerJoined {
        id: u32,
        username: String,
    },
    PlayerLeft {
        id: u32,
        username: String,
    },
    Kill {
        killer_id: u32,
        victim_id: u32,
        killer_name: String,
        victim_name: String,
    },
    ConnectionLost,
}
