pub mod clock;
pub mod combat;
pub mod leaderboard;
pub mod map;
pub mod net;
pub mod physics;
pub mod player;
pub mod relay;
pub mod session;
pub mod simulation;
pub mod weapon;

pub use clock::{Clock, ManualClock, SystemClock};
pub use combat::{Bullet, HitOutcome, HitTarget, IncomingHit};
pub use leaderboard::{Leaderboard, LeaderboardEntry};
pub use map::{ArenaMap, Obstacle, TestingGround};
pub use net::{
    ConnectionManager, DEFAULT_PORT, GameMessage, MessageKind, MessageRegistry, NetworkStats,
    Packet, PacketError, PacketHeader, PacketType,
};
pub use physics::{Circle, Rect};
pub use player::{PlayerConfig, PlayerState, RemotePlayer};
pub use relay::{HitDelivery, RelayConfig, RelayEvent, RelayHandle, RelayServer};
pub use session::{ClientConfig, NetworkSession, ServerAddress, SessionError, SessionEvent};
pub use simulation::{Arena, ArenaConfig, ArenaEvent, FixedTimestep, InputActions, PlayerInput};
pub use weapon::{Loadout, Weapon, WeaponKind, WeaponSpec};
