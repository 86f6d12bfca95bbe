mod bullet;
mod resolver;
mod respawn;

pub use bullet::{Bullet, DEFAULT_BULLET_LIFETIME_MS, DEFAULT_BULLET_SPEED, VELOCITY_THRESHOLD};
pub use resolver::{
    HitOutcome, HitTarget, IncomingHit, remove_spent, resolve_bullets_vs_local_player,
    resolve_bullets_vs_obstacles, resolve_bullets_vs_remote_players,
};
pub use respawn::{find_spawn_point, respawn};
