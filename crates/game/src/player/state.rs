use glam::Vec2;

use crate::map::ArenaMap;
use crate::physics::Circle;
use crate::weapon::{Loadout, Weapon};

use super::config::PlayerConfig;

pub const DEFAULT_USERNAME: &str = "Player";
pub const MAX_USERNAME_LEN: usize = 16;

pub fn sanitize_username(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return DEFAULT_USERNAME.to_string();
    }
    trimmed.chars().take(MAX_USERNAME_LEN).collect()
}

/// The locally controlled player. Only the local simulation and combat
/// resolution mutate it.
#[derive(Debug, Clone)]
pub struct PlayerState {
    config: PlayerConfig,
    hitbox: Circle,
    velocity: Vec2,
    rotation: f32,
    health: f32,
    alive: bool,
    respawn_at_ms: u64,
    username: String,
    kills: u32,
    loadout: Loadout,
}

impl PlayerState {
    pub fn new(config: PlayerConfig, position: Vec2, username: &str) -> Self {
        Self {
            hitbox: Circle::new(position, config.radius),
            velocity: Vec2::ZERO,
            rotation: 0.0,
            health: config.max_health,
            alive: true,
            respawn_at_ms: 0,
            username: sanitize_username(username),
            kills: 0,
            loadout: Loadout::new(),
            config,
        }
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn position(&self) -> Vec2 {
        self.hitbox.center
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.hitbox.center = position;
    }

    pub fn hitbox(&self) -> Circle {
        self.hitbox
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    /// Movement intent in the unit square, scaled by the configured speed.
    pub fn set_move_direction(&mut self, direction: Vec2) {
        self.velocity = direction.clamp_length_max(1.0) * self.config.move_speed;
    }

    /// Degrees, counter-clockwise from +x.
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn set_rotation(&mut self, degrees: f32) {
        self.rotation = degrees;
    }

    pub fn aim_at(&mut self, target: Vec2) {
        let delta = target - self.position();
        if delta.length_squared() > f32::EPSILON {
            self.rotation = delta.y.atan2(delta.x).to_degrees();
        }
    }

    pub fn aim_direction(&self) -> Vec2 {
        Vec2::from_angle(self.rotation.to_radians())
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn max_health(&self) -> f32 {
        self.config.max_health
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn respawn_at_ms(&self) -> u64 {
        self.respawn_at_ms
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn set_username(&mut self, username: &str) {
        self.username = sanitize_username(username);
    }

    pub fn kills(&self) -> u32 {
        self.kills
    }

    pub fn set_kills(&mut self, kills: u32) {
        self.kills = kills;
    }

    pub fn add_kill(&mut self) -> u32 {
        self.kills += 1;
        self.kills
    }

    pub fn loadout(&self) -> &Loadout {
        &self.loadout
    }

    pub fn current_weapon(&self) -> &Weapon {
        self.loadout.current()
    }

    pub fn fire(&mut self, now_ms: u64) -> bool {
        self.alive && self.loadout.current_mut().fire(now_ms)
    }

    pub fn reload(&mut self, now_ms: u64) -> bool {
        self.loadout.current_mut().reload(now_ms)
    }

    pub fn next_weapon(&mut self) {
        self.loadout.next();
    }

    pub fn previous_weapon(&mut self) {
        self.loadout.previous();
    }

    pub fn select_weapon(&mut self, index: usize) -> bool {
        self.loadout.select(index)
    }

    pub fn update_weapons(&mut self, now_ms: u64) {
        self.loadout.update(now_ms);
    }

    /// Applies damage and returns whether it killed the player. Dead players
    /// ignore further damage.
    pub fn take_damage(&mut self, damage: f32, now_ms: u64) -> bool {
        if !self.alive {
            return false;
        }

        self.health = (self.health - damage.max(0.0)).min(self.config.max_health);
        if self.health <= 0.0 {
            self.health = 0.0;
            self.alive = false;
            self.velocity = Vec2::ZERO;
            self.respawn_at_ms = now_ms + self.config.respawn_delay_ms;
            return true;
        }
        false
    }

    pub fn should_respawn(&self, now_ms: u64) -> bool {
        !self.alive && now_ms >= self.respawn_at_ms
    }

    pub fn revive(&mut self, position: Vec2) {
        self.hitbox.center = position;
        self.velocity = Vec2::ZERO;
        self.health = self.config.max_health;
        self.alive = true;
    }

    /// Full reset for a new round: health, kills and weapons start over.
    pub fn reset(&mut self, position: Vec2) {
        self.revive(position);
        self.rotation = 0.0;
        self.kills = 0;
        self.respawn_at_ms = 0;
        self.loadout = Loadout::new();
    }

    /// Moves by `velocity * dt`. A move that would overlap an obstacle is
    /// discarded; the result always stays inside the arena.
    pub fn advance(&mut self, dt: f32, map: &ArenaMap) {
        if !self.alive {
            return;
        }

        let next = Circle::new(self.hitbox.center + self.velocity * dt, self.hitbox.radius);
        if !map.is_blocked(&next) {
            self.hitbox = next;
        }

        let r = self.hitbox.radius;
        let max = Vec2::new((map.width() - r).max(r), (map.height() - r).max(r));
        self.hitbox.center = self.hitbox.center.clamp(Vec2::splat(r), max);
    }
}
