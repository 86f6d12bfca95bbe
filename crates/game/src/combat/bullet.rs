use glam::Vec2;

use crate::physics::Circle;

pub const DEFAULT_BULLET_SPEED: f32 = 400.0;
pub const DEFAULT_BULLET_LIFETIME_MS: u64 = 1000;
/// Above this length a supplied direction is taken as a ready-made velocity.
pub const VELOCITY_THRESHOLD: f32 = 10.0;

const MIN_RADIUS: f32 = 3.0;
const MAX_RADIUS: f32 = 8.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Bullet {
    position: Vec2,
    velocity: Vec2,
    owner_id: u32,
    damage: f32,
    radius: f32,
    spawned_ms: u64,
    lifetime_ms: u64,
    stopped: bool,
}

impl Bullet {
    /// `direction` is either an aim direction (scaled to the default speed)
    /// or, when longer than [`VELOCITY_THRESHOLD`], the exact velocity to use.
    pub fn spawn(origin: Vec2, direction: Vec2, owner_id: u32, damage: f32, now_ms: u64) -> Self {
        let velocity = if direction.length() > VELOCITY_THRESHOLD {
            direction
        } else {
            direction.normalize_or_zero() * DEFAULT_BULLET_SPEED
        };

        Self {
            position: origin,
            velocity,
            owner_id,
            damage,
            radius: radius_for_damage(damage),
            spawned_ms: now_ms,
            lifetime_ms: DEFAULT_BULLET_LIFETIME_MS,
            stopped: false,
        }
    }

    pub fn with_lifetime(mut self, lifetime_ms: u64) -> Self {
        self.lifetime_ms = lifetime_ms;
        self
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    pub fn owner_id(&self) -> u32 {
        self.owner_id
    }

    pub fn set_owner(&mut self, owner_id: u32) {
        self.owner_id = owner_id;
    }

    pub fn damage(&self) -> f32 {
        self.damage
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn hitbox(&self) -> Circle {
        Circle::new(self.position, self.radius)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn integrate(&mut self, dt: f32) {
        if self.stopped {
            return;
        }
        self.position += self.velocity * dt;
    }

    pub fn stop(&mut self) {
        self.velocity = Vec2::ZERO;
        self.stopped = true;
    }

    pub fn is_out_of_bounds(&self, width: f32, height: f32) -> bool {
        let r = self.radius;
        self.position.x < -r
            || self.position.x > width + r
            || self.position.y < -r
            || self.position.y > height + r
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.spawned_ms) > self.lifetime_ms
    }

    pub fn should_remove(&self, width: f32, height: f32, now_ms: u64) -> bool {
        self.is_out_of_bounds(width, height) || self.is_expired(now_ms)
    }
}

fn radius_for_damage(damage: f32) -> f32 {
    (MIN_RADIUS + damage * 0.2).clamp(MIN_RADIUS, MAX_RADIUS)
}
