use std::sync::Arc;

use glam::Vec2;

use crate::physics::Circle;

use super::avatar::AvatarAsset;

/// Last known state of a peer, keyed by its connection id.
#[derive(Debug, Clone)]
pub struct RemotePlayer {
    pub id: u32,
    pub position: Vec2,
    pub health: f32,
    pub alive: bool,
    pub rotation: f32,
    pub username: String,
    pub kills: u32,
    avatar: Option<Arc<AvatarAsset>>,
}

impl RemotePlayer {
    pub fn new(id: u32, avatar: Option<Arc<AvatarAsset>>) -> Self {
        Self {
            id,
            position: Vec2::ZERO,
            health: 0.0,
            alive: false,
            rotation: 0.0,
            username: String::new(),
            kills: 0,
            avatar,
        }
    }

    /// Overwrites everything unconditionally. There is no sequencing, so a
    /// late packet can roll the view back.
    #[allow(clippy::too_many_arguments)]
    pub fn apply_update(
        &mut self,
        x: f32,
        y: f32,
        alive: bool,
        health: f32,
        rotation: f32,
        username: &str,
        kills: u32,
    ) {
        self.position = Vec2::new(x, y);
        self.alive = alive;
        self.health = health;
        self.rotation = rotation;
        if !username.is_empty() {
            self.username.clear();
            self.username.push_str(username);
        }
        self.kills = kills;
    }

    pub fn hitbox(&self, radius: f32) -> Circle {
        Circle::new(self.position, radius)
    }

    pub fn avatar(&self) -> Option<&Arc<AvatarAsset>> {
        self.avatar.as_ref()
    }
}
