use bitflags::bitflags;
use glam::Vec2;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct InputActions: u8 {
        const FIRE = 1 << 0;
        const RELOAD = 1 << 1;
        const NEXT_WEAPON = 1 << 2;
        const PREV_WEAPON = 1 << 3;
    }
}

/// Per-frame intent reported by whatever drives the local player.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerInput {
    /// Movement direction; lengths above one are clamped.
    pub movement: Vec2,
    /// World-space point to aim at.
    pub aim: Option<Vec2>,
    pub actions: InputActions,
    pub select_weapon: Option<usize>,
}

impl PlayerInput {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn firing_at(target: Vec2) -> Self {
        Self {
            aim: Some(target),
            actions: InputActions::FIRE,
            ..Self::default()
        }
    }
}
