use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use skirmish::physics::Circle;
use skirmish::{Arena, InputActions, PlayerInput, RemotePlayer, WeaponKind};

const ARRIVE_DISTANCE: f32 = 24.0;
const STUCK_TICKS: u32 = 20;
const WAYPOINT_MARGIN: f32 = 100.0;

/// Stand-in for a human at the keyboard: wanders between random waypoints
/// and shoots at the closest living player in range.
pub struct BotBrain {
    rng: StdRng,
    engage_range: f32,
    waypoint: Option<Vec2>,
    last_position: Vec2,
    stuck_ticks: u32,
}

impl BotBrain {
    pub fn new(seed: u64, engage_range: f32) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            engage_range,
            waypoint: None,
            last_position: Vec2::ZERO,
            stuck_ticks: 0,
        }
    }

    pub fn waypoint(&self) -> Option<Vec2> {
        self.waypoint
    }

    pub fn think(&mut self, arena: &Arena) -> PlayerInput {
        let player = arena.player();
        if !player.is_alive() {
            self.waypoint = None;
            return PlayerInput::idle();
        }

        let position = player.position();
        let mut input = PlayerInput::idle();

        if let Some(target) = nearest_target(position, &arena.remote_players(), self.engage_range) {
            input.aim = Some(target);
            input.actions |= InputActions::FIRE;
            input.select_weapon = weapon_index(weapon_for_distance(position.distance(target)));
        }

        let weapon = player.current_weapon();
        if weapon.current_ammo() == 0 && !weapon.is_reloading() {
            input.actions |= InputActions::RELOAD;
        }

        if position.distance_squared(self.last_position) < 1.0 {
            self.stuck_ticks += 1;
        } else {
            self.stuck_ticks = 0;
        }
        self.last_position = position;
        if self.stuck_ticks > STUCK_TICKS {
            self.waypoint = None;
            self.stuck_ticks = 0;
        }

        let waypoint = match self.waypoint {
            Some(w) if w.distance(position) > ARRIVE_DISTANCE => w,
            _ => {
                let w = self.pick_waypoint(arena);
                self.waypoint = Some(w);
                w
            }
        };
        input.movement = (waypoint - position).normalize_or_zero();
        if input.aim.is_none() {
            input.aim = Some(waypoint);
        }

        input
    }

    fn pick_waypoint(&mut self, arena: &Arena) -> Vec2 {
        let map = arena.map();
        let radius = arena.config().player.radius;
        let mut candidate = Vec2::new(map.width() * 0.5, map.height() * 0.5);
        for _ in 0..10 {
            candidate = Vec2::new(
                self.coordinate(map.width()),
                self.coordinate(map.height()),
            );
            if !map.is_blocked(&Circle::new(candidate, radius)) {
                break;
            }
        }
        candidate
    }

    fn coordinate(&mut self, extent: f32) -> f32 {
        let span = extent - 2.0 * WAYPOINT_MARGIN;
        if span <= 0.0 {
            return extent * 0.5;
        }
        WAYPOINT_MARGIN + self.rng.gen_range(0.0..span)
    }
}

pub fn nearest_target(from: Vec2, remotes: &[RemotePlayer], range: f32) -> Option<Vec2> {
    remotes
        .iter()
        .filter(|r| r.alive)
        .map(|r| r.position)
        .filter(|p| p.distance(from) <= range)
        .min_by(|a, b| a.distance_squared(from).total_cmp(&b.distance_squared(from)))
}

pub fn weapon_for_distance(distance: f32) -> WeaponKind {
    if distance > 450.0 {
        WeaponKind::Sniper
    } else if distance < 150.0 {
        WeaponKind::Smg
    } else {
        WeaponKind::Rifle
    }
}

fn weapon_index(kind: WeaponKind) -> Option<usize> {
    WeaponKind::ALL.iter().position(|k| *k == kind)
}
