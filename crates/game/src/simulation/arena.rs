use std::sync::Arc;

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::clock::Clock;
use crate::combat::{
    Bullet, DEFAULT_BULLET_LIFETIME_MS, HitTarget, find_spawn_point, remove_spent,
    resolve_bullets_vs_local_player, resolve_bullets_vs_obstacles,
    resolve_bullets_vs_remote_players, respawn,
};
use crate::leaderboard::{Leaderboard, LeaderboardEntry};
use crate::map::ArenaMap;
use crate::player::{PlayerConfig, PlayerState, RemotePlayer};
use crate::session::{Inbound, NetworkSession, SessionError, SessionEvent};

use super::input::{InputActions, PlayerInput};
use super::tick::FixedTimestep;

/// Id the local player uses while no relay is attached.
pub const OFFLINE_ID: u32 = 0;

#[derive(Debug, Clone)]
pub struct ArenaConfig {
    pub kill_limit: u32,
    pub bullet_lifetime_ms: u64,
    pub player: PlayerConfig,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            kill_limit: 20,
            bullet_lifetime_ms: DEFAULT_BULLET_LIFETIME_MS,
            player: PlayerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArenaEvent {
    Kill {
        killer_id: u32,
        victim_id: u32,
        killer_name: String,
        victim_name: String,
    },
    Died {
        source_id: u32,
    },
    Respawned {
        position: Vec2,
    },
    WentOffline,
    Network(SessionEvent),
}

/// Everything the renderer and input layer talk to. One `tick` advances the
/// local simulation, resolves combat, and exchanges state with the relay.
pub struct Arena {
    config: ArenaConfig,
    map: ArenaMap,
    player: PlayerState,
    bullets: Vec<Bullet>,
    session: Option<NetworkSession>,
    clock: Arc<dyn Clock>,
    rng: StdRng,
    publish: FixedTimestep,
    events: Vec<ArenaEvent>,
}

impl Arena {
    pub fn new(config: ArenaConfig, map: ArenaMap, clock: Arc<dyn Clock>, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut player = PlayerState::new(config.player.clone(), Vec2::ZERO, "");
        let spawn = find_spawn_point(&player, &map, &[], &mut rng);
        player.set_position(spawn);

        Self {
            config,
            map,
            player,
            bullets: Vec::new(),
            session: None,
            clock,
            rng,
            publish: FixedTimestep::new(20),
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn map(&self) -> &ArenaMap {
        &self.map
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut PlayerState {
        &mut self.player
    }

    pub fn bullets(&self) -> &[Bullet] {
        &self.bullets
    }

    pub fn session(&self) -> Option<&NetworkSession> {
        self.session.as_ref()
    }

    pub fn is_online(&self) -> bool {
        self.session.as_ref().is_some_and(NetworkSession::is_connected)
    }

    pub fn local_id(&self) -> u32 {
        self.session
            .as_ref()
            .map_or(OFFLINE_ID, NetworkSession::local_id)
    }

    pub fn ping_ms(&self) -> Option<u64> {
        self.session.as_ref().and_then(NetworkSession::ping_ms)
    }

    pub fn remote_players(&self) -> Vec<RemotePlayer> {
        self.session
            .as_ref()
            .map(NetworkSession::remote_players)
            .unwrap_or_default()
    }

    pub fn leaderboard(&self) -> Leaderboard {
        Leaderboard::from_players(self.local_id(), &self.player, &self.remote_players())
    }

    pub fn winner(&self) -> Option<LeaderboardEntry> {
        self.leaderboard().winner(self.config.kill_limit).cloned()
    }

    pub fn drain_events(&mut self) -> Vec<ArenaEvent> {
        std::mem::take(&mut self.events)
    }

    /// Hands the arena a connected session and announces the local player.
    pub fn attach_session(&mut self, session: NetworkSession) {
        self.publish = FixedTimestep::new(session.config().publish_rate);
        self.session = Some(session);
        self.announce();
    }

    pub fn start_game(&mut self, username: &str) {
        self.player.set_username(username);
        self.reset_game_state();
    }

    /// Starts a fresh round without touching the network session: the
    /// player is re-spawned, bullets are cleared, and presence is announced
    /// again so peers that joined meanwhile learn about us.
    pub fn reset_game_state(&mut self) {
        self.bullets.clear();
        self.events.clear();
        let others = self.living_remote_positions();
        let spawn = find_spawn_point(&self.player, &self.map, &others, &mut self.rng);
        self.player.reset(spawn);
        self.publish.reset();
        self.announce();
    }

    pub fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close();
        }
    }

    pub fn tick(&mut self, dt: f32, input: &PlayerInput) {
        let now = self.clock.now_ms();

        self.receive(now);
        self.apply_input(dt, input, now);

        for bullet in &mut self.bullets {
            bullet.integrate(dt);
        }
        remove_spent(&mut self.bullets, self.map.width(), self.map.height(), now);
        resolve_bullets_vs_obstacles(&mut self.bullets, self.map.obstacles());
        self.resolve_local_hits(now);
        self.resolve_remote_hits();

        if self.player.should_respawn(now) {
            let others = self.living_remote_positions();
            let position = respawn(&mut self.player, &self.map, &others, &mut self.rng);
            log::debug!("Respawned at ({:.0}, {:.0})", position.x, position.y);
            self.events.push(ArenaEvent::Respawned { position });
            self.announce();
        }

        self.publish.accumulate(dt);
        if self.publish.consume_all() {
            self.announce();
        }

        if let Some(session) = self.session.as_mut() {
            report(session.update_ping());
        }
    }

    fn receive(&mut self, now: u64) {
        let Some(session) = self.session.as_ref() else {
            return;
        };

        for inbound in session.drain_inbound() {
            match inbound {
                Inbound::BulletFired {
                    owner_id,
                    origin,
                    velocity,
                    damage,
                } => {
                    let bullet = Bullet::spawn(origin, velocity, owner_id, damage, now)
                        .with_lifetime(self.config.bullet_lifetime_ms);
                    self.bullets.push(bullet);
                }
                Inbound::Hit {
                    source_id, damage, ..
                } => self.apply_damage(source_id, damage, now),
            }
        }

        let Some(session) = self.session.as_ref() else {
            return;
        };
        self.events
            .extend(session.drain_events().into_iter().map(ArenaEvent::Network));

        if !session.is_connected() {
            log::warn!("Lost relay connection, continuing offline");
            let online_id = session.local_id();
            self.close();

            // Shots from peers die with the relay; ours switch to the
            // offline id so they never count as foreign.
            self.bullets.retain(|b| b.owner_id() == online_id);
            for bullet in &mut self.bullets {
                bullet.set_owner(OFFLINE_ID);
            }
            self.events.push(ArenaEvent::WentOffline);
        }
    }

    fn apply_input(&mut self, dt: f32, input: &PlayerInput, now: u64) {
        if input.actions.contains(InputActions::NEXT_WEAPON) {
            self.player.next_weapon();
        }
        if input.actions.contains(InputActions::PREV_WEAPON) {
            self.player.previous_weapon();
        }
        if let Some(index) = input.select_weapon {
            self.player.select_weapon(index);
        }
        if input.actions.contains(InputActions::RELOAD) {
            self.player.reload(now);
        }

        if self.player.is_alive() {
            self.player.set_move_direction(input.movement);
            if let Some(aim) = input.aim {
                self.player.aim_at(aim);
            }
        }
        self.player.advance(dt, &self.map);
        self.player.update_weapons(now);

        if input.actions.contains(InputActions::FIRE) && self.player.fire(now) {
            self.spawn_shot(now);
        }
    }

    fn spawn_shot(&mut self, now: u64) {
        let weapon = self.player.current_weapon().spec();
        let half_spread = weapon.spread * 0.5;
        let angle = self.player.rotation() + self.rng.gen_range(-half_spread..=half_spread);
        let direction = Vec2::from_angle(angle.to_radians());

        let origin = self.player.position() + direction * self.player.hitbox().radius;
        let velocity = direction * weapon.projectile_speed;
        let bullet = Bullet::spawn(origin, velocity, self.local_id(), weapon.damage, now)
            .with_lifetime(self.config.bullet_lifetime_ms);
        self.bullets.push(bullet);

        if let Some(session) = self.session.as_ref() {
            report(session.send_bullet_shot(origin, velocity, weapon.damage));
        }
    }

    fn resolve_local_hits(&mut self, now: u64) {
        if !self.player.is_alive() {
            return;
        }
        let hitbox = self.player.hitbox();
        let local_id = self.local_id();
        let hits = resolve_bullets_vs_local_player(&mut self.bullets, local_id, &hitbox);

        // Online, damage arrives through the shooter's PlayerHit; the local
        // overlap only absorbs the bullet.
        if self.session.is_some() {
            return;
        }
        for hit in hits {
            self.apply_damage(hit.source_id, hit.damage, now);
        }
    }

    fn resolve_remote_hits(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };

        let radius = self.config.player.radius;
        let mut targets: Vec<HitTarget> = session
            .remote_players()
            .iter()
            .filter(|r| r.alive)
            .map(|r| HitTarget {
                id: r.id,
                hitbox: r.hitbox(radius),
                health: r.health,
                alive: r.alive,
            })
            .collect();
        if targets.is_empty() {
            return;
        }

        let local_id = session.local_id();
        let outcomes = resolve_bullets_vs_remote_players(&mut self.bullets, local_id, &mut targets);
        for outcome in outcomes {
            session.record_outgoing_hit(outcome.target_id, outcome.damage, outcome.fatal);

            let new_kill_count = if outcome.fatal {
                self.player.add_kill()
            } else {
                0
            };
            report(session.send_player_hit(
                outcome.target_id,
                outcome.damage,
                outcome.fatal,
                new_kill_count,
            ));

            if outcome.fatal {
                let victim_name = session
                    .remote_player(outcome.target_id)
                    .map(|r| r.username)
                    .unwrap_or_default();
                log::info!("{} eliminated {}", self.player.username(), victim_name);
                report(session.send_kill_feed(
                    outcome.target_id,
                    self.player.username(),
                    &victim_name,
                ));
                self.events.push(ArenaEvent::Kill {
                    killer_id: local_id,
                    victim_id: outcome.target_id,
                    killer_name: self.player.username().to_string(),
                    victim_name,
                });
            }
        }
    }

    fn apply_damage(&mut self, source_id: u32, damage: f32, now: u64) {
        if self.player.take_damage(damage, now) {
            log::debug!("Killed by player {}", source_id);
            self.events.push(ArenaEvent::Died { source_id });
            self.announce();
        }
    }

    fn living_remote_positions(&self) -> Vec<Vec2> {
        self.remote_players()
            .into_iter()
            .filter(|r| r.alive)
            .map(|r| r.position)
            .collect()
    }

    fn announce(&self) {
        if let Some(session) = self.session.as_ref() {
            report(session.send_player_update(&self.player));
        }
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        self.close();
    }
}

fn report(result: Result<impl Sized, SessionError>) {
    if let Err(e) = result {
        log::warn!("Dropped outbound message: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::map::{Obstacle, TestingGround};

    fn arena(map: ArenaMap) -> (Arena, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000));
        let arena = Arena::new(ArenaConfig::default(), map, clock.clone(), Some(11));
        (arena, clock)
    }

    #[test]
    fn spawns_clear_of_obstacles() {
        let (arena, _) = arena(TestingGround::build());
        assert!(!arena.map().is_blocked(&arena.player().hitbox()));
        assert_eq!(arena.local_id(), OFFLINE_ID);
    }

    #[test]
    fn firing_spawns_one_bullet_per_shot() {
        let (mut arena, clock) = arena(ArenaMap::open(1000.0, 1000.0));
        let target = arena.player().position() + Vec2::new(300.0, 0.0);

        arena.tick(0.016, &PlayerInput::firing_at(target));
        assert_eq!(arena.bullets().len(), 1);
        assert_eq!(arena.player().current_weapon().current_ammo(), 29);

        arena.tick(0.016, &PlayerInput::firing_at(target));
        assert_eq!(arena.bullets().len(), 1);

        clock.advance(125);
        arena.tick(0.016, &PlayerInput::firing_at(target));
        assert_eq!(arena.bullets().len(), 2);
    }

    #[test]
    fn obstacle_absorbs_shot() {
        let map = ArenaMap::new(
            1000.0,
            1000.0,
            vec![Obstacle::new(0.0, 0.0, 1000.0, 10.0)],
        );
        let (mut arena, _) = arena(map);
        arena.player_mut().set_position(Vec2::new(500.0, 40.0));

        arena.tick(0.016, &PlayerInput::firing_at(Vec2::new(500.0, 0.0)));
        assert_eq!(arena.bullets().len(), 1);
        arena.tick(0.05, &PlayerInput::idle());
        assert!(arena.bullets().is_empty());
    }

    #[test]
    fn offline_foreign_bullet_damages_once() {
        let (mut arena, _) = arena(ArenaMap::open(1000.0, 1000.0));
        let position = arena.player().position();
        arena.bullets.push(Bullet::spawn(position, Vec2::ZERO, 7, 20.0, 1_000));

        arena.tick(0.016, &PlayerInput::idle());
        arena.tick(0.016, &PlayerInput::idle());
        assert_eq!(arena.player().health(), 80.0);
        assert!(arena.bullets().is_empty());
    }

    #[test]
    fn death_and_respawn_cycle() {
        let (mut arena, clock) = arena(ArenaMap::open(1000.0, 1000.0));
        arena.apply_damage(7, 500.0, clock.now_ms());
        assert!(!arena.player().is_alive());
        assert_eq!(arena.drain_events(), vec![ArenaEvent::Died { source_id: 7 }]);

        clock.advance(2_999);
        arena.tick(0.016, &PlayerInput::idle());
        assert!(!arena.player().is_alive());

        clock.advance(1);
        arena.tick(0.016, &PlayerInput::idle());
        assert!(arena.player().is_alive());
        assert_eq!(arena.player().health(), 100.0);
        assert!(matches!(
            arena.drain_events().as_slice(),
            [ArenaEvent::Respawned { .. }]
        ));
    }

    #[test]
    fn reset_restores_round() {
        let (mut arena, clock) = arena(ArenaMap::open(1000.0, 1000.0));
        arena.player_mut().set_kills(4);
        arena.apply_damage(2, 30.0, clock.now_ms());
        arena.tick(0.016, &PlayerInput::firing_at(Vec2::new(0.0, 0.0)));

        arena.start_game("  ");
        assert_eq!(arena.player().username(), "Player");
        assert_eq!(arena.player().kills(), 0);
        assert_eq!(arena.player().health(), 100.0);
        assert!(arena.bullets().is_empty());
        assert!(arena.winner().is_none());
    }

    #[test]
    fn weapon_switch_input() {
        let (mut arena, _) = arena(ArenaMap::open(1000.0, 1000.0));
        let input = PlayerInput {
            actions: InputActions::PREV_WEAPON,
            ..PlayerInput::default()
        };
        arena.tick(0.016, &input);
        assert_eq!(arena.player().loadout().current_index(), 2);

        let input = PlayerInput {
            select_weapon: Some(1),
            ..PlayerInput::default()
        };
        arena.tick(0.016, &input);
        assert_eq!(arena.player().current_weapon().name(), "Sniper Rifle");
    }
}
