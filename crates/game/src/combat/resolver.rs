use crate::map::Obstacle;
use crate::physics::Circle;

use super::bullet::Bullet;

/// Last-known view of another player, as seen by the resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct HitTarget {
    pub id: u32,
    pub hitbox: Circle,
    pub health: f32,
    pub alive: bool,
}

/// A hit the local player landed on someone else.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitOutcome {
    pub target_id: u32,
    pub damage: f32,
    pub fatal: bool,
}

/// A bullet owned by someone else that reached the local hitbox.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncomingHit {
    pub source_id: u32,
    pub damage: f32,
}

/// Drops bullets that left the arena or outlived their budget. Runs before any
/// collision pass so a bullet leaving the arena never registers a hit.
pub fn remove_spent(bullets: &mut Vec<Bullet>, width: f32, height: f32, now_ms: u64) -> usize {
    let before = bullets.len();
    bullets.retain(|b| !b.is_stopped() && !b.should_remove(width, height, now_ms));
    before - bullets.len()
}

pub fn resolve_bullets_vs_obstacles(bullets: &mut Vec<Bullet>, obstacles: &[Obstacle]) -> usize {
    let mut absorbed = 0;
    for bullet in bullets.iter_mut().filter(|b| !b.is_stopped()) {
        let hitbox = bullet.hitbox();
        if obstacles.iter().any(|o| o.blocks(&hitbox)) {
            bullet.stop();
            absorbed += 1;
        }
    }
    bullets.retain(|b| !b.is_stopped());
    absorbed
}

/// Stops every foreign bullet touching the local hitbox, one hit per bullet.
/// Bullets owned by `local_id` pass through.
pub fn resolve_bullets_vs_local_player(
    bullets: &mut Vec<Bullet>,
    local_id: u32,
    hitbox: &Circle,
) -> Vec<IncomingHit> {
    let mut hits = Vec::new();
    for bullet in bullets.iter_mut() {
        if bullet.is_stopped() || bullet.owner_id() == local_id {
            continue;
        }
        if bullet.hitbox().overlaps_circle(hitbox) {
            hits.push(IncomingHit {
                source_id: bullet.owner_id(),
                damage: bullet.damage(),
            });
            bullet.stop();
        }
    }
    bullets.retain(|b| !b.is_stopped());
    hits
}

/// Resolves the local player's bullets against living remote targets.
///
/// A hit is fatal when the target's last-known health is at most the damage.
/// Target health is decremented in place so several bullets landing in the
/// same tick see each other's effect and a target can only die once.
pub fn resolve_bullets_vs_remote_players(
    bullets: &mut Vec<Bullet>,
    local_id: u32,
    targets: &mut [HitTarget],
) -> Vec<HitOutcome> {
    let mut outcomes = Vec::new();
    for bullet in bullets.iter_mut() {
        if bullet.is_stopped() || bullet.owner_id() != local_id {
            continue;
        }
        let hitbox = bullet.hitbox();
        let Some(target) = targets
            .iter_mut()
            .find(|t| t.alive && t.id != local_id && t.hitbox.overlaps_circle(&hitbox))
        else {
            continue;
        };

        let damage = bullet.damage();
        let fatal = target.health <= damage;
        target.health = (target.health - damage).max(0.0);
        if fatal {
            target.alive = false;
        }
        outcomes.push(HitOutcome {
            target_id: target.id,
            damage,
            fatal,
        });
        bullet.stop();
    }
    bullets.retain(|b| !b.is_stopped());
    outcomes
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;

    fn target(id: u32, x: f32, health: f32) -> HitTarget {
        HitTarget {
            id,
            hitbox: Circle::new(Vec2::new(x, 0.0), 16.0),
            health,
            alive: true,
        }
    }

    #[test]
    fn first_obstacle_absorbs() {
        let obstacles = [
            Obstacle::new(0.0, 0.0, 10.0, 10.0),
            Obstacle::new(5.0, 5.0, 10.0, 10.0),
        ];
        let mut bullets = vec![
            Bullet::spawn(Vec2::new(8.0, 8.0), Vec2::X, 1, 6.0, 0),
            Bullet::spawn(Vec2::new(80.0, 80.0), Vec2::X, 1, 6.0, 0),
        ];
        assert_eq!(resolve_bullets_vs_obstacles(&mut bullets, &obstacles), 1);
        assert_eq!(bullets.len(), 1);
    }

    #[test]
    fn own_bullets_never_hit_local() {
        let hitbox = Circle::new(Vec2::ZERO, 16.0);
        let mut bullets = vec![
            Bullet::spawn(Vec2::ZERO, Vec2::X, 1, 6.0, 0),
            Bullet::spawn(Vec2::ZERO, Vec2::X, 2, 20.0, 0),
        ];
        let hits = resolve_bullets_vs_local_player(&mut bullets, 1, &hitbox);
        assert_eq!(
            hits,
            vec![IncomingHit {
                source_id: 2,
                damage: 20.0
            }]
        );
        assert_eq!(bullets.len(), 1);
        assert_eq!(bullets[0].owner_id(), 1);
    }

    #[test]
    fn one_bullet_one_target() {
        let mut targets = vec![target(2, 0.0, 100.0), target(3, 4.0, 100.0)];
        let mut bullets = vec![Bullet::spawn(Vec2::new(2.0, 0.0), Vec2::X, 1, 6.0, 0)];

        let outcomes = resolve_bullets_vs_remote_players(&mut bullets, 1, &mut targets);
        assert_eq!(
            outcomes,
            vec![HitOutcome {
                target_id: 2,
                damage: 6.0,
                fatal: false
            }]
        );
        assert!(bullets.is_empty());
        assert_eq!(targets[1].health, 100.0);

        let again = resolve_bullets_vs_remote_players(&mut bullets, 1, &mut targets);
        assert!(again.is_empty());
    }

    #[test]
    fn kill_counted_once_per_tick() {
        let mut targets = vec![target(2, 0.0, 10.0)];
        let mut bullets: Vec<_> = (0..3)
            .map(|_| Bullet::spawn(Vec2::ZERO, Vec2::X, 1, 6.0, 0))
            .collect();

        let outcomes = resolve_bullets_vs_remote_players(&mut bullets, 1, &mut targets);
        assert_eq!(outcomes.len(), 2);
        assert!(!outcomes[0].fatal);
        assert!(outcomes[1].fatal);
        assert_eq!(bullets.len(), 1);
        assert!(!targets[0].alive);
    }

    #[test]
    fn spent_bullets_skip_collision() {
        let obstacles = [Obstacle::new(-50.0, -50.0, 200.0, 200.0)];
        let mut bullets = vec![Bullet::spawn(Vec2::new(-20.0, 5.0), Vec2::X, 1, 6.0, 0)];

        assert_eq!(remove_spent(&mut bullets, 100.0, 100.0, 0), 1);
        assert_eq!(resolve_bullets_vs_obstacles(&mut bullets, &obstacles), 0);
    }
}
