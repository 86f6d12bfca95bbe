use glam::Vec2;
use rand::Rng;

use crate::map::ArenaMap;
use crate::physics::Circle;
use crate::player::PlayerState;

/// Picks a spawn point inside the arena's inset area and revives the player
/// there.
///
/// Candidates are tried in a bounded loop. The first one clear of obstacles
/// and at least `min_spawn_distance` from every other living player wins.
/// Failing that the first obstacle-free candidate is used, and as a last
/// resort the final unchecked one.
pub fn respawn<R: Rng + ?Sized>(
    player: &mut PlayerState,
    map: &ArenaMap,
    others: &[Vec2],
    rng: &mut R,
) -> Vec2 {
    let position = find_spawn_point(player, map, others, rng);
    player.revive(position);
    position
}

pub fn find_spawn_point<R: Rng + ?Sized>(
    player: &PlayerState,
    map: &ArenaMap,
    others: &[Vec2],
    rng: &mut R,
) -> Vec2 {
    let config = player.config();
    let radius = config.radius;
    let min_distance_sq = config.min_spawn_distance * config.min_spawn_distance;

    let mut obstacle_free = None;
    let mut last = Vec2::new(map.width() * 0.5, map.height() * 0.5);

    for _ in 0..config.spawn_attempts.max(1) {
        let candidate = Vec2::new(
            inset_coordinate(map.width(), config.spawn_margin, rng),
            inset_coordinate(map.height(), config.spawn_margin, rng),
        );
        last = candidate;

        if map.is_blocked(&Circle::new(candidate, radius)) {
            continue;
        }

        if others
            .iter()
            .all(|o| o.distance_squared(candidate) >= min_distance_sq)
        {
            return candidate;
        }

        obstacle_free.get_or_insert(candidate);
    }

    match obstacle_free {
        Some(candidate) => {
            log::debug!("No spawn point clear of other players, using obstacle-free fallback");
            candidate
        }
        None => {
            log::warn!("No obstacle-free spawn point found, spawning unchecked");
            last
        }
    }
}

/// A coordinate strictly between `margin` and `extent - margin`.
fn inset_coordinate<R: Rng + ?Sized>(extent: f32, margin: f32, rng: &mut R) -> f32 {
    let span = extent - 2.0 * margin;
    if span <= 0.0 {
        return extent * 0.5;
    }
    loop {
        let value = margin + rng.gen_range(0.0..span);
        if value > margin && value < extent - margin {
            return value;
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand::rngs::mock::StepRng;

    use super::*;
    use crate::map::{Obstacle, TestingGround};
    use crate::player::PlayerConfig;

    fn dead_player() -> PlayerState {
        let mut player = PlayerState::new(PlayerConfig::default(), Vec2::ZERO, "p");
        player.take_damage(1_000.0, 0);
        player
    }

    #[test]
    fn open_arena_spawns_inside_inset() {
        let map = ArenaMap::open(800.0, 600.0);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..100 {
            let mut player = dead_player();
            let pos = respawn(&mut player, &map, &[], &mut rng);
            assert!(pos.x > 100.0 && pos.x < 700.0);
            assert!(pos.y > 100.0 && pos.y < 500.0);
            assert!(player.is_alive());
            assert_eq!(player.health(), player.max_health());
        }
    }

    #[test]
    fn avoids_obstacles_and_players() {
        let map = TestingGround::build();
        let others = [Vec2::new(400.0, 400.0), Vec2::new(1200.0, 800.0)];
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..50 {
            let player = dead_player();
            let pos = find_spawn_point(&player, &map, &others, &mut rng);
            assert!(!map.is_blocked(&Circle::new(pos, 16.0)));
        }
    }

    #[test]
    fn crowded_arena_falls_back_to_obstacle_free() {
        let map = ArenaMap::new(400.0, 400.0, vec![Obstacle::new(0.0, 0.0, 400.0, 150.0)]);
        let others = [Vec2::new(200.0, 200.0)];
        let mut rng = StdRng::seed_from_u64(3);

        let player = dead_player();
        let pos = find_spawn_point(&player, &map, &others, &mut rng);
        assert!(!map.is_blocked(&Circle::new(pos, 16.0)));
    }

    #[test]
    fn inset_edge_is_never_returned() {
        // Yields zero for the first few hundred draws.
        let mut rng = StepRng::new(0, 1);
        let x = inset_coordinate(800.0, 100.0, &mut rng);
        assert!(x > 100.0 && x < 700.0);
    }

    #[test]
    fn tiny_arena_uses_center() {
        let map = ArenaMap::open(150.0, 150.0);
        let mut rng = StdRng::seed_from_u64(1);
        let mut player = dead_player();
        assert_eq!(respawn(&mut player, &map, &[], &mut rng), Vec2::new(75.0, 75.0));
    }
}
