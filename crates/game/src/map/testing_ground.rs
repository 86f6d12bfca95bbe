use super::{ArenaMap, Obstacle};

/// Built-in arena used by the headless client and the tests when no level
/// loader is attached.
pub struct TestingGround;

impl TestingGround {
    pub const WIDTH: f32 = 1600.0;
    pub const HEIGHT: f32 = 1200.0;

    pub fn build() -> ArenaMap {
        let mut obstacles = Vec::new();

        Self::add_center_block(&mut obstacles);
        Self::add_corner_cover(&mut obstacles);
        Self::add_lane_walls(&mut obstacles);

        ArenaMap::new(Self::WIDTH, Self::HEIGHT, obstacles)
    }

    fn add_center_block(obstacles: &mut Vec<Obstacle>) {
        obstacles.push(Obstacle::new(720.0, 520.0, 160.0, 160.0));
    }

    fn add_corner_cover(obstacles: &mut Vec<Obstacle>) {
        obstacles.push(Obstacle::new(260.0, 220.0, 120.0, 40.0));
        obstacles.push(Obstacle::new(1220.0, 220.0, 120.0, 40.0));
        obstacles.push(Obstacle::new(260.0, 940.0, 120.0, 40.0));
        obstacles.push(Obstacle::new(1220.0, 940.0, 120.0, 40.0));
    }

    fn add_lane_walls(obstacles: &mut Vec<Obstacle>) {
        obstacles.push(Obstacle::new(500.0, 380.0, 32.0, 440.0));
        obstacles.push(Obstacle::new(1068.0, 380.0, 32.0, 440.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obstacles_fit_inside_bounds() {
        let map = TestingGround::build();
        assert!(!map.obstacles().is_empty());
        for obstacle in map.obstacles() {
            assert!(obstacle.rect.x >= 0.0 && obstacle.rect.y >= 0.0);
            assert!(obstacle.rect.max().x <= map.width());
            assert!(obstacle.rect.max().y <= map.height());
        }
    }
}
