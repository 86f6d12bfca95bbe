mod objects;
mod testing_ground;

pub use objects::{ArenaMap, Obstacle};
pub use testing_ground::TestingGround;
