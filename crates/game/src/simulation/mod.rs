mod arena;
mod input;
mod tick;

pub use arena::{Arena, ArenaConfig, ArenaEvent, OFFLINE_ID};
pub use input::{InputActions, PlayerInput};
pub use tick::FixedTimestep;
