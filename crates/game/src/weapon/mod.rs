mod archetype;
mod loadout;
mod state;

pub use archetype::{WeaponKind, WeaponSpec};
pub use loadout::Loadout;
pub use state::Weapon;
