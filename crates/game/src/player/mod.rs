mod avatar;
mod config;
mod remote;
mod state;

pub use avatar::{AvatarAsset, AvatarCache};
pub use config::PlayerConfig;
pub use remote::RemotePlayer;
pub use state::{DEFAULT_USERNAME, MAX_USERNAME_LEN, PlayerState, sanitize_username};
