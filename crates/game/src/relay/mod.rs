mod config;
mod events;
mod routing;
mod server;

pub use config::{HitDelivery, RelayConfig};
pub use events::{DisconnectReason, RelayEvent};
pub use routing::{Route, route};
pub use server::{ClientInfo, RelayError, RelayHandle, RelayServer, RelayStats};
