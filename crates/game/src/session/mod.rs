mod address;
mod client;
mod config;
mod error;
mod events;
mod state;

pub use address::ServerAddress;
pub use client::NetworkSession;
pub use config::ClientConfig;
pub use error::SessionError;
pub use events::{Inbound, SessionEvent};
