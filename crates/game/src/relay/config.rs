use std::fmt;
use std::time::Duration;

use crate::net::{DEFAULT_PORT, MessageRegistry};

/// Who receives a relayed `PlayerHit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HitDelivery {
    /// Every connected peer, shooter included.
    #[default]
    Broadcast,
    /// Only the peer named as target.
    TargetOnly,
}

impl fmt::Display for HitDelivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HitDelivery::Broadcast => f.write_str("broadcast"),
            HitDelivery::TargetOnly => f.write_str("target-only"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind_addr: String,
    pub max_clients: usize,
    pub hit_delivery: HitDelivery,
    pub handshake_timeout: Duration,
    /// Frames a peer may have waiting before the relay drops it.
    pub send_queue_capacity: usize,
    pub registry: MessageRegistry,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{}", DEFAULT_PORT),
            max_clients: 32,
            hit_delivery: HitDelivery::Broadcast,
            handshake_timeout: Duration::from_secs(5),
            send_queue_capacity: 256,
            registry: MessageRegistry::standard(),
        }
    }
}
