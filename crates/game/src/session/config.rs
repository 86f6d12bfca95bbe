use std::time::Duration;

use crate::net::MessageRegistry;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub connect_timeout: Duration,
    pub ping_interval: Duration,
    pub publish_rate: u32,
    pub registry: MessageRegistry,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(5000),
            ping_interval: Duration::from_millis(1000),
            publish_rate: 20,
            registry: MessageRegistry::standard(),
        }
    }
}
