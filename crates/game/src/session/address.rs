use std::fmt;

use crate::net::DEFAULT_PORT;

use super::error::SessionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    pub host: String,
    pub port: u16,
}

impl ServerAddress {
    /// Parses `host[:port][/suffix]`. An unparseable port falls back to the
    /// default one; broadcast hosts are refused outright.
    pub fn parse(input: &str) -> Result<Self, SessionError> {
        let trimmed = input.trim();
        let without_path = trimmed.split('/').next().unwrap_or_default();

        let (host, port) = match without_path.rsplit_once(':') {
            Some((host, port)) => (host, port.parse().unwrap_or(DEFAULT_PORT)),
            None => (without_path, DEFAULT_PORT),
        };

        if host.is_empty() {
            return Err(SessionError::InvalidAddress(input.to_string()));
        }

        if host.ends_with(".255") {
            return Err(SessionError::BroadcastAddress(host.to_string()));
        }

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
