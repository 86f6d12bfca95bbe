use std::time::Duration;

use crate::net::PacketError;

/// Everything that can go wrong reaching a relay collapses into this one
/// error. The caller's only decision is whether to play offline.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid server address: {0:?}")]
    InvalidAddress(String),
    #[error("refusing to connect to broadcast address {0}")]
    BroadcastAddress(String),
    #[error("connection timed out after {0:?}")]
    Timeout(Duration),
    #[error("connection denied: {0}")]
    Denied(String),
    #[error("relay does not speak the same message set")]
    ProtocolMismatch,
    #[error("unexpected handshake reply")]
    UnexpectedReply,
    #[error("session is closed")]
    Closed,
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Packet(#[from] PacketError),
}
