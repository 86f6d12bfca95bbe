use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    Listening {
        addr: SocketAddr,
    },
    ClientConnected {
        client_id: u32,
        addr: SocketAddr,
    },
    ClientDisconnected {
        client_id: u32,
        reason: DisconnectReason,
    },
    ConnectionDenied {
        addr: SocketAddr,
        reason: String,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    Graceful,
    ConnectionLost,
    Kicked,
    /// Stopped reading and let its outbound queue fill up.
    Backlogged,
    Shutdown,
}

impl DisconnectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisconnectReason::Graceful => "disconnected",
            DisconnectReason::ConnectionLost => "lost connection",
            DisconnectReason::Kicked => "kicked",
            DisconnectReason::Backlogged => "dropped for falling behind",
            DisconnectReason::Shutdown => "closed by shutdown",
        }
    }
}
