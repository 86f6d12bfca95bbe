use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Notify, RwLock, broadcast, mpsc};

use crate::net::{
    ClientConnection, ConnectionCounters, ConnectionManager, DENY_PROTOCOL_MISMATCH, FanOut,
    GameMessage, NetworkStats, PROTOCOL_VERSION, Packet, PacketError, PacketType, encode_frame, read_packet,
    write_frame, write_packet,
};

use super::config::RelayConfig;
use super::events::{DisconnectReason, RelayEvent};
use super::routing::{Route, route};

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub client_id: u32,
    pub addr: SocketAddr,
    pub uptime: Duration,
    pub stats: NetworkStats,
}

#[derive(Debug, Clone, Default)]
pub struct RelayStats {
    pub uptime_secs: u64,
    pub client_count: usize,
    pub max_clients: usize,
    pub total_connections: u64,
    pub messages_relayed: u64,
    pub network_stats: NetworkStats,
}

struct RelayShared {
    config: RelayConfig,
    connections: RwLock<ConnectionManager>,
    events: Mutex<VecDeque<RelayEvent>>,
    traffic: ConnectionCounters,
    messages_relayed: AtomicU64,
    total_connections: AtomicU64,
    running: AtomicBool,
    shutdown_tx: broadcast::Sender<()>,
    started_at: Instant,
}

impl RelayShared {
    fn new(config: RelayConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            connections: RwLock::new(ConnectionManager::new(config.max_clients)),
            config,
            events: Mutex::new(VecDeque::new()),
            traffic: ConnectionCounters::default(),
            messages_relayed: AtomicU64::new(0),
            total_connections: AtomicU64::new(0),
            running: AtomicBool::new(true),
            shutdown_tx,
            started_at: Instant::now(),
        }
    }

    fn push_event(&self, event: RelayEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(event);
    }

    /// Removes a connection and tells everyone left. No-op when the id is
    /// already gone, so kick and reader teardown can both call it.
    async fn disconnect(&self, client_id: u32, reason: DisconnectReason) -> bool {
        let mut connections = self.connections.write().await;
        let Some(connection) = connections.remove(client_id) else {
            return false;
        };
        connection.close();

        match encode_frame(&Packet::message(GameMessage::PlayerDisconnected { id: client_id })) {
            Ok(frame) => {
                connections.broadcast(&Arc::from(frame));
            }
            Err(e) => log::error!("Failed to encode disconnect notice: {}", e),
        }
        drop(connections);

        log::info!("Client {} {}", client_id, reason.as_str());
        self.push_event(RelayEvent::ClientDisconnected { client_id, reason });
        true
    }

    async fn dispatch(&self, sender_id: u32, message: GameMessage) {
        if let Err(e) = self.config.registry.ensure_registered(&message) {
            log::warn!("Dropping message from client {}: {}", sender_id, e);
            return;
        }

        let route = route(&message, self.config.hit_delivery);
        let outgoing = match &route {
            Route::Drop => {
                log::debug!("Ignoring {:?} from client {}", message.kind(), sender_id);
                return;
            }
            Route::Reply(reply) => reply.clone(),
            _ => message,
        };

        let frame: Arc<[u8]> = match encode_frame(&Packet::message(outgoing)) {
            Ok(frame) => Arc::from(frame),
            Err(e) => {
                log::warn!("Failed to encode relay frame: {}", e);
                return;
            }
        };

        let connections = self.connections.read().await;
        let fan_out = match route {
            Route::Others => connections.broadcast_except(sender_id, &frame),
            Route::Everyone => connections.broadcast(&frame),
            Route::Target(id) => connections.send_to(id, &frame),
            Route::Reply(_) => connections.send_to(sender_id, &frame),
            Route::Drop => FanOut::default(),
        };
        drop(connections);

        log::trace!(
            "Relayed frame from {} to {} peers",
            sender_id,
            fan_out.delivered
        );
        self.messages_relayed
            .fetch_add(fan_out.delivered as u64, Ordering::Relaxed);

        for client_id in fan_out.backlogged {
            log::warn!("Client {} is not reading, dropping it", client_id);
            self.disconnect(client_id, DisconnectReason::Backlogged)
                .await;
        }
    }
}

/// Thin fan-out switch: holds no game state, only the connection registry.
pub struct RelayServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    shared: Arc<RelayShared>,
}

impl RelayServer {
    pub async fn bind(config: RelayConfig) -> Result<Self, RelayError> {
        let listener =
            TcpListener::bind(&config.bind_addr)
                .await
                .map_err(|source| RelayError::Bind {
                    addr: config.bind_addr.clone(),
                    source,
                })?;
        let local_addr = listener.local_addr()?;

        let shared = Arc::new(RelayShared::new(config));
        shared.push_event(RelayEvent::Listening { addr: local_addr });

        Ok(Self {
            listener,
            local_addr,
            shared,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn handle(&self) -> RelayHandle {
        RelayHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Accepts connections until [`RelayHandle::shutdown`] is called.
    pub async fn run(self) -> Result<(), RelayError> {
        log::info!("Relay listening on {}", self.local_addr);
        let mut shutdown_rx = self.shared.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let shared = Arc::clone(&self.shared);
                            tokio::spawn(async move {
                                handle_connection(shared, stream, addr).await;
                            });
                        }
                        Err(e) => {
                            log::error!("Accept error: {}", e);
                            self.shared.push_event(RelayEvent::Error {
                                message: format!("Accept error: {}", e),
                            });
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    log::info!("Relay shutting down");
                    break;
                }
            }
        }

        self.shared.running.store(false, Ordering::SeqCst);
        let ids: Vec<u32> = self
            .shared
            .connections
            .read()
            .await
            .iter()
            .map(|c| c.client_id)
            .collect();
        for id in ids {
            self.shared.disconnect(id, DisconnectReason::Shutdown).await;
        }
        Ok(())
    }
}

/// Cloneable control surface for a running relay.
#[derive(Clone)]
pub struct RelayHandle {
    shared: Arc<RelayShared>,
}

impl RelayHandle {
    pub fn shutdown(&self) {
        let _ = self.shared.shutdown_tx.send(());
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &RelayConfig {
        &self.shared.config
    }

    pub async fn kick(&self, client_id: u32) -> bool {
        self.shared
            .disconnect(client_id, DisconnectReason::Kicked)
            .await
    }

    pub fn drain_events(&self) -> Vec<RelayEvent> {
        self.shared
            .events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }

    pub async fn client_infos(&self) -> Vec<ClientInfo> {
        self.shared
            .connections
            .read()
            .await
            .iter()
            .map(|c| ClientInfo {
                client_id: c.client_id,
                addr: c.addr,
                uptime: c.uptime(),
                stats: c.stats(),
            })
            .collect()
    }

    pub async fn stats(&self) -> RelayStats {
        let connections = self.shared.connections.read().await;
        RelayStats {
            uptime_secs: self.shared.started_at.elapsed().as_secs(),
            client_count: connections.total_count(),
            max_clients: connections.max_clients(),
            total_connections: self.shared.total_connections.load(Ordering::Relaxed),
            messages_relayed: self.shared.messages_relayed.load(Ordering::Relaxed),
            network_stats: self.shared.traffic.snapshot(),
        }
    }
}

async fn handle_connection(shared: Arc<RelayShared>, mut stream: TcpStream, addr: SocketAddr) {
    let _ = stream.set_nodelay(true);

    let (tx, rx) = mpsc::channel(shared.config.send_queue_capacity.max(1));
    let counters = Arc::new(ConnectionCounters::default());
    let closed = Arc::new(Notify::new());
    let pending = ClientConnection::new(addr, 0, tx, Arc::clone(&counters), Arc::clone(&closed));

    let timeout = shared.config.handshake_timeout;
    let client_id =
        match tokio::time::timeout(timeout, accept_handshake(&shared, &mut stream, pending)).await
        {
            Ok(Ok(id)) => id,
            Ok(Err(reason)) => {
                log::debug!("Denied {}: {}", addr, reason);
                let denied = Packet::new(PacketType::ConnectionDenied {
                    reason: reason.clone(),
                });
                let _ = write_packet(&mut stream, &denied).await;
                let _ = stream.shutdown().await;
                shared.push_event(RelayEvent::ConnectionDenied { addr, reason });
                return;
            }
            Err(_) => {
                log::debug!("Handshake from {} timed out", addr);
                return;
            }
        };

    shared.total_connections.fetch_add(1, Ordering::Relaxed);
    log::info!("Client {} connected from {}", client_id, addr);
    shared.push_event(RelayEvent::ClientConnected { client_id, addr });

    let (mut reader, writer) = stream.into_split();
    tokio::spawn(write_loop(
        writer,
        rx,
        Arc::clone(&shared),
        Arc::clone(&counters),
    ));

    let mut shutdown_rx = shared.shutdown_tx.subscribe();
    let reason = loop {
        tokio::select! {
            result = read_packet(&mut reader) => match result {
                Ok(Some((packet, len))) => {
                    counters.record_received(len);
                    shared.traffic.record_received(len);
                    match packet.payload {
                        PacketType::Message(message) => shared.dispatch(client_id, message).await,
                        other => log::debug!("Unexpected packet from client {}: {:?}", client_id, other),
                    }
                }
                Ok(None) => break DisconnectReason::Graceful,
                Err(PacketError::Io(e)) => {
                    log::debug!("Client {} read error: {}", client_id, e);
                    break DisconnectReason::ConnectionLost;
                }
                Err(e) => {
                    log::warn!("Malformed frame from client {}: {}", client_id, e);
                    break DisconnectReason::ConnectionLost;
                }
            },
            _ = closed.notified() => break DisconnectReason::Kicked,
            _ = shutdown_rx.recv() => break DisconnectReason::Shutdown,
        }
    };

    shared.disconnect(client_id, reason).await;
}

/// Validates the request and registers the connection under a fresh id in
/// one step, so capacity checks never race. Frames relayed to the new id
/// before the writer starts wait in its queue.
async fn accept_handshake(
    shared: &RelayShared,
    stream: &mut TcpStream,
    mut pending: ClientConnection,
) -> Result<u32, String> {
    let request = match read_packet(stream).await {
        Ok(Some((packet, _))) => packet,
        Ok(None) => return Err("closed during handshake".to_string()),
        Err(e) => return Err(e.to_string()),
    };

    let PacketType::ConnectionRequest {
        protocol_version,
        registry_fingerprint,
    } = request.payload
    else {
        return Err("expected connection request".to_string());
    };

    if protocol_version != PROTOCOL_VERSION
        || registry_fingerprint != shared.config.registry.fingerprint()
    {
        return Err(DENY_PROTOCOL_MISMATCH.to_string());
    }

    let client_id = {
        let mut connections = shared.connections.write().await;
        let client_id = connections.reserve_id().map_err(str::to_string)?;
        pending.client_id = client_id;
        connections.insert(pending);
        client_id
    };

    let accepted = Packet::new(PacketType::ConnectionAccepted { client_id });
    if let Err(e) = write_packet(stream, &accepted).await {
        shared.connections.write().await.remove(client_id);
        return Err(e.to_string());
    }
    Ok(client_id)
}

async fn write_loop(
    mut writer: OwnedWriteHalf,
    mut rx: mpsc::Receiver<Arc<[u8]>>,
    shared: Arc<RelayShared>,
    counters: Arc<ConnectionCounters>,
) {
    while let Some(frame) = rx.recv().await {
        if let Err(e) = write_frame(&mut writer, &frame).await {
            log::debug!("Write failed: {}", e);
            break;
        }
        counters.record_sent(frame.len());
        shared.traffic.record_sent(frame.len());
    }
    let _ = writer.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn join(connections: &mut ConnectionManager, capacity: usize) -> (u32, mpsc::Receiver<Arc<[u8]>>) {
        let (tx, rx) = mpsc::channel(capacity);
        let client_id = connections.reserve_id().unwrap();
        let addr: SocketAddr = format!("127.0.0.1:{}", 50000 + client_id).parse().unwrap();
        connections.insert(ClientConnection::new(
            addr,
            client_id,
            tx,
            Arc::default(),
            Arc::default(),
        ));
        (client_id, rx)
    }

    fn update(id: u32) -> GameMessage {
        GameMessage::PlayerUpdate {
            id,
            x: 1.0,
            y: 2.0,
            alive: true,
            health: 100.0,
            rotation: 0.0,
            username: "p".to_string(),
            kills: 0,
        }
    }

    #[tokio::test]
    async fn stalled_reader_is_dropped() {
        let shared = RelayShared::new(RelayConfig::default());
        let ((sender, _rs), (stalled, _rx), (reader, mut rr)) = {
            let mut connections = shared.connections.write().await;
            (
                join(&mut connections, 8),
                join(&mut connections, 2),
                join(&mut connections, 8),
            )
        };

        for _ in 0..2 {
            shared.dispatch(sender, update(sender)).await;
            rr.try_recv().unwrap();
        }
        assert!(shared.connections.read().await.contains(stalled));

        shared.dispatch(sender, update(sender)).await;
        assert!(!shared.connections.read().await.contains(stalled));
        assert!(shared.connections.read().await.contains(reader));

        let events = shared.events.lock().unwrap().drain(..).collect::<Vec<_>>();
        assert_eq!(
            events,
            vec![RelayEvent::ClientDisconnected {
                client_id: stalled,
                reason: DisconnectReason::Backlogged,
            }]
        );

        // The update itself, then the departure notice.
        rr.try_recv().unwrap();
        rr.try_recv().unwrap();
        assert!(rr.try_recv().is_err());
    }
}
