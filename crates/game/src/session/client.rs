use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use glam::Vec2;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::clock::Clock;
use crate::net::{
    ConnectionCounters, DENY_PROTOCOL_MISMATCH, GameMessage, NetworkStats, PROTOCOL_VERSION,
    Packet, PacketType, encode_frame, read_packet, write_frame, write_packet,
};
use crate::player::{AvatarCache, PlayerConfig, PlayerState, RemotePlayer};

use super::address::ServerAddress;
use super::config::ClientConfig;
use super::error::SessionError;
use super::events::{Inbound, SessionEvent};
use super::state::SharedState;

/// A client's live connection to a relay.
///
/// The tick loop owns the session and calls its `send_*` methods; they only
/// enqueue frames for the writer task, so none of them can stall a frame.
/// A reader task merges relayed messages into shared state that the tick
/// loop drains once per tick.
pub struct NetworkSession {
    local_id: u32,
    address: ServerAddress,
    config: ClientConfig,
    clock: Arc<dyn Clock>,
    shared: Arc<Mutex<SharedState>>,
    counters: Arc<ConnectionCounters>,
    outbound: Option<mpsc::UnboundedSender<Vec<u8>>>,
    reader: Option<JoinHandle<()>>,
    writer: Option<JoinHandle<()>>,
    last_ping_ms: Option<u64>,
}

impl NetworkSession {
    pub async fn connect(
        address: &str,
        config: ClientConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SessionError> {
        let address = ServerAddress::parse(address)?;
        let timeout = config.connect_timeout;

        let (stream, local_id) = tokio::time::timeout(timeout, open(&address, &config))
            .await
            .map_err(|_| SessionError::Timeout(timeout))??;

        log::info!("Connected to {} as player {}", address, local_id);

        let avatar = AvatarCache::shared().acquire(PlayerConfig::default().radius * 2.0);
        let shared = Arc::new(Mutex::new(SharedState::new(local_id, Some(avatar))));
        let counters = Arc::new(ConnectionCounters::default());
        let (tx, rx) = mpsc::unbounded_channel();
        let (read_half, write_half) = stream.into_split();

        let reader = tokio::spawn(read_loop(
            read_half,
            Arc::clone(&shared),
            Arc::clone(&counters),
            Arc::clone(&clock),
        ));
        let writer = tokio::spawn(write_loop(
            write_half,
            rx,
            Arc::clone(&shared),
            Arc::clone(&counters),
        ));

        Ok(Self {
            local_id,
            address,
            config,
            clock,
            shared,
            counters,
            outbound: Some(tx),
            reader: Some(reader),
            writer: Some(writer),
            last_ping_ms: None,
        })
    }

    pub fn local_id(&self) -> u32 {
        self.local_id
    }

    pub fn address(&self) -> &ServerAddress {
        &self.address
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.outbound.is_some() && self.lock().connected
    }

    pub fn send(&self, message: GameMessage) -> Result<(), SessionError> {
        self.config.registry.ensure_registered(&message)?;
        let outbound = self.outbound.as_ref().ok_or(SessionError::Closed)?;

        let frame = encode_frame(&Packet::message(message))?;
        let len = frame.len();
        if outbound.send(frame).is_err() {
            self.counters.record_dropped();
            return Err(SessionError::Closed);
        }
        self.counters.record_sent(len);
        Ok(())
    }

    pub fn send_player_update(&self, player: &PlayerState) -> Result<(), SessionError> {
        let position = player.position();
        self.send(GameMessage::PlayerUpdate {
            id: self.local_id,
            x: position.x,
            y: position.y,
            alive: player.is_alive(),
            health: player.health(),
            rotation: player.rotation(),
            username: player.username().to_string(),
            kills: player.kills(),
        })
    }

    /// `velocity` is sent as-is so receivers replicate the exact speed.
    pub fn send_bullet_shot(
        &self,
        origin: Vec2,
        velocity: Vec2,
        damage: f32,
    ) -> Result<(), SessionError> {
        self.send(GameMessage::BulletUpdate {
            player_id: self.local_id,
            x: origin.x,
            y: origin.y,
            dir_x: velocity.x,
            dir_y: velocity.y,
            damage,
        })
    }

    pub fn send_player_hit(
        &self,
        target_id: u32,
        damage: f32,
        fatal: bool,
        new_kill_count: u32,
    ) -> Result<(), SessionError> {
        self.send(GameMessage::PlayerHit {
            source_id: self.local_id,
            target_id,
            damage,
            fatal,
            new_kill_count,
        })
    }

    pub fn send_kill_feed(
        &self,
        victim_id: u32,
        killer_name: &str,
        victim_name: &str,
    ) -> Result<(), SessionError> {
        self.send(GameMessage::KillFeed {
            killer_id: self.local_id,
            victim_id,
            killer_name: killer_name.to_string(),
            victim_name: victim_name.to_string(),
        })
    }

    /// Sends a ping when none has gone out yet or the interval has passed.
    pub fn update_ping(&mut self) -> Result<bool, SessionError> {
        let now = self.clock.now_ms();
        let interval = self.config.ping_interval.as_millis() as u64;
        let due = self
            .last_ping_ms
            .is_none_or(|last| now.saturating_sub(last) > interval);
        if !due {
            return Ok(false);
        }

        self.last_ping_ms = Some(now);
        self.send(GameMessage::PingRequest { timestamp: now })?;
        Ok(true)
    }

    pub fn ping_ms(&self) -> Option<u64> {
        self.lock().ping_ms
    }

    pub fn remote_players(&self) -> Vec<RemotePlayer> {
        self.lock().remote_players.values().cloned().collect()
    }

    pub fn remote_player(&self, id: u32) -> Option<RemotePlayer> {
        self.lock().remote_players.get(&id).cloned()
    }

    pub fn remote_count(&self) -> usize {
        self.lock().remote_players.len()
    }

    /// Mirrors a hit we just asserted onto our view of the target so the
    /// next bullet in flight sees the reduced health.
    pub fn record_outgoing_hit(&self, target_id: u32, damage: f32, fatal: bool) {
        if let Some(target) = self.lock().remote_players.get_mut(&target_id) {
            target.health = (target.health - damage).max(0.0);
            if fatal {
                target.alive = false;
            }
        }
    }

    pub fn drain_inbound(&self) -> Vec<Inbound> {
        std::mem::take(&mut self.lock().inbound)
    }

    pub fn drain_events(&self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.lock().events)
    }

    pub fn stats(&self) -> NetworkStats {
        let mut stats = self.counters.snapshot();
        stats.rtt_ms = self.ping_ms();
        stats
    }

    /// Tears the session down. Safe to call repeatedly and from any point in
    /// the tick loop.
    pub fn close(&mut self) {
        if self.outbound.take().is_none() {
            return;
        }

        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        self.lock().clear();
        // Dropping the sender lets the writer flush and shut the socket.
        self.writer.take();

        log::info!("Session {} to {} closed", self.local_id, self.address);
    }

    fn lock(&self) -> MutexGuard<'_, SharedState> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for NetworkSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for NetworkSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkSession")
            .field("local_id", &self.local_id)
            .field("address", &self.address)
            .field("open", &self.outbound.is_some())
            .finish()
    }
}

async fn open(
    address: &ServerAddress,
    config: &ClientConfig,
) -> Result<(TcpStream, u32), SessionError> {
    let mut stream = TcpStream::connect((address.host.as_str(), address.port)).await?;
    stream.set_nodelay(true)?;

    match handshake(&mut stream, config).await {
        Ok(client_id) => Ok((stream, client_id)),
        Err(e) => {
            let _ = stream.shutdown().await;
            Err(e)
        }
    }
}

async fn handshake(stream: &mut TcpStream, config: &ClientConfig) -> Result<u32, SessionError> {
    let request = Packet::new(PacketType::ConnectionRequest {
        protocol_version: PROTOCOL_VERSION,
        registry_fingerprint: config.registry.fingerprint(),
    });
    write_packet(stream, &request).await?;

    let Some((reply, _)) = read_packet(stream).await? else {
        return Err(SessionError::Closed);
    };

    match reply.payload {
        PacketType::ConnectionAccepted { client_id } => Ok(client_id),
        PacketType::ConnectionDenied { reason } if reason == DENY_PROTOCOL_MISMATCH => {
            Err(SessionError::ProtocolMismatch)
        }
        PacketType::ConnectionDenied { reason } => Err(SessionError::Denied(reason)),
        _ => Err(SessionError::UnexpectedReply),
    }
}

async fn read_loop(
    mut reader: OwnedReadHalf,
    shared: Arc<Mutex<SharedState>>,
    counters: Arc<ConnectionCounters>,
    clock: Arc<dyn Clock>,
) {
    loop {
        match read_packet(&mut reader).await {
            Ok(Some((packet, len))) => {
                counters.record_received(len);
                let PacketType::Message(message) = packet.payload else {
                    log::debug!("Ignoring non-message packet from relay");
                    continue;
                };
                let now = clock.now_ms();
                shared
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .apply(message, now);
            }
            Ok(None) => {
                log::warn!("Relay closed the connection");
                break;
            }
            Err(e) => {
                log::warn!("Connection to relay lost: {}", e);
                break;
            }
        }
    }

    let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
    if state.connected {
        state.connected = false;
        state.events.push(SessionEvent::ConnectionLost);
    }
}

async fn write_loop(
    mut writer: OwnedWriteHalf,
    mut rx: mpsc::UnboundedReceiver<Vec<u8>>,
    shared: Arc<Mutex<SharedState>>,
    counters: Arc<ConnectionCounters>,
) {
    while let Some(frame) = rx.recv().await {
        if let Err(e) = write_frame(&mut writer, &frame).await {
            log::warn!("Failed to send to relay: {}", e);
            counters.record_dropped();
            shared
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .connected = false;
            break;
        }
    }
    let _ = writer.shutdown().await;
}
