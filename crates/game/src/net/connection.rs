use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Notify, mpsc};

use super::protocol::DENY_SERVER_FULL;
use super::stats::{ConnectionCounters, NetworkStats};

pub type FrameSender = mpsc::Sender<Arc<[u8]>>;

/// Result of queueing one frame for a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Queued,
    /// The peer's queue is full; the frame was dropped.
    Backlogged,
    Closed,
}

/// Outcome of handing one frame to a set of peers.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FanOut {
    pub delivered: usize,
    pub backlogged: Vec<u32>,
}

impl FanOut {
    fn push(&mut self, client_id: u32, delivery: Delivery) {
        match delivery {
            Delivery::Queued => self.delivered += 1,
            Delivery::Backlogged => self.backlogged.push(client_id),
            Delivery::Closed => {}
        }
    }
}

#[derive(Debug)]
pub struct ClientConnection {
    pub addr: SocketAddr,
    pub client_id: u32,
    pub connected_at: Instant,
    sender: FrameSender,
    counters: Arc<ConnectionCounters>,
    closed: Arc<Notify>,
}

impl ClientConnection {
    pub fn new(
        addr: SocketAddr,
        client_id: u32,
        sender: FrameSender,
        counters: Arc<ConnectionCounters>,
        closed: Arc<Notify>,
    ) -> Self {
        Self {
            addr,
            client_id,
            connected_at: Instant::now(),
            sender,
            counters,
            closed,
        }
    }

    /// Queues a frame for the writer task without waiting. A peer that stops
    /// reading fills its queue and every further frame is dropped.
    pub fn send(&self, frame: Arc<[u8]>) -> Delivery {
        match self.sender.try_send(frame) {
            Ok(()) => Delivery::Queued,
            Err(TrySendError::Full(_)) => {
                self.counters.record_dropped();
                Delivery::Backlogged
            }
            Err(TrySendError::Closed(_)) => {
                self.counters.record_dropped();
                Delivery::Closed
            }
        }
    }

    pub fn close(&self) {
        self.closed.notify_one();
    }

    pub fn uptime(&self) -> Duration {
        self.connected_at.elapsed()
    }

    pub fn stats(&self) -> NetworkStats {
        self.counters.snapshot()
    }
}

/// Registry of live relay connections keyed by server-assigned id. Ids start
/// at 1 and are never reused within a relay's lifetime.
#[derive(Debug)]
pub struct ConnectionManager {
    clients: BTreeMap<u32, ClientConnection>,
    next_client_id: u32,
    max_clients: usize,
}

impl ConnectionManager {
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: BTreeMap::new(),
            next_client_id: 1,
            max_clients,
        }
    }

    pub fn reserve_id(&mut self) -> Result<u32, &'static str> {
        if self.clients.len() >= self.max_clients {
            return Err(DENY_SERVER_FULL);
        }
        let client_id = self.next_client_id;
        self.next_client_id += 1;
        Ok(client_id)
    }

    pub fn insert(&mut self, connection: ClientConnection) {
        self.clients.insert(connection.client_id, connection);
    }

    pub fn get(&self, client_id: u32) -> Option<&ClientConnection> {
        self.clients.get(&client_id)
    }

    pub fn remove(&mut self, client_id: u32) -> Option<ClientConnection> {
        self.clients.remove(&client_id)
    }

    pub fn contains(&self, client_id: u32) -> bool {
        self.clients.contains_key(&client_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClientConnection> {
        self.clients.values()
    }

    pub fn total_count(&self) -> usize {
        self.clients.len()
    }

    pub fn max_clients(&self) -> usize {
        self.max_clients
    }

    pub fn send_to(&self, client_id: u32, frame: &Arc<[u8]>) -> FanOut {
        fan_out(self.clients.get(&client_id), frame)
    }

    pub fn broadcast(&self, frame: &Arc<[u8]>) -> FanOut {
        fan_out(self.clients.values(), frame)
    }

    pub fn broadcast_except(&self, except: u32, frame: &Arc<[u8]>) -> FanOut {
        fan_out(
            self.clients.values().filter(|c| c.client_id != except),
            frame,
        )
    }
}

fn fan_out<'a>(
    targets: impl IntoIterator<Item = &'a ClientConnection>,
    frame: &Arc<[u8]>,
) -> FanOut {
    let mut result = FanOut::default();
    for connection in targets {
        result.push(connection.client_id, connection.send(Arc::clone(frame)));
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connect(manager: &mut ConnectionManager) -> (u32, mpsc::Receiver<Arc<[u8]>>) {
        connect_with_queue(manager, 16)
    }

    fn connect_with_queue(
        manager: &mut ConnectionManager,
        capacity: usize,
    ) -> (u32, mpsc::Receiver<Arc<[u8]>>) {
        let id = manager.reserve_id().unwrap();
        let (tx, rx) = mpsc::channel(capacity);
        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        manager.insert(ClientConnection::new(
            addr,
            id,
            tx,
            Arc::default(),
            Arc::default(),
        ));
        (id, rx)
    }

    #[test]
    fn ids_start_at_one_and_respect_capacity() {
        let mut manager = ConnectionManager::new(2);
        let (a, _ra) = connect(&mut manager);
        let (b, _rb) = connect(&mut manager);
        assert_eq!((a, b), (1, 2));
        assert_eq!(manager.reserve_id(), Err("Server full"));

        manager.remove(a);
        let (c, _rc) = connect(&mut manager);
        assert_eq!(c, 3);
    }

    #[test]
    fn broadcast_skips_sender() {
        let mut manager = ConnectionManager::new(8);
        let (a, mut ra) = connect(&mut manager);
        let (_b, mut rb) = connect(&mut manager);
        let (_c, mut rc) = connect(&mut manager);

        let frame: Arc<[u8]> = Arc::from(&b"hello"[..]);
        assert_eq!(manager.broadcast_except(a, &frame).delivered, 2);
        assert!(ra.try_recv().is_err());
        assert_eq!(&*rb.try_recv().unwrap(), b"hello");
        assert_eq!(&*rc.try_recv().unwrap(), b"hello");
    }

    #[test]
    fn closed_writer_counts_drop() {
        let mut manager = ConnectionManager::new(8);
        let (a, ra) = connect(&mut manager);
        drop(ra);

        let frame: Arc<[u8]> = Arc::from(&b"x"[..]);
        assert_eq!(manager.send_to(a, &frame), FanOut::default());
        assert_eq!(manager.get(a).unwrap().stats().packets_dropped, 1);
    }

    #[test]
    fn full_queue_reports_backlog() {
        let mut manager = ConnectionManager::new(8);
        let (a, _ra) = connect(&mut manager);
        let (stalled, mut rs) = connect_with_queue(&mut manager, 1);

        let frame: Arc<[u8]> = Arc::from(&b"tick"[..]);
        assert_eq!(manager.broadcast_except(a, &frame).delivered, 1);

        let second = manager.broadcast(&frame);
        assert_eq!(second.delivered, 1);
        assert_eq!(second.backlogged, vec![stalled]);
        assert_eq!(manager.get(stalled).unwrap().stats().packets_dropped, 1);

        rs.try_recv().unwrap();
        assert_eq!(manager.send_to(stalled, &frame).delivered, 1);
    }
}
