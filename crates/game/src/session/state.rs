use std::collections::BTreeMap;
use std::sync::Arc;

use glam::Vec2;

use crate::net::GameMessage;
use crate::player::{AvatarAsset, RemotePlayer};

use super::events::{Inbound, SessionEvent};

/// State written by the receive task and read by the tick loop. Always
/// accessed under the session's mutex.
#[derive(Debug)]
pub(crate) struct SharedState {
    pub local_id: u32,
    pub remote_players: BTreeMap<u32, RemotePlayer>,
    pub inbound: Vec<Inbound>,
    pub events: Vec<SessionEvent>,
    pub ping_ms: Option<u64>,
    pub connected: bool,
    pub avatar: Option<Arc<AvatarAsset>>,
}

impl SharedState {
    pub fn new(local_id: u32, avatar: Option<Arc<AvatarAsset>>) -> Self {
        Self {
            local_id,
            remote_players: BTreeMap::new(),
            inbound: Vec::new(),
            events: Vec::new(),
            ping_ms: None,
            connected: true,
            avatar,
        }
    }

    /// Merges one relayed message. Never removes bullets or applies damage
    /// itself; those are queued for the tick loop. Ignored once the session
    /// has been torn down.
    pub fn apply(&mut self, message: GameMessage, now_ms: u64) {
        if !self.connected {
            return;
        }
        match message {
            GameMessage::PlayerUpdate {
                id,
                x,
                y,
                alive,
                health,
                rotation,
                username,
                kills,
            } => {
                if id == self.local_id {
                    return;
                }
                if !self.remote_players.contains_key(&id) {
                    log::debug!("Player {} ({}) appeared", id, username);
                    self.events.push(SessionEvent::PlayerJoined {
                        id,
                        username: username.clone(),
                    });
                    self.remote_players
                        .insert(id, RemotePlayer::new(id, self.avatar.clone()));
                }
                if let Some(remote) = self.remote_players.get_mut(&id) {
                    remote.apply_update(x, y, alive, health, rotation, &username, kills);
                }
            }
            GameMessage::BulletUpdate {
                player_id,
                x,
                y,
                dir_x,
                dir_y,
                damage,
            } => {
                if player_id == self.local_id {
                    return;
                }
                self.inbound.push(Inbound::BulletFired {
                    owner_id: player_id,
                    origin: Vec2::new(x, y),
                    velocity: Vec2::new(dir_x, dir_y),
                    damage,
                });
            }
            GameMessage::PlayerHit {
                source_id,
                target_id,
                damage,
                fatal,
                new_kill_count,
            } => {
                if source_id == self.local_id {
                    return;
                }

                if target_id == self.local_id {
                    self.inbound.push(Inbound::Hit {
                        source_id,
                        damage,
                        fatal,
                    });
                } else if let Some(target) = self.remote_players.get_mut(&target_id) {
                    target.health = (target.health - damage).max(0.0);
                    if fatal {
                        target.alive = false;
                    }
                }

                if fatal {
                    if let Some(killer) = self.remote_players.get_mut(&source_id) {
                        killer.kills = if new_kill_count > 0 {
                            new_kill_count
                        } else {
                            killer.kills + 1
                        };
                    }
                }
            }
            GameMessage::PingResponse { timestamp } => {
                self.ping_ms = Some(now_ms.saturating_sub(timestamp));
            }
            GameMessage::PlayerDisconnected { id } => {
                if let Some(remote) = self.remote_players.remove(&id) {
                    log::debug!("Player {} ({}) left", id, remote.username);
                    self.events.push(SessionEvent::PlayerLeft {
                        id,
                        username: remote.username,
                    });
                }
            }
            GameMessage::KillFeed {
                killer_id,
                victim_id,
                killer_name,
                victim_name,
            } => {
                if killer_id == self.local_id {
                    return;
                }
                self.events.push(SessionEvent::Kill {
                    killer_id,
                    victim_id,
                    killer_name,
                    victim_name,
                });
            }
            GameMessage::PingRequest { .. } => {}
        }
    }

    pub fn clear(&mut self) {
        self.remote_players.clear();
        self.inbound.clear();
        self.avatar = None;
        self.connected = false;
    }
}
