use crate::net::GameMessage;

use super::config::HitDelivery;

#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    /// Every peer except the sender.
    Others,
    Everyone,
    Target(u32),
    /// Answer the sender directly; nothing is relayed.
    Reply(GameMessage),
    Drop,
}

/// Fan-out table of the relay. Stateless, so concurrent connection tasks can
/// call it freely.
pub fn route(message: &GameMessage, hit_delivery: HitDelivery) -> Route {
    match message {
        GameMessage::PlayerUpdate { .. }
        | GameMessage::BulletUpdate { .. }
        | GameMessage::KillFeed { .. } => Route::Others,
        GameMessage::PlayerHit { target_id, .. } => match hit_delivery {
            HitDelivery::Broadcast => Route::Everyone,
            HitDelivery::TargetOnly => Route::Target(*target_id),
        },
        GameMessage::PingRequest { timestamp } => Route::Reply(GameMessage::PingResponse {
            timestamp: *timestamp,
        }),
        // Relay-originated kinds are never accepted from clients.
        GameMessage::PingResponse { .. } | GameMessage::PlayerDisconnected { .. } => Route::Drop,
    }
}
