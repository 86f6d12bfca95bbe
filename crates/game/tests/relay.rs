use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use glam::Vec2;
use skirmish::net::DENY_SERVER_FULL;
use skirmish::relay::RelayEvent;
use skirmish::simulation::OFFLINE_ID;
use skirmish::{
    Arena, ArenaConfig, ArenaEvent, ArenaMap, ClientConfig, Clock, HitDelivery, ManualClock,
    MessageKind, MessageRegistry, NetworkSession, PlayerConfig, PlayerInput, PlayerState,
    RelayConfig, RelayHandle, RelayServer, SessionError, SessionEvent, SystemClock,
};

async fn start_relay(max_clients: usize) -> (SocketAddr, RelayHandle) {
    start_relay_with(RelayConfig {
        max_clients,
        ..RelayConfig::default()
    })
    .await
}

async fn start_relay_with(config: RelayConfig) -> (SocketAddr, RelayHandle) {
    let config = RelayConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        ..config
    };
    let server = RelayServer::bind(config).await.unwrap();
    let addr = server.local_addr();
    let handle = server.handle();
    tokio::spawn(server.run());
    (addr, handle)
}

async fn connect(addr: SocketAddr) -> NetworkSession {
    connect_with(addr, ClientConfig::default()).await.unwrap()
}

async fn connect_with(
    addr: SocketAddr,
    config: ClientConfig,
) -> Result<NetworkSession, SessionError> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    NetworkSession::connect(&format!("127.0.0.1:{}", addr.port()), config, clock).await
}

/// An arena on an open map, standing at `position` and attached to the relay.
async fn online_arena(
    addr: SocketAddr,
    name: &str,
    position: Vec2,
    clock: Arc<ManualClock>,
) -> Arena {
    let mut arena = Arena::new(
        ArenaConfig::default(),
        ArenaMap::open(1600.0, 1200.0),
        clock,
        Some(17),
    );
    arena.start_game(name);
    arena.player_mut().set_position(position);
    arena.attach_session(connect(addr).await);
    arena
}

/// Ticks without advancing time until the local player's health matches.
async fn settle_health(arena: &mut Arena, expected: f32) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < Duration::from_secs(2) {
        arena.tick(0.0, &PlayerInput::idle());
        if arena.player().health() == expected {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}

async fn wait_for(mut condition: impl FnMut() -> bool, timeout_ms: u64) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < Duration::from_millis(timeout_ms) {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

#[tokio::test]
async fn test_player_update_reaches_peer() {
    let (addr, handle) = start_relay(8).await;
    let alice = connect(addr).await;
    let bob = connect(addr).await;
    assert_ne!(alice.local_id(), bob.local_id());
    assert!(alice.local_id() >= 1);

    let mut player = PlayerState::new(PlayerConfig::default(), Vec2::new(120.0, 340.0), "alice");
    player.set_rotation(45.0);
    player.set_kills(3);
    alice.send_player_update(&player).unwrap();

    let alice_id = alice.local_id();
    assert!(wait_for(|| bob.remote_player(alice_id).is_some(), 2000).await);

    let remote = bob.remote_player(alice_id).unwrap();
    assert_eq!(remote.position, Vec2::new(120.0, 340.0));
    assert_eq!(remote.username, "alice");
    assert_eq!(remote.health, 100.0);
    assert_eq!(remote.rotation, 45.0);
    assert_eq!(remote.kills, 3);
    assert!(remote.alive);
    assert!(remote.avatar().is_some());
    assert_eq!(
        bob.drain_events(),
        vec![SessionEvent::PlayerJoined {
            id: alice_id,
            username: "alice".to_string(),
        }]
    );

    // The sender never sees itself.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(alice.remote_count(), 0);

    handle.shutdown();
}

#[tokio::test]
async fn test_ping_round_trip() {
    let (addr, handle) = start_relay(8).await;
    let mut session = connect(addr).await;

    assert!(session.update_ping().unwrap());
    assert!(!session.update_ping().unwrap());
    assert!(wait_for(|| session.ping_ms().is_some(), 2000).await);
    assert!(session.stats().rtt_ms.is_some());

    handle.shutdown();
}

#[tokio::test]
async fn test_disconnect_is_broadcast() {
    let (addr, handle) = start_relay(8).await;
    let mut alice = connect(addr).await;
    let bob = connect(addr).await;
    let alice_id = alice.local_id();

    let player = PlayerState::new(PlayerConfig::default(), Vec2::new(50.0, 50.0), "alice");
    alice.send_player_update(&player).unwrap();
    assert!(wait_for(|| bob.remote_player(alice_id).is_some(), 2000).await);
    bob.drain_events();

    alice.close();
    alice.close();
    assert!(!alice.is_connected());
    assert!(wait_for(|| bob.remote_player(alice_id).is_none(), 2000).await);
    assert_eq!(
        bob.drain_events(),
        vec![SessionEvent::PlayerLeft {
            id: alice_id,
            username: "alice".to_string(),
        }]
    );

    assert!(
        wait_for(
            || {
                handle.drain_events().iter().any(|e| {
                    matches!(e, RelayEvent::ClientDisconnected { client_id, .. } if *client_id == alice_id)
                })
            },
            2000,
        )
        .await
    );
    handle.shutdown();
}

#[tokio::test]
async fn test_hit_lowers_target_health() {
    let (addr, handle) = start_relay(8).await;
    let shooter = connect(addr).await;
    let target = connect(addr).await;
    let target_id = target.local_id();

    let clock = Arc::new(ManualClock::new(10_000));
    let mut arena = Arena::new(
        ArenaConfig::default(),
        ArenaMap::open(1600.0, 1200.0),
        clock,
        Some(3),
    );
    arena.start_game("bob");
    arena.attach_session(target);
    assert_eq!(arena.local_id(), target_id);

    shooter.send_player_hit(target_id, 6.0, false, 0).unwrap();

    let start = std::time::Instant::now();
    while arena.player().health() == 100.0 && start.elapsed() < Duration::from_secs(2) {
        arena.tick(0.016, &PlayerInput::idle());
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(arena.player().health(), 94.0);
    assert!(arena.player().is_alive());

    // A second pass over the same hit never re-applies it.
    arena.tick(0.016, &PlayerInput::idle());
    assert_eq!(arena.player().health(), 94.0);

    handle.shutdown();
}

#[tokio::test]
async fn test_bullet_replicates_to_peer() {
    let (addr, handle) = start_relay(8).await;
    let shooter = connect(addr).await;
    let shooter_id = shooter.local_id();
    let observer = connect(addr).await;

    let clock = Arc::new(ManualClock::new(0));
    let mut arena = Arena::new(
        ArenaConfig::default(),
        ArenaMap::open(1600.0, 1200.0),
        clock,
        Some(9),
    );
    arena.attach_session(observer);

    shooter
        .send_bullet_shot(Vec2::new(10.0, 600.0), Vec2::new(900.0, 0.0), 20.0)
        .unwrap();

    let start = std::time::Instant::now();
    while arena.bullets().is_empty() && start.elapsed() < Duration::from_secs(2) {
        arena.tick(0.0, &PlayerInput::idle());
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let bullet = &arena.bullets()[0];
    assert_eq!(bullet.owner_id(), shooter_id);
    assert_eq!(bullet.velocity(), Vec2::new(900.0, 0.0));
    assert_eq!(bullet.damage(), 20.0);

    handle.shutdown();
}

#[tokio::test]
async fn test_broadcast_address_rejected() {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let result = NetworkSession::connect("192.168.1.255", ClientConfig::default(), clock).await;
    assert!(matches!(result, Err(SessionError::BroadcastAddress(_))));
}

#[tokio::test]
async fn test_registry_mismatch_denied() {
    let (addr, handle) = start_relay(8).await;

    let mut registry = MessageRegistry::empty();
    registry
        .register(MessageKind::PlayerUpdate)
        .register(MessageKind::PingRequest);
    let config = ClientConfig {
        registry,
        ..ClientConfig::default()
    };

    let result = connect_with(addr, config).await;
    assert!(matches!(result, Err(SessionError::ProtocolMismatch)));
    handle.shutdown();
}

#[tokio::test]
async fn test_server_full_denied() {
    let (addr, handle) = start_relay(1).await;
    let _first = connect(addr).await;

    let result = connect_with(addr, ClientConfig::default()).await;
    match result {
        Err(SessionError::Denied(reason)) => assert_eq!(reason, DENY_SERVER_FULL),
        other => panic!("expected denial, got {:?}", other),
    }
    assert_eq!(handle.stats().await.client_count, 1);
    handle.shutdown();
}

#[tokio::test]
async fn test_kick_drops_client() {
    let (addr, handle) = start_relay(8).await;
    let session = connect(addr).await;
    let id = session.local_id();

    assert_eq!(handle.client_infos().await.len(), 1);
    assert!(handle.kick(id).await);
    assert!(!handle.kick(id).await);

    assert!(wait_for(|| !session.is_connected(), 2000).await);
    assert_eq!(session.drain_events(), vec![SessionEvent::ConnectionLost]);
    assert_eq!(handle.stats().await.client_count, 0);
    handle.shutdown();
}

#[tokio::test]
async fn test_rifle_fire_kills_once() {
    let (addr, handle) = start_relay(8).await;
    let observer = connect(addr).await;

    let shooter_clock = Arc::new(ManualClock::new(10_000));
    let mut shooter =
        online_arena(addr, "alice", Vec2::new(200.0, 600.0), shooter_clock.clone()).await;
    let target_position = Vec2::new(230.0, 600.0);
    let mut target = online_arena(
        addr,
        "bob",
        target_position,
        Arc::new(ManualClock::new(10_000)),
    )
    .await;
    let shooter_id = shooter.local_id();
    let target_id = target.local_id();

    assert!(
        wait_for(
            || {
                shooter.tick(0.0, &PlayerInput::idle());
                shooter.remote_players().iter().any(|r| r.id == target_id)
            },
            2000,
        )
        .await
    );

    for shot in 1..=17 {
        shooter_clock.advance(200);
        shooter.tick(0.016, &PlayerInput::firing_at(target_position));

        let expected = (100.0 - 6.0 * shot as f32).max(0.0);
        assert!(
            settle_health(&mut target, expected).await,
            "shot {} left health at {}",
            shot,
            target.player().health()
        );
        if shot == 1 {
            assert_eq!(target.player().health(), 94.0);
            assert!(target.player().is_alive());
        }
        if shot < 17 {
            assert_eq!(shooter.player().kills(), 0);
        }
    }

    assert_eq!(target.player().health(), 0.0);
    assert!(!target.player().is_alive());
    assert_eq!(shooter.player().kills(), 1);
    assert!(shooter.drain_events().iter().any(|e| matches!(
        e,
        ArenaEvent::Kill { victim_id, victim_name, .. } if *victim_id == target_id && victim_name == "bob"
    )));
    assert!(
        target
            .drain_events()
            .contains(&ArenaEvent::Died { source_id: shooter_id })
    );

    // The corpse is no longer a target.
    shooter_clock.advance(200);
    shooter.tick(0.016, &PlayerInput::firing_at(target_position));
    assert_eq!(shooter.player().kills(), 1);

    let mut seen = Vec::new();
    assert!(
        wait_for(
            || {
                seen.extend(observer.drain_events());
                seen.contains(&SessionEvent::Kill {
                    killer_id: shooter_id,
                    victim_id: target_id,
                    killer_name: "alice".to_string(),
                    victim_name: "bob".to_string(),
                })
            },
            2000,
        )
        .await
    );
    assert!(
        wait_for(
            || observer.remote_player(shooter_id).is_some_and(|r| r.kills == 1),
            2000
        )
        .await
    );

    handle.shutdown();
}

#[tokio::test]
async fn test_target_only_hit_delivery() {
    let (addr, handle) = start_relay_with(RelayConfig {
        hit_delivery: HitDelivery::TargetOnly,
        ..RelayConfig::default()
    })
    .await;
    let shooter = connect(addr).await;
    let bystander = connect(addr).await;
    let mut target = online_arena(
        addr,
        "bob",
        Vec2::new(400.0, 400.0),
        Arc::new(ManualClock::new(10_000)),
    )
    .await;
    let target_id = target.local_id();
    assert!(wait_for(|| bystander.remote_player(target_id).is_some(), 2000).await);

    shooter.send_player_hit(target_id, 6.0, false, 0).unwrap();
    assert!(settle_health(&mut target, 94.0).await);

    // Relayed after the hit, so the bystander has had its chance to see it.
    let player = PlayerState::new(PlayerConfig::default(), Vec2::new(10.0, 10.0), "alice");
    shooter.send_player_update(&player).unwrap();
    let shooter_id = shooter.local_id();
    assert!(wait_for(|| bystander.remote_player(shooter_id).is_some(), 2000).await);

    assert_eq!(bystander.remote_player(target_id).unwrap().health, 100.0);
    handle.shutdown();
}

#[tokio::test]
async fn test_own_bullets_harmless_after_relay_loss() {
    let (addr, handle) = start_relay(8).await;
    let position = Vec2::new(600.0, 600.0);
    let mut arena = online_arena(addr, "alice", position, Arc::new(ManualClock::new(10_000))).await;
    let id = arena.local_id();

    // A zero step keeps the fresh bullet overlapping its owner.
    arena.tick(0.0, &PlayerInput::firing_at(position + Vec2::new(200.0, 0.0)));
    assert_eq!(arena.bullets().len(), 1);
    assert_eq!(arena.bullets()[0].owner_id(), id);

    assert!(handle.kick(id).await);
    let mut events = Vec::new();
    assert!(
        wait_for(
            || {
                arena.tick(0.0, &PlayerInput::idle());
                events.extend(arena.drain_events());
                events.contains(&ArenaEvent::WentOffline)
            },
            2000,
        )
        .await
    );

    assert_eq!(arena.local_id(), OFFLINE_ID);
    assert_eq!(arena.bullets().len(), 1);
    assert_eq!(arena.bullets()[0].owner_id(), OFFLINE_ID);
    arena.tick(0.0, &PlayerInput::idle());
    assert_eq!(arena.player().health(), 100.0);
    handle.shutdown();
}
