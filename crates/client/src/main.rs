mod bot;
mod stats;
mod summary;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use clap::Parser;
use tokio::time::MissedTickBehavior;

use skirmish::{
    Arena, ArenaConfig, ArenaEvent, ClientConfig, Clock, FixedTimestep, NetworkSession,
    SessionEvent, SystemClock, TestingGround,
};

use bot::BotBrain;
use stats::FrameStats;
use summary::{MatchSummary, TrafficSummary};

#[derive(Parser)]
#[command(name = "skirmish-client")]
#[command(about = "Headless skirmish player")]
struct Args {
    #[arg(short, long, help = "Relay address, e.g. 127.0.0.1:54555. Plays offline when omitted")]
    server: Option<String>,

    #[arg(short, long, default_value = "Bot")]
    name: String,

    #[arg(long, default_value_t = 30, help = "Seconds to play before exiting")]
    seconds: u64,

    #[arg(long, default_value_t = 60)]
    tick_rate: u32,

    #[arg(long, default_value_t = 20, help = "State publishes per second")]
    publish_rate: u32,

    #[arg(long, default_value_t = 20)]
    kill_limit: u32,

    #[arg(long, default_value_t = 600.0, help = "Distance at which the bot opens fire")]
    engage_range: f32,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, help = "Write a JSON match summary to this path")]
    summary: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());

    let config = ArenaConfig {
        kill_limit: args.kill_limit,
        ..ArenaConfig::default()
    };
    let mut arena = Arena::new(config, TestingGround::build(), Arc::clone(&clock), args.seed);
    arena.start_game(&args.name);

    if let Some(server) = &args.server {
        let client_config = ClientConfig {
            publish_rate: args.publish_rate,
            ..ClientConfig::default()
        };
        match NetworkSession::connect(server, client_config, Arc::clone(&clock)).await {
            Ok(session) => arena.attach_session(session),
            Err(e) => log::warn!("Could not join {}: {}. Playing offline", server, e),
        }
    }

    let stop = Arc::new(AtomicBool::new(false));
    let ctrl_c = Arc::clone(&stop);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.store(true, Ordering::SeqCst);
        }
    });

    let summary = play(&mut arena, &args, &stop).await;
    arena.close();

    match &args.summary {
        Some(path) => {
            summary.write_to(path)?;
            log::info!("Summary written to {}", path.display());
        }
        None => println!("{}", summary.to_json()?),
    }

    Ok(())
}

async fn play(arena: &mut Arena, args: &Args, stop: &AtomicBool) -> MatchSummary {
    let mut brain = BotBrain::new(args.seed.unwrap_or_else(rand::random), args.engage_range);
    let mut step = FixedTimestep::new(args.tick_rate);
    let mut frames = FrameStats::new();
    let mut deaths = 0;
    let mut shots_fired = 0;

    let mut ticker = tokio::time::interval(Duration::from_secs_f32(step.dt()));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let started = Instant::now();
    let deadline = started + Duration::from_secs(args.seconds);
    let mut last_frame = Instant::now();

    while !stop.load(Ordering::SeqCst) && Instant::now() < deadline {
        ticker.tick().await;

        let now = Instant::now();
        let dt = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;
        frames.record_frame(dt);

        step.accumulate(dt);
        while step.consume_tick() {
            let input = brain.think(arena);
            let loadout = arena.player().loadout();
            let before = (loadout.current_index(), loadout.current().current_ammo());
            arena.tick(step.dt(), &input);
            let loadout = arena.player().loadout();
            if loadout.current_index() == before.0 && loadout.current().current_ammo() < before.1 {
                shots_fired += 1;
            }
            frames.record_tick();
        }

        for event in arena.drain_events() {
            match event {
                ArenaEvent::Kill { victim_name, .. } => log::info!("Eliminated {}", victim_name),
                ArenaEvent::Died { source_id } => {
                    deaths += 1;
                    log::info!("Eliminated by player {}", source_id);
                }
                ArenaEvent::Respawned { position } => {
                    log::debug!("Back in at ({:.0}, {:.0})", position.x, position.y);
                }
                ArenaEvent::WentOffline => log::warn!("Relay gone, continuing offline"),
                ArenaEvent::Network(SessionEvent::PlayerJoined { id, username }) => {
                    log::info!("{} joined (player {})", username, id);
                }
                ArenaEvent::Network(SessionEvent::PlayerLeft { username, .. }) => {
                    log::info!("{} left", username);
                }
                ArenaEvent::Network(SessionEvent::Kill {
                    killer_name,
                    victim_name,
                    ..
                }) => log::info!("{} eliminated {}", killer_name, victim_name),
                ArenaEvent::Network(SessionEvent::ConnectionLost) => {}
            }
        }

        if let Some(winner) = arena.winner() {
            log::info!("{} reached {} kills", winner.username, winner.kills);
            break;
        }
    }

    log::info!(
        "Played {} ticks over {:.1}s ({:.0} fps)",
        frames.ticks(),
        started.elapsed().as_secs_f32(),
        frames.fps()
    );

    MatchSummary {
        username: arena.player().username().to_string(),
        local_id: arena.local_id(),
        online: arena.is_online(),
        duration_secs: started.elapsed().as_secs_f32(),
        ticks: frames.ticks(),
        kills: arena.player().kills(),
        deaths,
        shots_fired,
        leaderboard: arena.leaderboard(),
        winner: arena.winner(),
        traffic: arena.session().map(|s| TrafficSummary::from(s.stats())),
    }
}
