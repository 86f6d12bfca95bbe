mod tui;

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use skirmish::relay::{HitDelivery, RelayConfig, RelayHandle, RelayServer};
use tui::TuiState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum HitDeliveryArg {
    Broadcast,
    TargetOnly,
}

impl From<HitDeliveryArg> for HitDelivery {
    fn from(arg: HitDeliveryArg) -> Self {
        match arg {
            HitDeliveryArg::Broadcast => HitDelivery::Broadcast,
            HitDeliveryArg::TargetOnly => HitDelivery::TargetOnly,
        }
    }
}

#[derive(Parser)]
#[command(name = "skirmish-relay")]
#[command(about = "Skirmish arena relay")]
struct Args {
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    #[arg(short, long, default_value_t = skirmish::DEFAULT_PORT)]
    port: u16,

    #[arg(short, long, default_value_t = 32)]
    max_clients: usize,

    #[arg(long, value_enum, default_value_t = HitDeliveryArg::Broadcast, help = "Who receives relayed hits")]
    hit_delivery: HitDeliveryArg,

    #[arg(long, default_value_t = 5000, help = "Handshake timeout in ms")]
    handshake_timeout: u64,

    #[arg(long, default_value_t = 256, help = "Frames queued per client before it is dropped")]
    send_queue: usize,

    #[arg(long)]
    headless: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = RelayConfig {
        bind_addr: format!("{}:{}", args.bind, args.port),
        max_clients: args.max_clients,
        hit_delivery: args.hit_delivery.into(),
        handshake_timeout: Duration::from_millis(args.handshake_timeout),
        send_queue_capacity: args.send_queue,
        ..RelayConfig::default()
    };

    if args.headless {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let server = RelayServer::bind(config)
        .await
        .context("failed to start relay")?;
    let handle = server.handle();

    if args.headless {
        log::info!(
            "Relay started on {} (hits: {})",
            server.local_addr(),
            handle.config().hit_delivery
        );
        let ctrl_c = handle.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                ctrl_c.shutdown();
            }
        });
        server.run().await?;
        log::info!("Relay stopped");
    } else {
        let relay = tokio::spawn(server.run());
        let result = run_with_tui(&handle).await;
        handle.shutdown();
        relay.await??;
        result?;
    }

    Ok(())
}

async fn run_with_tui(handle: &RelayHandle) -> io::Result<()> {
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut tui_state = TuiState::new();
    tui_state.log_info(format!(
        "Hit delivery: {}, max clients: {}",
        handle.config().hit_delivery,
        handle.config().max_clients
    ));

    let mut frame_timer = tokio::time::interval(Duration::from_millis(50));
    while handle.is_running() && !tui_state.should_quit() {
        frame_timer.tick().await;

        for event in handle.drain_events() {
            tui_state.record(event);
        }

        if let Some(client_id) = tui_state.take_pending_kick() {
            if handle.kick(client_id).await {
                tui_state.log_warn(format!("Kicked client {}", client_id));
            }
        }

        let clients = handle.client_infos().await;
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    tui_state.handle_key(key.code, key.modifiers, &clients);
                }
            }
        }

        let stats = handle.stats().await;
        terminal.draw(|frame| {
            tui::render(frame, &tui_state, &stats, &clients);
        })?;
    }

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)?;

    Ok(())
}
