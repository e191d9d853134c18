//! Lucky Seven server binary: wires the stores, the scheduler and the HTTP
//! surface together and runs until ctrl-c.

use clap::Parser;
use luckyseven::{
    api::ApiServer,
    clock::{Clock, SystemClock},
    config::AppConfig,
    dice::OsDiceRoller,
    game::{
        broadcast::EventBroadcaster, scheduler::RoundScheduler, service::GameService,
        settlement::SettlementEngine, PayoutTable,
    },
    store::{AccountStore, MemoryStore, RoundStore, WagerStore},
};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "luckyseven-server", about = "Lucky Seven dice game server")]
struct Cli {
    /// Path to a TOML config file; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the configured bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "luckyseven=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.validate()?;

    info!(
        "🎲 starting Lucky Seven (round every {}s, window {}s)",
        config.game.round_interval_secs, config.game.betting_window_secs
    );

    let store = Arc::new(MemoryStore::new());
    let rounds: Arc<dyn RoundStore> = store.clone();
    let wagers: Arc<dyn WagerStore> = store.clone();
    let accounts: Arc<dyn AccountStore> = store.clone();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let broadcaster = EventBroadcaster::new(config.game.event_buffer);

    let service = Arc::new(GameService::new(
        rounds.clone(),
        wagers.clone(),
        accounts.clone(),
        broadcaster.clone(),
        clock.clone(),
        config.game.clone(),
    ));

    let settlement = SettlementEngine::new(
        wagers,
        accounts,
        PayoutTable::new(
            config.game.lucky_seven_multiplier,
            config.game.standard_multiplier,
        ),
    );
    let scheduler = RoundScheduler::new(
        rounds,
        Arc::new(OsDiceRoller),
        settlement,
        broadcaster,
        clock,
        Duration::from_secs(config.game.round_interval_secs),
    );
    scheduler.start().await?;

    ApiServer::new(config.server.clone(), service).run().await?;

    // The HTTP server has drained; let an in-flight cycle finish too.
    scheduler.shutdown().await;
    info!("goodbye");
    Ok(())
}
