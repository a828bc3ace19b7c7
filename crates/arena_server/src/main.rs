//! Arena match server.
//!
//! Runs one room and speaks JSON lines over stdin/stdout, so a socket
//! gateway (or a test harness) can sit in front of it.
//!
//! # Usage
//!
//! ```bash
//! # Default settings, players 1 and 2
//! cargo run -p arena_server
//!
//! # Config file with overrides
//! cargo run -p arena_server -- --config server.ron --snapshot-rate 10 --countdown 0
//! ```
//!
//! # Protocol
//!
//! Input (stdin): `{"player":1,"command":{"type":"pickup"}}`, one per line
//! Output (stdout): `{"type":"snapshot","data":{...}}` or
//! `{"type":"event","data":{...}}`, one per line
//! Logs (stderr): controlled by `RUST_LOG`

use std::io::BufRead;
use std::path::PathBuf;

use arena_core::player::PlayerId;
use arena_server::{
    ClientMessage, RoomOutcome, RoomRegistry, ServerConfig, ServerError, ServerMessage,
};
use clap::Parser;
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "arena_server")]
#[command(about = "Authoritative match server for goal arena")]
#[command(version)]
struct Cli {
    /// Server config file (RON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the transport bind address
    #[arg(long)]
    bind: Option<String>,

    /// Override snapshots per second
    #[arg(long)]
    snapshot_rate: Option<u32>,

    /// Override the kick-off countdown in seconds
    #[arg(long)]
    countdown: Option<u32>,

    /// Override the tuning sheet
    #[arg(long)]
    tuning: Option<PathBuf>,

    /// Player seated on the left
    #[arg(long, default_value_t = 1)]
    first: u64,

    /// Player seated on the right
    #[arg(long, default_value_t = 2)]
    second: u64,
}

impl Cli {
    fn server_config(&self) -> Result<ServerConfig, ServerError> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)?,
            None => ServerConfig::default(),
        };
        if let Some(bind) = &self.bind {
            config.bind.clone_from(bind);
        }
        if let Some(rate) = self.snapshot_rate {
            config.snapshot_rate = rate;
        }
        if let Some(seconds) = self.countdown {
            config.match_config.countdown_seconds = seconds;
        }
        if let Some(path) = &self.tuning {
            config.tuning_path = Some(path.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = cli.server_config()?;
    let tuning = config.load_tuning()?;
    info!(bind = %config.bind, snapshot_rate = config.snapshot_rate, "starting arena server");

    let mut registry = RoomRegistry::new(config, tuning);
    let room = registry.open(PlayerId(cli.first), PlayerId(cli.second))?;
    let mut updates = registry.subscribe(room)?;

    // A plain thread: a blocked stdin read must not hold up runtime shutdown.
    let (line_tx, mut lines) = mpsc::channel::<String>(64);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line_tx.blocking_send(line).is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            line = lines.recv() => match line {
                Some(line) => forward(&registry, room, &line),
                None => {
                    info!("input closed");
                    break;
                }
            },
            update = updates.recv() => match update {
                Ok(message) => {
                    match message.to_json() {
                        Ok(json) => println!("{json}"),
                        Err(err) => warn!(%err, "failed to encode update"),
                    }
                    if matches!(&message, ServerMessage::Snapshot(s) if s.phase.is_over()) {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "output fell behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    for (id, outcome) in registry.shutdown_all().await {
        match outcome {
            RoomOutcome::Finished { winner, reason, ticks } => {
                info!(room = id, winner, %reason, ticks, "match finished");
            }
            RoomOutcome::Stopped { discarded, ticks } => {
                info!(room = id, discarded, ticks, "match stopped");
            }
        }
    }
    Ok(())
}

fn forward(registry: &RoomRegistry, room: u64, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }
    let result = ClientMessage::from_json(line)
        .and_then(|message| registry.submit(room, message.player, message.command));
    if let Err(err) = result {
        warn!(%err, "input rejected");
    }
}
