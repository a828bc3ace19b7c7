//! # Arena Match Server
//!
//! Hosts matches for networked clients.
//!
//! Each match lives in a room: one tokio task that owns a
//! [`Simulation`](arena_core::simulation::Simulation), ticks it at the
//! configured rate, takes commands from an ordered queue and broadcasts
//! snapshots and events. The transport that carries those to clients sits
//! outside this crate.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod lobby;
pub mod room;

use std::path::{Path, PathBuf};
use std::time::Duration;

use arena_core::config::MatchConfig;
use arena_core::data::Tuning;
use arena_core::error::GameError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use lobby::RoomRegistry;
pub use room::{spawn_room, ClientMessage, RoomHandle, RoomId, RoomOutcome, ServerMessage};

/// Server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Server settings are unusable.
    #[error("invalid server config: {0}")]
    Config(String),

    /// The match could not be set up.
    #[error(transparent)]
    Game(#[from] GameError),

    /// A client sent something that is not a command.
    #[error("malformed command: {0}")]
    MalformedCommand(#[from] serde_json::Error),

    /// The room no longer accepts commands.
    #[error("room {0} is closed")]
    RoomClosed(RoomId),

    /// No room with that id.
    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    /// The room's command queue is full.
    #[error("command queue for room {0} is full")]
    QueueFull(RoomId),
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Server configuration.
///
/// # Example RON
///
/// ```ron
/// ServerConfig(
///     bind: "0.0.0.0:7777",
///     snapshot_rate: 20,
///     match_config: MatchConfig(countdown_seconds: 5),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the transport listens on.
    pub bind: String,
    /// Snapshots broadcast per second.
    pub snapshot_rate: u32,
    /// Commands a room buffers before refusing more.
    pub command_queue_limit: usize,
    /// Events and snapshots buffered per subscriber.
    pub broadcast_capacity: usize,
    /// Settings for every match.
    pub match_config: MatchConfig,
    /// Tuning sheet to load instead of the built-in one.
    pub tuning_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:7777".to_string(),
            snapshot_rate: 20,
            command_queue_limit: 256,
            broadcast_capacity: 256,
            match_config: MatchConfig::default(),
            tuning_path: None,
        }
    }
}

impl ServerConfig {
    /// Parse from RON; missing fields take their defaults.
    pub fn from_ron_str(ron_text: &str) -> Result<Self> {
        let config: Self =
            ron::from_str(ron_text).map_err(|e| ServerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a RON file.
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_ron_str(&read(path)?)
    }

    /// Reject settings a room cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.match_config.validate()?;
        if self.snapshot_rate == 0 || self.snapshot_rate > self.match_config.tick_rate {
            return Err(ServerError::Config(format!(
                "snapshot_rate must be between 1 and the tick rate ({})",
                self.match_config.tick_rate
            )));
        }
        if self.command_queue_limit == 0 || self.broadcast_capacity == 0 {
            return Err(ServerError::Config(
                "queue and broadcast capacities must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Real time between ticks.
    #[must_use]
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs(1) / self.match_config.tick_rate.max(1)
    }

    /// Ticks between snapshots.
    #[must_use]
    pub fn snapshot_every(&self) -> u64 {
        u64::from((self.match_config.tick_rate / self.snapshot_rate.max(1)).max(1))
    }

    /// The configured tuning sheet, or the built-in one.
    pub fn load_tuning(&self) -> Result<Tuning> {
        match &self.tuning_path {
            Some(path) => {
                let text = read(path)?;
                Ok(Tuning::from_ron_str(&path.display().to_string(), &text)?)
            }
            None => Ok(Tuning::default()),
        }
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| ServerError::Io {
        path: path.to_path_buf(),
        source,
    })
}
