//! Match rooms.
//!
//! A room is a tokio task that owns one [`Simulation`] and nothing else
//! touches it. The outside world talks to the room through channels:
//!
//! - commands in through a bounded, order-preserving `mpsc` queue, drained
//!   at the start of each tick
//! - snapshots and events out through a `broadcast` channel
//! - a `watch` flag to stop the loop at the next tick boundary
//!
//! Ticks run on a fixed `tokio::time::interval`. If the task falls behind,
//! missed ticks are skipped rather than replayed in a burst.

use arena_core::commands::PlayerCommand;
use arena_core::data::Tuning;
use arena_core::player::PlayerId;
use arena_core::simulation::{MatchPhase, Simulation};
use arena_core::snapshot::{MatchEvent, WorldSnapshot};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, info_span, Instrument};

use crate::{Result, ServerConfig, ServerError};

/// Room identifier.
pub type RoomId = u64;

/// What a room broadcasts to its subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Full world state.
    Snapshot(WorldSnapshot),
    /// Something happened this tick.
    Event(MatchEvent),
}

impl ServerMessage {
    /// Encode for the wire.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A command as a client sends it: who issued it and what.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientMessage {
    /// Issuing player.
    pub player: PlayerId,
    /// The command.
    pub command: PlayerCommand,
}

impl ClientMessage {
    /// Decode from the wire.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// How a room's loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomOutcome {
    /// The match was decided.
    Finished {
        /// Winning seat.
        winner: u8,
        /// Why.
        reason: String,
        /// Ticks the room ran.
        ticks: u64,
    },
    /// The room was shut down first.
    Stopped {
        /// Commands still queued when it stopped.
        discarded: usize,
        /// Ticks the room ran.
        ticks: u64,
    },
}

/// Owner's side of a running room.
#[derive(Debug)]
pub struct RoomHandle {
    id: RoomId,
    commands: mpsc::Sender<(PlayerId, PlayerCommand)>,
    updates: broadcast::Sender<ServerMessage>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<RoomOutcome>,
}

impl RoomHandle {
    /// Room id.
    #[must_use]
    pub const fn id(&self) -> RoomId {
        self.id
    }

    /// Queue a command for the room's next tick.
    pub fn submit(&self, player: PlayerId, command: PlayerCommand) -> Result<()> {
        self.commands
            .try_send((player, command))
            .map_err(|err| match err {
                mpsc::error::TrySendError::Full(_) => ServerError::QueueFull(self.id),
                mpsc::error::TrySendError::Closed(_) => ServerError::RoomClosed(self.id),
            })
    }

    /// Decode a client's JSON command and queue it.
    pub fn submit_json(&self, player: PlayerId, json: &str) -> Result<()> {
        let command: PlayerCommand = serde_json::from_str(json)?;
        self.submit(player, command)
    }

    /// Receive snapshots and events from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.updates.subscribe()
    }

    /// Ask the room to stop at the next tick boundary.
    pub fn shutdown(&self) {
        // Fails only if the loop already ended.
        let _ = self.shutdown.send(true);
    }

    /// Whether the loop has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the loop to end.
    pub async fn join(self) -> Result<RoomOutcome> {
        let id = self.id;
        self.task.await.map_err(|_| ServerError::RoomClosed(id))
    }
}

/// Set up a match and start its room loop.
///
/// The match is validated here, so a bad configuration fails before any
/// task is spawned. Must be called from within a tokio runtime.
pub fn spawn_room(
    id: RoomId,
    config: &ServerConfig,
    tuning: Tuning,
    players: (PlayerId, PlayerId),
) -> Result<RoomHandle> {
    config.validate()?;
    let mut sim = Simulation::new(config.match_config.clone(), tuning, players.0, players.1)?;
    sim.start();

    let (commands, command_rx) = mpsc::channel(config.command_queue_limit);
    let (updates, _) = broadcast::channel(config.broadcast_capacity);
    let (shutdown, shutdown_rx) = watch::channel(false);

    let room = RoomLoop {
        id,
        sim,
        commands: command_rx,
        updates: updates.clone(),
        shutdown: shutdown_rx,
        period: config.tick_period(),
        snapshot_every: config.snapshot_every(),
    };
    let task = tokio::spawn(room.run().instrument(info_span!("room", id)));
    info!(room = id, first = %players.0, second = %players.1, "room opened");

    Ok(RoomHandle {
        id,
        commands,
        updates,
        shutdown,
        task,
    })
}

struct RoomLoop {
    id: RoomId,
    sim: Simulation,
    commands: mpsc::Receiver<(PlayerId, PlayerCommand)>,
    updates: broadcast::Sender<ServerMessage>,
    shutdown: watch::Receiver<bool>,
    period: std::time::Duration,
    snapshot_every: u64,
}

impl RoomLoop {
    async fn run(mut self) -> RoomOutcome {
        let mut interval = time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ticks: u64 = 0;

        loop {
            tokio::select! {
                biased;
                changed = self.shutdown.changed() => {
                    // A dropped handle also stops the room.
                    if changed.is_err() || *self.shutdown.borrow() {
                        return self.stop(ticks);
                    }
                    continue;
                }
                _ = interval.tick() => {}
            }

            self.drain_commands();
            let events = self.sim.tick();
            ticks += 1;

            // Send errors only mean nobody is listening.
            for event in events.broadcast() {
                let _ = self.updates.send(ServerMessage::Event(event));
            }
            let over = self.sim.phase().is_over();
            if over || ticks % self.snapshot_every == 0 {
                let _ = self.updates.send(ServerMessage::Snapshot(self.sim.snapshot()));
            }

            if let MatchPhase::GameOver { winner, reason } = self.sim.phase() {
                info!(room = self.id, winner, ticks, "room finished");
                return RoomOutcome::Finished {
                    winner: *winner,
                    reason: reason.clone(),
                    ticks,
                };
            }
        }
    }

    fn drain_commands(&mut self) {
        while let Ok((player, command)) = self.commands.try_recv() {
            let name = command.name();
            if let Err(err) = self.sim.queue_command(player, command) {
                debug!(room = self.id, %player, command = name, %err, "command refused");
            }
        }
    }

    fn stop(mut self, ticks: u64) -> RoomOutcome {
        self.commands.close();
        let mut discarded = 0;
        while self.commands.try_recv().is_ok() {
            discarded += 1;
        }
        info!(room = self.id, ticks, discarded, "room stopped");
        RoomOutcome::Stopped { discarded, ticks }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_json() {
        let message = ServerMessage::Event(MatchEvent::Death { actor_id: 4 });
        assert_eq!(
            message.to_json().unwrap(),
            r#"{"type":"event","data":{"type":"death","actorId":4}}"#
        );
    }

    #[test]
    fn test_client_message_json() {
        let message =
            ClientMessage::from_json(r#"{"player":2,"command":{"type":"drop"}}"#).unwrap();
        assert_eq!(message.player, PlayerId(2));
        assert_eq!(message.command, PlayerCommand::Drop);
        assert!(ClientMessage::from_json(r#"{"player":2}"#).is_err());
    }

    #[tokio::test]
    async fn test_bad_config_fails_before_spawning() {
        let config = ServerConfig {
            snapshot_rate: 0,
            ..ServerConfig::default()
        };
        let result = spawn_room(1, &config, Tuning::default(), (PlayerId(1), PlayerId(2)));
        assert!(matches!(result, Err(ServerError::Config(_))));
    }

    #[tokio::test]
    async fn test_same_player_twice_rejected() {
        let result = spawn_room(
            1,
            &ServerConfig::default(),
            Tuning::default(),
            (PlayerId(5), PlayerId(5)),
        );
        assert!(matches!(result, Err(ServerError::Game(_))));
    }

    #[tokio::test]
    async fn test_malformed_json_refused() {
        let room = spawn_room(
            2,
            &ServerConfig::default(),
            Tuning::default(),
            (PlayerId(1), PlayerId(2)),
        )
        .unwrap();
        let result = room.submit_json(PlayerId(1), r#"{"type":"teleport"}"#);
        assert!(matches!(result, Err(ServerError::MalformedCommand(_))));
        room.shutdown();
        assert!(matches!(room.join().await, Ok(RoomOutcome::Stopped { .. })));
    }
}
