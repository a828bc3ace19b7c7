//! Room registry.

use std::collections::BTreeMap;

use arena_core::commands::PlayerCommand;
use arena_core::data::Tuning;
use arena_core::player::PlayerId;
use tokio::sync::broadcast;
use tracing::info;

use crate::room::{spawn_room, RoomHandle, RoomId, RoomOutcome, ServerMessage};
use crate::{Result, ServerConfig, ServerError};

/// Every open room, by id.
#[derive(Debug)]
pub struct RoomRegistry {
    config: ServerConfig,
    tuning: Tuning,
    rooms: BTreeMap<RoomId, RoomHandle>,
    next_id: RoomId,
}

impl RoomRegistry {
    /// Registry whose rooms share one configuration and tuning sheet.
    #[must_use]
    pub fn new(config: ServerConfig, tuning: Tuning) -> Self {
        Self {
            config,
            tuning,
            rooms: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Open a room for two players and start its match.
    pub fn open(&mut self, first: PlayerId, second: PlayerId) -> Result<RoomId> {
        let id = self.next_id;
        let handle = spawn_room(id, &self.config, self.tuning.clone(), (first, second))?;
        self.next_id += 1;
        self.rooms.insert(id, handle);
        Ok(id)
    }

    /// Look up a room.
    pub fn get(&self, id: RoomId) -> Result<&RoomHandle> {
        self.rooms.get(&id).ok_or(ServerError::RoomNotFound(id))
    }

    /// Queue a command in a room.
    pub fn submit(&self, id: RoomId, player: PlayerId, command: PlayerCommand) -> Result<()> {
        self.get(id)?.submit(player, command)
    }

    /// Subscribe to a room's broadcasts.
    pub fn subscribe(&self, id: RoomId) -> Result<broadcast::Receiver<ServerMessage>> {
        Ok(self.get(id)?.subscribe())
    }

    /// Ids of open rooms, ascending.
    pub fn ids(&self) -> impl Iterator<Item = RoomId> + '_ {
        self.rooms.keys().copied()
    }

    /// Number of open rooms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Whether no rooms are open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Stop a room and wait for its loop to end.
    pub async fn close(&mut self, id: RoomId) -> Result<RoomOutcome> {
        let handle = self.rooms.remove(&id).ok_or(ServerError::RoomNotFound(id))?;
        handle.shutdown();
        handle.join().await
    }

    /// Drop rooms whose match has ended on its own.
    pub async fn reap_finished(&mut self) -> Vec<(RoomId, RoomOutcome)> {
        let done: Vec<RoomId> = self
            .rooms
            .iter()
            .filter(|(_, handle)| handle.is_finished())
            .map(|(&id, _)| id)
            .collect();
        let mut outcomes = Vec::with_capacity(done.len());
        for id in done {
            if let Some(handle) = self.rooms.remove(&id) {
                if let Ok(outcome) = handle.join().await {
                    info!(room = id, ?outcome, "room reaped");
                    outcomes.push((id, outcome));
                }
            }
        }
        outcomes
    }

    /// Stop every room.
    pub async fn shutdown_all(&mut self) -> Vec<(RoomId, RoomOutcome)> {
        let ids: Vec<RoomId> = self.ids().collect();
        let mut outcomes = Vec::with_capacity(ids.len());
        for id in ids {
            if let Ok(outcome) = self.close(id).await {
                outcomes.push((id, outcome));
            }
        }
        outcomes
    }
}
