//! Players and their economy.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Network-level player identifier, assigned by the room layer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Player({})", self.0)
    }
}

/// Per-player economy state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    /// Network id.
    pub id: PlayerId,
    /// Seat: 0 plays from the left, 1 from the right.
    pub index: u8,
    /// Spendable minerals.
    pub resources: i32,
    /// Supply consumed by live units and queued training.
    pub supply_used: u32,
    /// Supply granted by completed buildings.
    pub supply_cap: u32,
}

impl PlayerState {
    /// Create a player with a starting stockpile.
    #[must_use]
    pub const fn new(id: PlayerId, index: u8, resources: i32) -> Self {
        Self {
            id,
            index,
            resources,
            supply_used: 0,
            supply_cap: 0,
        }
    }

    /// Supply still available.
    #[must_use]
    pub const fn supply_free(&self) -> u32 {
        self.supply_cap.saturating_sub(self.supply_used)
    }

    /// Spend resources if the stockpile covers `cost`.
    pub fn try_spend(&mut self, cost: i32) -> Result<()> {
        if self.resources < cost {
            return Err(GameError::InsufficientResources {
                required: cost,
                available: self.resources,
            });
        }
        self.resources -= cost;
        Ok(())
    }

    /// Check that `supply` more fits under the cap.
    pub fn check_supply(&self, supply: u32) -> Result<()> {
        if supply > self.supply_free() {
            return Err(GameError::SupplyBlocked {
                required: supply,
                available: self.supply_free(),
            });
        }
        Ok(())
    }
}

/// Both seats of a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Players {
    seats: Vec<PlayerState>,
}

impl Players {
    /// Seat two players with the same starting stockpile.
    #[must_use]
    pub fn new(first: PlayerId, second: PlayerId, starting_resources: i32) -> Self {
        Self {
            seats: vec![
                PlayerState::new(first, 0, starting_resources),
                PlayerState::new(second, 1, starting_resources),
            ],
        }
    }

    /// Seat index for a player id.
    pub fn index_of(&self, id: PlayerId) -> Result<u8> {
        self.seats
            .iter()
            .find(|seat| seat.id == id)
            .map(|seat| seat.index)
            .ok_or(GameError::UnknownPlayer(id.0))
    }

    /// Player by seat index.
    #[must_use]
    pub fn by_index(&self, index: u8) -> Option<&PlayerState> {
        self.seats.get(index as usize)
    }

    /// Mutable player by seat index.
    pub fn by_index_mut(&mut self, index: u8) -> Option<&mut PlayerState> {
        self.seats.get_mut(index as usize)
    }

    /// Iterate seats in index order.
    pub fn iter(&self) -> impl Iterator<Item = &PlayerState> {
        self.seats.iter()
    }

    /// Mutable iteration in index order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PlayerState> {
        self.seats.iter_mut()
    }
}
