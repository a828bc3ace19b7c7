//! Player commands accepted at the network boundary.
//!
//! The command set is closed. Clients send JSON objects tagged by `type`
//! which decode straight into [`PlayerCommand`]; anything that does not
//! decode never reaches the simulation.

use serde::{Deserialize, Serialize};

use crate::ecs::Entity;

/// Action requested through a building interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InteractAction {
    /// Queue a unit.
    Train,
    /// Cancel the most recently queued unit.
    CancelTraining,
}

/// Every command a player (human or AI) may issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PlayerCommand {
    /// Steer the avatar; each axis is -1, 0 or 1.
    AvatarMove {
        /// Horizontal input.
        dir_x: i8,
        /// Vertical input.
        dir_y: i8,
    },
    /// Walk units to a point.
    Move {
        /// Units to move.
        actors: Vec<Entity>,
        /// Target x in world units.
        x: f64,
        /// Target y in world units.
        y: f64,
    },
    /// Attack an entity.
    Attack {
        /// Attackers.
        actors: Vec<Entity>,
        /// Victim.
        target: Entity,
    },
    /// Mine a resource node.
    Gather {
        /// Workers.
        workers: Vec<Entity>,
        /// Resource node.
        resource: Entity,
    },
    /// Place a building.
    Build {
        /// Builder.
        worker: Entity,
        /// Building type key.
        building_type: String,
        /// Site x in world units.
        x: f64,
        /// Site y in world units.
        y: f64,
    },
    /// Queue a unit at a building.
    Train {
        /// Producing building.
        building: Entity,
        /// Unit type key.
        unit_type: String,
    },
    /// Avatar picks up the nearest friendly unit.
    Pickup,
    /// Avatar drops its carried unit.
    Drop,
    /// Avatar uses a nearby building.
    Interact {
        /// Building to use.
        building: Entity,
        /// Requested action.
        action: InteractAction,
        /// Unit type, required for [`InteractAction::Train`].
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit_type: Option<String>,
    },
}

impl PlayerCommand {
    /// Short name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            PlayerCommand::AvatarMove { .. } => "avatarMove",
            PlayerCommand::Move { .. } => "move",
            PlayerCommand::Attack { .. } => "attack",
            PlayerCommand::Gather { .. } => "gather",
            PlayerCommand::Build { .. } => "build",
            PlayerCommand::Train { .. } => "train",
            PlayerCommand::Pickup => "pickup",
            PlayerCommand::Drop => "drop",
            PlayerCommand::Interact { .. } => "interact",
        }
    }
}
