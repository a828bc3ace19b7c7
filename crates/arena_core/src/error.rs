//! Error types for the match simulation.
//!
//! Stale references and invalid commands are routine during play and are
//! dropped inside the tick; these errors exist so the reason can be logged
//! and so the queueing and loading APIs can report failures to their caller.

use thiserror::Error;

use crate::ecs::Entity;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all match simulation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(Entity),

    /// The issuing player does not own the actor.
    #[error("Player {player} does not own {entity}")]
    NotOwner {
        /// Issuing player.
        player: u64,
        /// Actor that was commanded.
        entity: Entity,
    },

    /// The actor lacks the capability a command needs.
    #[error("{entity} cannot {action}")]
    MissingCapability {
        /// Actor that was commanded.
        entity: Entity,
        /// What the command tried to do.
        action: &'static str,
    },

    /// The actor is being carried by an avatar.
    #[error("{0} is carried and cannot act")]
    Carried(Entity),

    /// Unknown player id.
    #[error("Unknown player: {0}")]
    UnknownPlayer(u64),

    /// Unknown unit type in a command or data file.
    #[error("Unknown unit type: {0}")]
    UnknownUnitType(String),

    /// Unknown building type in a command or data file.
    #[error("Unknown building type: {0}")]
    UnknownBuildingType(String),

    /// Insufficient resources.
    #[error("Insufficient resources: need {required}, have {available}")]
    InsufficientResources {
        /// Amount required.
        required: i32,
        /// Amount available.
        available: i32,
    },

    /// Insufficient supply.
    #[error("Supply blocked: need {required}, free {available}")]
    SupplyBlocked {
        /// Supply required.
        required: u32,
        /// Supply available.
        available: u32,
    },

    /// Data file parsing error.
    #[error("Failed to parse data '{source_name}': {message}")]
    DataParseError {
        /// Name of the data that failed to parse.
        source_name: String,
        /// Error message.
        message: String,
    },

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// The match has already ended.
    #[error("Match is over")]
    MatchOver,
}
