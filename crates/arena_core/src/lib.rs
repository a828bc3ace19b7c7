//! # Arena Core
//!
//! Deterministic match simulation for a two-player arena that mixes a
//! small real-time-strategy economy with a ball game.
//!
//! This crate contains **only** deterministic logic:
//! - No IO
//! - No wall clock
//! - No randomness
//! - No floating-point math inside a tick (uses fixed-point)
//!
//! The same commands applied to the same match always produce the same
//! state, which is what the server relies on to keep clients in sync and
//! what the determinism tests check.
//!
//! ## Crate Structure
//!
//! - [`ecs`] - Entity store, component storage, filters, message bus, scheduler
//! - [`components`] - The closed component set
//! - [`messages`] - Orders and events passed between systems
//! - [`commands`] - Player commands accepted at the network boundary
//! - [`systems`] - Gameplay systems and their fixed execution order
//! - [`simulation`] - One match and its phase machine
//! - [`snapshot`] - Client-facing views of a match
//! - [`data`] / [`config`] - Tuning sheets and match settings
//! - [`map`] / [`map_generation`] - Arena geometry and starting layout
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod commands;
pub mod components;
pub mod config;
pub mod data;
pub mod ecs;
pub mod error;
pub mod map;
pub mod map_generation;
pub mod math;
pub mod messages;
pub mod player;
pub mod simulation;
pub mod snapshot;
pub mod spatial;
pub mod spawn;
pub mod systems;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::commands::{InteractAction, PlayerCommand};
    pub use crate::components::*;
    pub use crate::config::MatchConfig;
    pub use crate::data::Tuning;
    pub use crate::ecs::{Entity, Filter, FilterId, System, World};
    pub use crate::error::{GameError, Result};
    pub use crate::math::{fx, Fixed, Vec2Fixed};
    pub use crate::player::{PlayerId, PlayerState, Players};
    pub use crate::simulation::{MatchEvents, MatchPhase, Simulation};
    pub use crate::snapshot::{ActorView, MatchEvent, WorldSnapshot};
}
