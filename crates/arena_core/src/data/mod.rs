//! Data structures for match tuning.
//!
//! Stat sheets for units, buildings, resources, avatars and the ball. All
//! structs deserialize from RON; hand-written decimals are converted to
//! fixed point once at load time.
//!
//! **Note:** This module contains no IO. Callers read the file and pass the
//! text to [`Tuning::from_ron_str`].

mod building_data;
mod tuning;
mod unit_data;

pub use building_data::BuildingData;
pub use tuning::{AvatarData, BallData, PhysicsData, ResourceData, Tuning};
pub use unit_data::UnitData;
