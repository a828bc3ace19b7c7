//! Test fixtures and helpers.
//!
//! Pre-built matches and entity configurations for consistent testing.

use arena_core::components::{Identity, Owner};
use arena_core::config::MatchConfig;
use arena_core::data::Tuning;
use arena_core::ecs::{Entity, World};
use arena_core::math::Vec2Fixed;
use arena_core::player::PlayerId;
use arena_core::simulation::{MatchEvents, Simulation};
use arena_core::spawn::spawn_unit;
use fixed::types::I32F32;

/// Player seated on the left (index 0).
pub const PLAYER_ONE: PlayerId = PlayerId(1);
/// Player seated on the right (index 1).
pub const PLAYER_TWO: PlayerId = PlayerId(2);

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point point from integer coordinates.
#[must_use]
pub fn point(x: i32, y: i32) -> Vec2Fixed {
    Vec2Fixed::from_ints(x, y)
}

/// Owner component for a seat (0 = [`PLAYER_ONE`], 1 = [`PLAYER_TWO`]).
#[must_use]
pub fn owner(seat: u8) -> Owner {
    Owner {
        player: if seat == 0 { PLAYER_ONE } else { PLAYER_TWO },
        index: seat,
    }
}

/// Default settings with the countdown removed, so `start` kicks off at once.
#[must_use]
pub fn instant_config() -> MatchConfig {
    MatchConfig {
        countdown_seconds: 0,
        ..MatchConfig::default()
    }
}

/// A freshly generated match that has not been started.
///
/// # Panics
///
/// Panics if the default settings fail to produce a match.
#[must_use]
pub fn waiting_match() -> Simulation {
    Simulation::new(instant_config(), Tuning::default(), PLAYER_ONE, PLAYER_TWO)
        .expect("default match must build")
}

/// A match already in the `Playing` phase, with no ticks run.
#[must_use]
pub fn playing_match() -> Simulation {
    let mut sim = waiting_match();
    sim.start();
    assert!(sim.phase().is_playing(), "instant config must skip the countdown");
    sim
}

/// Run `ticks` ticks and collect the events of each.
pub fn run_ticks(sim: &mut Simulation, ticks: u64) -> Vec<MatchEvents> {
    (0..ticks).map(|_| sim.tick()).collect()
}

/// Run until `done` holds or `limit` ticks pass; returns the ticks run.
pub fn run_until<F>(sim: &mut Simulation, limit: u64, mut done: F) -> Option<u64>
where
    F: FnMut(&Simulation) -> bool,
{
    for tick in 1..=limit {
        sim.tick();
        if done(sim) {
            return Some(tick);
        }
    }
    None
}

/// First starting worker of a seat.
///
/// # Panics
///
/// Panics if the layout has no worker for that seat.
#[must_use]
pub fn first_worker(sim: &Simulation, seat: u8) -> Entity {
    sim.layout().workers[seat as usize][0]
}

/// Starting base of a seat.
#[must_use]
pub fn base_of(sim: &Simulation, seat: u8) -> Entity {
    sim.layout().bases[seat as usize]
}

/// Avatar of a seat.
#[must_use]
pub fn avatar_of(sim: &Simulation, seat: u8) -> Entity {
    sim.layout().avatars[seat as usize]
}

/// Every entity whose identity has the given subtype, in id order.
#[must_use]
pub fn entities_of_type(world: &World, subtype: &str) -> Vec<Entity> {
    world
        .get_all::<Identity>()
        .filter(|(_, identity)| identity.is(subtype))
        .map(|(entity, _)| entity)
        .collect()
}

/// Spawn a unit straight into a world, bypassing training.
///
/// # Panics
///
/// Panics if `unit_type` is not in the tuning sheet.
pub fn spawn_test_unit(world: &mut World, unit_type: &str, seat: u8, x: i32, y: i32) -> Entity {
    spawn_unit(world, &Tuning::default(), unit_type, owner(seat), point(x, y))
        .expect("unit type must exist in the default tuning")
}
