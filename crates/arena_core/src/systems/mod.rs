//! Gameplay systems.
//!
//! Every system is a [`System<MatchResources>`](crate::ecs::System). They are
//! registered in a fixed order by [`build_schedule`]; that order is part of
//! the simulation's contract, since later systems read messages emitted
//! earlier in the same tick.
//!
//! | # | system | reads | emits |
//! |---|--------|-------|-------|
//! | 1 | command intake | pending commands | orders |
//! | 2 | avatar movement | avatar move orders | |
//! | 3 | interaction | pickup / drop / interact orders | train / cancel orders |
//! | 4 | combat | attack orders, spatial hash | attack, death |
//! | 5 | gathering | gather orders | resource deposits |
//! | 6 | construction | build orders | building completed |
//! | 7 | training | train / cancel orders | spawn requests |
//! | 8 | spawn | spawn requests | unit spawned |
//! | 9 | unit movement | move orders | |
//! | 10 | physics | | |
//! | 11 | collision detection | | collisions |
//! | 12 | collision resolution | collisions | |
//! | 13 | ball kick | collisions | |
//! | 14 | economy | resource deposits | |
//! | 15 | death | deaths | |
//! | 16 | victory | | game over |

mod avatar;
mod collision;
mod combat;
mod construction;
mod death;
mod economy;
mod gathering;
mod intake;
mod movement;
mod physics;
mod steering;
mod training;
mod victory;

use std::collections::VecDeque;

pub use avatar::{AvatarMovementSystem, InteractionSystem};
pub use collision::{BallKickSystem, CollisionDetectionSystem, CollisionResolutionSystem};
pub use combat::CombatSystem;
pub use construction::ConstructionSystem;
pub use death::DeathSystem;
pub use economy::EconomySystem;
pub(crate) use economy::recompute_supply;
pub use gathering::GatheringSystem;
pub use intake::CommandIntakeSystem;
pub use movement::UnitMovementSystem;
pub use physics::PhysicsSystem;
pub use training::{SpawnSystem, TrainingSystem};
pub use victory::VictorySystem;

use crate::commands::PlayerCommand;
use crate::components::{CarriedBy, Owner, Position, Radius};
use crate::config::MatchConfig;
use crate::data::Tuning;
use crate::ecs::{Entity, Filter, FilterId, Scheduler, World};
use crate::map::MapGeometry;
use crate::math::{Fixed, Vec2Fixed};
use crate::player::{PlayerId, Players};
use crate::spatial::SpatialHash;

/// Shared state every gameplay system can read and mutate.
#[derive(Debug, Clone)]
pub struct MatchResources {
    /// Match settings.
    pub config: MatchConfig,
    /// Stat sheets.
    pub tuning: Tuning,
    /// Boundary and goals.
    pub map: MapGeometry,
    /// Both seats and their economy.
    pub players: Players,
    /// Commands waiting for the next tick, in arrival order.
    pub pending: VecDeque<(PlayerId, PlayerCommand)>,
    /// Broad-phase index, rebuilt by combat before target acquisition and
    /// again by collision detection after everything has moved.
    pub spatial: SpatialHash,
    /// Seconds per tick.
    pub dt: Fixed,
    /// Index of the tick being run.
    pub tick: u64,
}

impl MatchResources {
    /// Fresh resources for a match.
    #[must_use]
    pub fn new(config: MatchConfig, tuning: Tuning, players: Players) -> Self {
        let map = MapGeometry::from_config(&config);
        let spatial = SpatialHash::new(tuning.physics.cell_size);
        let dt = config.dt();
        Self {
            config,
            tuning,
            map,
            players,
            pending: VecDeque::new(),
            spatial,
            dt,
            tick: 0,
        }
    }
}

/// Register every gameplay system in tick order.
pub fn build_schedule(world: &mut World) -> Scheduler<MatchResources> {
    let mut scheduler = Scheduler::new();
    scheduler.add_system(world, CommandIntakeSystem::default());
    scheduler.add_system(world, AvatarMovementSystem::default());
    scheduler.add_system(world, InteractionSystem::default());
    scheduler.add_system(world, CombatSystem::default());
    scheduler.add_system(world, GatheringSystem::default());
    scheduler.add_system(world, ConstructionSystem::default());
    scheduler.add_system(world, TrainingSystem::default());
    scheduler.add_system(world, SpawnSystem);
    scheduler.add_system(world, UnitMovementSystem::default());
    scheduler.add_system(world, PhysicsSystem::default());
    scheduler.add_system(world, CollisionDetectionSystem::default());
    scheduler.add_system(world, CollisionResolutionSystem);
    scheduler.add_system(world, BallKickSystem);
    scheduler.add_system(world, EconomySystem::default());
    scheduler.add_system(world, DeathSystem);
    scheduler.add_system(world, VictorySystem::default());
    scheduler
}

/// Unwrap a filter handle that `init` should have registered.
///
/// # Panics
///
/// Panics if the system is run without having been added to a scheduler.
pub(crate) fn registered(filter: Option<FilterId>, system: &'static str) -> FilterId {
    filter.unwrap_or_else(|| panic!("{system} ran before init registered its filters"))
}

/// Centre and radius of an entity.
pub(crate) fn body(world: &World, entity: Entity) -> Option<(Vec2Fixed, Fixed)> {
    let position = world.get::<Position>(entity)?.0;
    let radius = world.get::<Radius>(entity).map_or(Fixed::ZERO, |r| r.0);
    Some((position, radius))
}

/// Gap between two circles; negative when they overlap.
pub(crate) fn edge_distance(world: &World, a: Entity, b: Entity) -> Option<Fixed> {
    let (pa, ra) = body(world, a)?;
    let (pb, rb) = body(world, b)?;
    Some(pa.distance(pb) - ra - rb)
}

/// Filter for everything that occupies space in the spatial hash.
pub(crate) fn solid_filter() -> Filter {
    Filter::new()
        .with::<Position>()
        .with::<Radius>()
        .without::<CarriedBy>()
}

/// Rebuild the spatial hash from the current positions of `solids`.
pub(crate) fn index_bodies(world: &World, spatial: &mut SpatialHash, solids: FilterId) {
    spatial.clear();
    for &entity in world.members(solids) {
        if let Some((center, radius)) = body(world, entity) {
            spatial.insert(entity, center, radius);
        }
    }
}

/// Seat index of an entity's owner.
pub(crate) fn seat(world: &World, entity: Entity) -> Option<u8> {
    world.get::<Owner>(entity).map(|owner| owner.index)
}
