//! Tick-scoped messages.
//!
//! Orders are produced by command intake (and by the interaction system) from
//! validated player commands. Events are produced by gameplay systems and
//! consumed later in the same tick or during the next one.

use crate::components::Owner;
use crate::ecs::{message_set, Entity};
use crate::math::{Fixed, Vec2Fixed};

// ============================================================================
// Orders
// ============================================================================

/// Set an avatar's input direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarMoveOrder {
    /// Avatar to steer.
    pub avatar: Entity,
    /// Unit-length direction, or zero to stop.
    pub direction: Vec2Fixed,
}

/// Walk to a point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOrder {
    /// Unit to move.
    pub actor: Entity,
    /// Destination.
    pub target: Vec2Fixed,
}

/// Attack an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackOrder {
    /// Attacker.
    pub actor: Entity,
    /// Victim.
    pub target: Entity,
}

/// Mine a resource node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatherOrder {
    /// Worker.
    pub worker: Entity,
    /// Resource node.
    pub resource: Entity,
}

/// Place a construction site and send a worker to build it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOrder {
    /// Builder.
    pub worker: Entity,
    /// Owner of the new building.
    pub owner: Owner,
    /// Building type key.
    pub building_type: String,
    /// Site centre.
    pub position: Vec2Fixed,
}

/// Queue a unit at a building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainOrder {
    /// Producing building.
    pub building: Entity,
    /// Unit type key.
    pub unit_type: String,
}

/// Remove the last queued item at a building and refund it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelTrainingOrder {
    /// Producing building.
    pub building: Entity,
}

/// Pick up the nearest friendly unit in reach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickupOrder {
    /// Avatar doing the lifting.
    pub avatar: Entity,
}

/// Put down the carried unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropOrder {
    /// Avatar holding a unit.
    pub avatar: Entity,
}

/// What an avatar asks a building to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractKind {
    /// Queue a unit.
    Train(String),
    /// Drop the last queued item.
    CancelTraining,
}

/// Use a building in person; requires the avatar to be within reach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractOrder {
    /// Avatar doing the interacting.
    pub avatar: Entity,
    /// Building being used.
    pub building: Entity,
    /// Requested action.
    pub kind: InteractKind,
}

// ============================================================================
// Events
// ============================================================================

/// Two circles overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    /// Lower entity id of the pair.
    pub a: Entity,
    /// Higher entity id of the pair.
    pub b: Entity,
    /// Unit vector from `a` towards `b`.
    pub normal: Vec2Fixed,
    /// Penetration depth.
    pub overlap: Fixed,
}

/// A hit landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackEvent {
    /// Who hit.
    pub attacker: Entity,
    /// Who was hit.
    pub target: Entity,
    /// Damage dealt.
    pub damage: i32,
}

/// An entity's health reached zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeathEvent {
    /// The dying entity.
    pub entity: Entity,
}

/// A worker returned cargo to a base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDeposit {
    /// Credited seat.
    pub player_index: u8,
    /// Minerals delivered.
    pub amount: i32,
    /// Delivering worker.
    pub worker: Entity,
}

/// A unit finished training and should be placed in the world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnUnit {
    /// Owner of the new unit.
    pub owner: Owner,
    /// Unit type key.
    pub unit_type: String,
    /// Spawn point.
    pub position: Vec2Fixed,
}

/// A construction site finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildingCompleted {
    /// The finished building.
    pub building: Entity,
    /// Owning seat.
    pub player_index: u8,
}

/// A trained unit entered the world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSpawned {
    /// The new unit.
    pub entity: Entity,
    /// Owning seat.
    pub player_index: u8,
}

/// The ball crossed a goal line. Emitted at most once per match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameOver {
    /// Winning seat.
    pub winner_index: u8,
    /// Human-readable cause.
    pub reason: String,
}

message_set! {
    AvatarMoveOrder => avatar_move_orders,
    MoveOrder => move_orders,
    AttackOrder => attack_orders,
    GatherOrder => gather_orders,
    BuildOrder => build_orders,
    TrainOrder => train_orders,
    CancelTrainingOrder => cancel_training_orders,
    PickupOrder => pickup_orders,
    DropOrder => drop_orders,
    InteractOrder => interact_orders,
    Collision => collisions,
    AttackEvent => attack_events,
    DeathEvent => death_events,
    ResourceDeposit => resource_deposits,
    SpawnUnit => spawn_units,
    BuildingCompleted => buildings_completed,
    UnitSpawned => units_spawned,
    GameOver => game_overs,
}
