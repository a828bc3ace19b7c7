//! ECS component definitions.
//!
//! Components are pure data with no behavior. The full set is declared at the
//! bottom of this file with [`component_set!`](crate::ecs::component_set);
//! adding a component means adding it there.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::ecs::{component_set, Entity};
use crate::math::{Fixed, Vec2Fixed};
use crate::player::PlayerId;

// ============================================================================
// Spatial / kinematic
// ============================================================================

/// World position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position(pub Vec2Fixed);

/// Collision radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Radius(pub Fixed);

/// Velocity in world units per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Velocity(pub Vec2Fixed);

/// Per-tick velocity multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Friction(pub Fixed);

/// Movement speed in world units per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Speed(pub Fixed);

/// Current input direction of an avatar (unit length or zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoveDirection(pub Vec2Fixed);

/// Vision radius reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisionRadius(pub Fixed);

// ============================================================================
// Identity
// ============================================================================

/// Broad entity classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Trainable mobile unit.
    Unit,
    /// Constructed structure.
    Building,
    /// Mineral patch.
    Resource,
    /// The match ball.
    Ball,
    /// Player-controlled avatar.
    Avatar,
}

impl EntityKind {
    /// Lowercase name used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            EntityKind::Unit => "unit",
            EntityKind::Building => "building",
            EntityKind::Resource => "resource",
            EntityKind::Ball => "ball",
            EntityKind::Avatar => "avatar",
        }
    }
}

/// Classification plus optional subtype ("worker", "supplyDepot", ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Broad class.
    pub kind: EntityKind,
    /// Data-table key for units, buildings and resources.
    pub subtype: Option<String>,
}

impl Identity {
    /// Identity with a subtype.
    #[must_use]
    pub fn new(kind: EntityKind, subtype: impl Into<String>) -> Self {
        Self {
            kind,
            subtype: Some(subtype.into()),
        }
    }

    /// Identity without a subtype.
    #[must_use]
    pub const fn bare(kind: EntityKind) -> Self {
        Self {
            kind,
            subtype: None,
        }
    }

    /// Whether the subtype equals `name`.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.subtype.as_deref() == Some(name)
    }
}

/// Owning player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner {
    /// Network id of the owner.
    pub player: PlayerId,
    /// Seat index (0 or 1).
    pub index: u8,
}

/// Sprite key for clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sprite(pub String);

// ============================================================================
// Vitality / combat
// ============================================================================

/// Hit points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Health {
    /// Current hit points.
    pub current: i32,
    /// Maximum hit points.
    pub max: i32,
}

impl Health {
    /// Full health.
    #[must_use]
    pub const fn new(max: i32) -> Self {
        Self { current: max, max }
    }

    /// Apply damage, saturating at zero.
    pub fn apply_damage(&mut self, damage: i32) {
        self.current = (self.current - damage).max(0);
    }

    /// Check if dead.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.current <= 0
    }
}

/// Attack profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Combat {
    /// Damage per hit.
    pub damage: i32,
    /// Edge-to-edge reach.
    pub range: Fixed,
    /// Hits per second.
    pub attack_speed: Fixed,
}

impl Combat {
    /// Seconds between hits.
    #[must_use]
    pub fn cooldown(&self) -> Fixed {
        if self.attack_speed <= Fixed::ZERO {
            Fixed::from_num(1)
        } else {
            Fixed::from_num(1) / self.attack_speed
        }
    }
}

/// Seconds until the next hit may land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttackCooldown(pub Fixed);

// ============================================================================
// Unit behavior
// ============================================================================

/// Unit state machine tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitState {
    /// Waiting for orders; the recovery state for every invalid target.
    #[default]
    Idle,
    /// Walking to a point.
    Moving,
    /// Chasing or hitting an attack target.
    Attacking,
    /// Walking to or mining a resource node.
    Gathering,
    /// Carrying cargo back to a base.
    Returning,
    /// Walking to or working on a construction site.
    Building,
}

impl UnitState {
    /// Lowercase name used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            UnitState::Idle => "idle",
            UnitState::Moving => "moving",
            UnitState::Attacking => "attacking",
            UnitState::Gathering => "gathering",
            UnitState::Returning => "returning",
            UnitState::Building => "building",
        }
    }
}

/// Point a unit is walking towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveTarget(pub Vec2Fixed);

/// Carried minerals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cargo {
    /// Amount carried.
    pub amount: i32,
    /// Maximum carried.
    pub capacity: i32,
}

impl Cargo {
    /// Empty hold with the given capacity.
    #[must_use]
    pub const fn empty(capacity: i32) -> Self {
        Self {
            amount: 0,
            capacity,
        }
    }

    /// Check if the hold is full.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.amount >= self.capacity
    }
}

/// Seconds of mining accumulated towards the next gather action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GatherProgress(pub Fixed);

/// Capability: may gather.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanGather;

/// Capability: may construct buildings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanBuild;

/// Dropped by an avatar: fights where it stands and never walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoAttackOnly;

/// Supply consumed by a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupplyCost(pub u32);

// ============================================================================
// Buildings
// ============================================================================

/// Present only while a building is under construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Construction {
    /// Seconds of work done.
    pub progress: Fixed,
    /// Seconds of work required.
    pub duration: Fixed,
}

impl Construction {
    /// Fresh construction site.
    #[must_use]
    pub const fn new(duration: Fixed) -> Self {
        Self {
            progress: Fixed::ZERO,
            duration,
        }
    }

    /// Completed fraction in `[0, 1]`.
    #[must_use]
    pub fn fraction(&self) -> Fixed {
        if self.duration <= Fixed::ZERO {
            return Fixed::from_num(1);
        }
        (self.progress / self.duration).min(Fixed::from_num(1))
    }

    /// Check if the work is done.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.progress >= self.duration
    }
}

/// One queued unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingItem {
    /// Unit type key.
    pub unit_type: String,
    /// Seconds elapsed.
    #[serde(with = "crate::math::fixed_serde")]
    pub progress: Fixed,
    /// Seconds required.
    #[serde(with = "crate::math::fixed_serde")]
    pub duration: Fixed,
}

/// FIFO training queue; only the head advances.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrainingQueue {
    /// Queued items, head first.
    pub items: VecDeque<TrainingItem>,
}

impl TrainingQueue {
    /// Number of queued items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Spawn offset from the building centre for trained units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RallyPoint(pub Vec2Fixed);

/// Unit types this building can train.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trainable(pub Vec<String>);

/// Supply granted once construction completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupplyProvided(pub u32);

// ============================================================================
// Resources, avatars, ball
// ============================================================================

/// Minable mineral patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceNode {
    /// Minerals left.
    pub amount: i32,
    /// Minerals per gather action.
    pub yield_per_gather: i32,
}

impl ResourceNode {
    /// Check if this node is depleted.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.amount <= 0
    }

    /// Extract up to `requested`, returning the amount actually taken.
    pub fn extract(&mut self, requested: i32) -> i32 {
        let extracted = requested.min(self.amount).max(0);
        self.amount -= extracted;
        extracted
    }
}

/// Avatar reach for pickups and building interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvatarReach {
    /// Edge distance within which a unit can be picked up.
    pub pickup_range: Fixed,
    /// Edge distance within which a building can be used.
    pub interaction_range: Fixed,
}

/// Marker for the match ball.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ball;

// ============================================================================
// Relations
// ============================================================================

/// Current attack target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackTarget(pub Entity);

/// Resource node a worker mines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatherTarget(pub Entity);

/// Construction site a worker builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildTarget(pub Entity);

/// Avatar → unit it is holding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarriedUnit(pub Entity);

/// Unit → avatar holding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarriedBy(pub Entity);

component_set! {
    data {
        Position => positions,
        Radius => radii,
        Velocity => velocities,
        Friction => frictions,
        Speed => speeds,
        MoveDirection => move_directions,
        VisionRadius => vision_radii,
        Identity => identities,
        Owner => owners,
        Sprite => sprites,
        Health => healths,
        Combat => combats,
        AttackCooldown => attack_cooldowns,
        UnitState => unit_states,
        MoveTarget => move_targets,
        Cargo => cargos,
        GatherProgress => gather_progress,
        CanGather => can_gather,
        CanBuild => can_build,
        AutoAttackOnly => auto_attack_only,
        SupplyCost => supply_costs,
        Construction => constructions,
        TrainingQueue => training_queues,
        RallyPoint => rally_points,
        Trainable => trainables,
        SupplyProvided => supply_provided,
        ResourceNode => resource_nodes,
        AvatarReach => avatar_reaches,
        Ball => balls,
    }
    relations {
        AttackTarget => attack_targets,
        GatherTarget => gather_targets,
        BuildTarget => build_targets,
        CarriedUnit => carried_units,
        CarriedBy => carried_by,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_damage_saturates() {
        let mut health = Health::new(10);
        health.apply_damage(4);
        assert_eq!(health.current, 6);
        health.apply_damage(40);
        assert_eq!(health.current, 0);
        assert!(health.is_dead());
    }

    #[test]
    fn test_combat_cooldown() {
        let combat = Combat {
            damage: 5,
            range: Fixed::from_num(10),
            attack_speed: Fixed::from_num(2),
        };
        assert_eq!(combat.cooldown(), Fixed::from_num(0.5));
    }

    #[test]
    fn test_resource_extract() {
        let mut node = ResourceNode {
            amount: 7,
            yield_per_gather: 5,
        };
        assert_eq!(node.extract(5), 5);
        assert_eq!(node.extract(5), 2);
        assert!(node.is_depleted());
        assert_eq!(node.extract(5), 0);
    }

    #[test]
    fn test_construction_fraction() {
        let mut site = Construction::new(Fixed::from_num(20));
        site.progress = Fixed::from_num(5);
        assert_eq!(site.fraction(), Fixed::from_num(0.25));
        assert!(!site.is_complete());
        site.progress = Fixed::from_num(25);
        assert_eq!(site.fraction(), Fixed::from_num(1));
        assert!(site.is_complete());
    }

    #[test]
    fn test_component_kind_relation_flag() {
        assert!(ComponentKind::AttackTarget.is_relation());
        assert!(!ComponentKind::Position.is_relation());
    }
}
