//! Point-seek steering shared by the movement-driven systems.

use crate::components::{AutoAttackOnly, CarriedBy, Position, Radius, Speed};
use crate::ecs::{Entity, World};
use crate::map::MapGeometry;
use crate::math::{Fixed, Vec2Fixed};

/// Outcome of one steering step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Steer {
    /// Already within the stop distance; nothing moved.
    Arrived,
    /// Moved this tick.
    Moving,
    /// Cannot move at all.
    Stuck,
}

/// Rounding slack allowed on the stop distance.
const ARRIVAL_SLACK: Fixed = Fixed::from_bits(1 << 16);

/// Move `entity` towards `goal` by at most `speed * dt`, stopping once the
/// centre distance is within `stop_distance`. Never overshoots: a step that
/// would reach the stop ring lands on it and reports `Arrived`.
pub(crate) fn step_towards(
    world: &mut World,
    map: &MapGeometry,
    entity: Entity,
    goal: Vec2Fixed,
    stop_distance: Fixed,
    dt: Fixed,
) -> Steer {
    let Some(position) = world.get::<Position>(entity).map(|p| p.0) else {
        return Steer::Stuck;
    };
    let distance = position.distance(goal);
    if distance <= stop_distance + ARRIVAL_SLACK {
        return Steer::Arrived;
    }
    if world.has::<AutoAttackOnly>(entity) || world.has::<CarriedBy>(entity) {
        return Steer::Stuck;
    }
    let Some(speed) = world.get::<Speed>(entity).map(|s| s.0) else {
        return Steer::Stuck;
    };

    let step = speed * dt;
    let direction = (goal - position).normalize();
    let (mut next, outcome) = if distance - stop_distance <= step {
        (goal - direction.scale(stop_distance), Steer::Arrived)
    } else {
        (position + direction.scale(step), Steer::Moving)
    };
    let radius = world.get::<Radius>(entity).map_or(Fixed::ZERO, |r| r.0);
    if let Some(clamped) = map.clamp(next, radius) {
        next = clamped.position;
    }
    if let Some(p) = world.get_mut::<Position>(entity) {
        p.0 = next;
    }
    outcome
}

/// Centre distance at which two circles are `reach` apart edge to edge.
pub(crate) fn reach_distance(world: &World, a: Entity, b: Entity, reach: Fixed) -> Fixed {
    let ra = world.get::<Radius>(a).map_or(Fixed::ZERO, |r| r.0);
    let rb = world.get::<Radius>(b).map_or(Fixed::ZERO, |r| r.0);
    ra + rb + reach
}
