//! Avatar movement and hands-on interaction: carrying units and using
//! buildings in person.

use tracing::debug;

use crate::components::{
    AttackTarget, AutoAttackOnly, AvatarReach, BuildTarget, CarriedBy, CarriedUnit, EntityKind,
    GatherTarget, Identity, MoveDirection, MoveTarget, Owner, Position, Speed, UnitState,
};
use crate::ecs::{Entity, Filter, FilterId, System, World};
use crate::math::{Fixed, Vec2Fixed};
use crate::messages::{
    AvatarMoveOrder, CancelTrainingOrder, DropOrder, InteractKind, InteractOrder, PickupOrder,
    TrainOrder,
};

use super::{body, edge_distance, registered, seat, MatchResources};

/// Applies avatar input and moves avatars (and whatever they carry).
#[derive(Debug, Default)]
pub struct AvatarMovementSystem {
    avatars: Option<FilterId>,
}

impl System<MatchResources> for AvatarMovementSystem {
    fn name(&self) -> &'static str {
        "avatar_movement"
    }

    fn init(&mut self, world: &mut World) {
        self.avatars = Some(
            world.add_filter(
                Filter::new()
                    .with::<AvatarReach>()
                    .with::<MoveDirection>()
                    .with::<Position>(),
            ),
        );
    }

    fn run(&mut self, world: &mut World, res: &mut MatchResources) {
        let avatars = registered(self.avatars, self.name());

        let orders = world.read::<AvatarMoveOrder>().to_vec();
        for order in orders {
            if let Some(direction) = world.get_mut::<MoveDirection>(order.avatar) {
                direction.0 = order.direction;
            }
        }

        for avatar in world.query(avatars) {
            let Some((position, radius)) = body(world, avatar) else {
                continue;
            };
            let direction = world.get::<MoveDirection>(avatar).map_or(Vec2Fixed::ZERO, |d| d.0);
            let speed = world.get::<Speed>(avatar).map_or(Fixed::ZERO, |s| s.0);

            let mut next = position + direction.scale(speed * res.dt);
            if let Some(clamped) = res.map.clamp(next, radius) {
                next = clamped.position;
            }
            if let Some(p) = world.get_mut::<Position>(avatar) {
                p.0 = next;
            }
            carry_along(world, avatar, next);
        }
    }
}

/// Keep a carried unit on top of its avatar, dropping a dead link.
fn carry_along(world: &mut World, avatar: Entity, at: Vec2Fixed) {
    if !world.has::<CarriedUnit>(avatar) {
        return;
    }
    match world.relation::<CarriedUnit>(avatar) {
        Some(unit) => {
            if let Some(p) = world.get_mut::<Position>(unit) {
                p.0 = at;
            }
        }
        None => {
            debug!(%avatar, "carried unit no longer exists");
            world.remove::<CarriedUnit>(avatar);
        }
    }
}

/// Handles pickup, drop and building interaction orders.
#[derive(Debug, Default)]
pub struct InteractionSystem {
    carriable: Option<FilterId>,
}

impl System<MatchResources> for InteractionSystem {
    fn name(&self) -> &'static str {
        "interaction"
    }

    fn init(&mut self, world: &mut World) {
        self.carriable = Some(
            world.add_filter(
                Filter::new()
                    .with::<UnitState>()
                    .with::<Position>()
                    .with::<Owner>()
                    .without::<CarriedBy>(),
            ),
        );
    }

    fn run(&mut self, world: &mut World, res: &mut MatchResources) {
        let carriable = registered(self.carriable, self.name());

        for order in world.read::<PickupOrder>().to_vec() {
            pickup(world, carriable, order.avatar);
        }
        for order in world.read::<DropOrder>().to_vec() {
            drop_unit(world, res, order.avatar);
        }
        for order in world.read::<InteractOrder>().to_vec() {
            interact(world, order);
        }
    }
}

fn pickup(world: &mut World, carriable: FilterId, avatar: Entity) {
    if world.relation::<CarriedUnit>(avatar).is_some() {
        debug!(%avatar, "pickup ignored, hands full");
        return;
    }
    let Some(reach) = world.get::<AvatarReach>(avatar).copied() else {
        return;
    };
    let Some(index) = seat(world, avatar) else {
        return;
    };

    let mut best: Option<(Fixed, Entity)> = None;
    for unit in world.query(carriable) {
        let friendly = seat(world, unit) == Some(index);
        let is_unit = world
            .get::<Identity>(unit)
            .is_some_and(|id| id.kind == EntityKind::Unit);
        if !friendly || !is_unit {
            continue;
        }
        let Some(gap) = edge_distance(world, avatar, unit) else {
            continue;
        };
        if gap <= reach.pickup_range && best.map_or(true, |(d, _)| gap < d) {
            best = Some((gap, unit));
        }
    }

    let Some((_, unit)) = best else {
        debug!(%avatar, "nothing in reach to pick up");
        return;
    };
    world.remove::<AttackTarget>(unit);
    world.remove::<GatherTarget>(unit);
    world.remove::<BuildTarget>(unit);
    world.remove::<MoveTarget>(unit);
    world.remove::<AutoAttackOnly>(unit);
    world.add(unit, UnitState::Idle);
    world.add(unit, CarriedBy(avatar));
    world.add(avatar, CarriedUnit(unit));
    if let Some(at) = world.get::<Position>(avatar).map(|p| p.0) {
        if let Some(p) = world.get_mut::<Position>(unit) {
            p.0 = at;
        }
    }
    debug!(%avatar, %unit, "unit picked up");
}

fn drop_unit(world: &mut World, res: &MatchResources, avatar: Entity) {
    let Some(unit) = world.relation::<CarriedUnit>(avatar) else {
        world.remove::<CarriedUnit>(avatar);
        debug!(%avatar, "drop ignored, nothing carried");
        return;
    };
    let Some((position, radius)) = body(world, avatar) else {
        return;
    };
    let unit_radius = body(world, unit).map_or(Fixed::ZERO, |(_, r)| r);

    // Put the unit down in front of the avatar.
    let facing = world
        .get::<MoveDirection>(avatar)
        .map(|d| d.0)
        .filter(|d| !d.is_zero())
        .unwrap_or_else(|| {
            let side = if seat(world, avatar) == Some(0) { 1 } else { -1 };
            Vec2Fixed::from_ints(side, 0)
        });
    let mut spot = position + facing.scale(radius + unit_radius + Fixed::from_num(2));
    if let Some(clamped) = res.map.clamp(spot, unit_radius) {
        spot = clamped.position;
    }

    world.remove::<CarriedUnit>(avatar);
    world.remove::<CarriedBy>(unit);
    world.add(unit, AutoAttackOnly);
    world.add(unit, UnitState::Idle);
    if let Some(p) = world.get_mut::<Position>(unit) {
        p.0 = spot;
    }
    debug!(%avatar, %unit, "unit dropped");
}

fn interact(world: &mut World, order: InteractOrder) {
    let Some(reach) = world.get::<AvatarReach>(order.avatar).copied() else {
        return;
    };
    let in_reach = edge_distance(world, order.avatar, order.building)
        .is_some_and(|gap| gap <= reach.interaction_range);
    if !in_reach {
        debug!(avatar = %order.avatar, building = %order.building, "building out of reach");
        return;
    }
    match order.kind {
        InteractKind::Train(unit_type) => world.send(TrainOrder {
            building: order.building,
            unit_type,
        }),
        InteractKind::CancelTraining => world.send(CancelTrainingOrder {
            building: order.building,
        }),
    }
}
