//! Point-to-point unit movement for move orders and attack chases.

use tracing::debug;

use crate::components::{
    AttackTarget, AutoAttackOnly, BuildTarget, CarriedBy, Combat, GatherProgress, GatherTarget,
    MoveTarget, Position, Speed, UnitState,
};
use crate::ecs::{Entity, Filter, FilterId, System, World};
use crate::messages::MoveOrder;

use super::steering::{step_towards, Steer};
use super::{edge_distance, registered, MatchResources};

/// Walks units towards their move target.
#[derive(Debug, Default)]
pub struct UnitMovementSystem {
    movers: Option<FilterId>,
}

impl System<MatchResources> for UnitMovementSystem {
    fn name(&self) -> &'static str {
        "unit_movement"
    }

    fn init(&mut self, world: &mut World) {
        self.movers = Some(
            world.add_filter(
                Filter::new()
                    .with::<MoveTarget>()
                    .with::<UnitState>()
                    .with::<Position>()
                    .with::<Speed>()
                    .without::<CarriedBy>()
                    .without::<AutoAttackOnly>(),
            ),
        );
    }

    fn run(&mut self, world: &mut World, res: &mut MatchResources) {
        let movers = registered(self.movers, self.name());

        for order in world.read::<MoveOrder>().to_vec() {
            let MoveOrder { actor, target } = order;
            if !world.exists(actor) || world.has::<CarriedBy>(actor) {
                debug!(%actor, "move order stale");
                continue;
            }
            world.remove::<AttackTarget>(actor);
            world.remove::<GatherTarget>(actor);
            world.remove::<BuildTarget>(actor);
            if let Some(progress) = world.get_mut::<GatherProgress>(actor) {
                *progress = GatherProgress::default();
            }
            world.add(actor, MoveTarget(target));
            world.add(actor, UnitState::Moving);
        }

        for unit in world.query(movers) {
            match world.get::<UnitState>(unit).copied() {
                Some(UnitState::Moving) => walk(world, res, unit),
                Some(UnitState::Attacking) => chase(world, res, unit),
                _ => {}
            }
        }
    }
}

fn arrive(world: &mut World, unit: Entity) {
    world.remove::<MoveTarget>(unit);
    world.add(unit, UnitState::Idle);
}

fn walk(world: &mut World, res: &MatchResources, unit: Entity) {
    let Some(goal) = world.get::<MoveTarget>(unit).map(|t| t.0) else {
        return;
    };
    let threshold = res.tuning.physics.arrival_threshold;
    match step_towards(world, &res.map, unit, goal, threshold, res.dt) {
        Steer::Stuck | Steer::Arrived => arrive(world, unit),
        Steer::Moving => {}
    }
}

fn chase(world: &mut World, res: &MatchResources, unit: Entity) {
    let range = world.get::<Combat>(unit).map(|c| c.range);
    let in_range = match (world.relation::<AttackTarget>(unit), range) {
        (Some(target), Some(range)) => {
            edge_distance(world, unit, target).is_some_and(|gap| gap <= range)
        }
        _ => false,
    };
    if in_range {
        return;
    }
    let Some(goal) = world.get::<MoveTarget>(unit).map(|t| t.0) else {
        return;
    };
    step_towards(world, &res.map, unit, goal, res.tuning.physics.arrival_threshold, res.dt);
}
