//! Building placement and construction progress.

use tracing::{debug, info};

use crate::components::{
    AttackTarget, BuildTarget, CanBuild, CarriedBy, Construction, EntityKind, GatherTarget,
    Health, Identity, MoveTarget, Position, Radius, UnitState,
};
use crate::ecs::{Entity, Filter, FilterId, System, World};
use crate::error::{GameError, Result};
use crate::math::Fixed;
use crate::messages::{BuildOrder, BuildingCompleted};
use crate::spawn::spawn_building;

use super::steering::{reach_distance, step_towards, Steer};
use super::{registered, MatchResources};

/// Places construction sites and advances them while a builder works.
#[derive(Debug, Default)]
pub struct ConstructionSystem {
    builders: Option<FilterId>,
    obstacles: Option<FilterId>,
}

impl System<MatchResources> for ConstructionSystem {
    fn name(&self) -> &'static str {
        "construction"
    }

    fn init(&mut self, world: &mut World) {
        self.builders = Some(
            world.add_filter(
                Filter::new()
                    .with::<CanBuild>()
                    .with::<BuildTarget>()
                    .without::<CarriedBy>(),
            ),
        );
        self.obstacles = Some(
            world.add_filter(
                Filter::new()
                    .with::<Identity>()
                    .with::<Position>()
                    .with::<Radius>(),
            ),
        );
    }

    fn run(&mut self, world: &mut World, res: &mut MatchResources) {
        let builders = registered(self.builders, self.name());
        let obstacles = registered(self.obstacles, self.name());

        for order in world.read::<BuildOrder>().to_vec() {
            let worker = order.worker;
            if let Err(reason) = place(world, res, obstacles, order) {
                debug!(%worker, %reason, "build order dropped");
            }
        }

        for builder in world.query(builders) {
            if world.get::<UnitState>(builder) == Some(&UnitState::Building) {
                work(world, res, builder);
            }
        }
    }
}

fn place(
    world: &mut World,
    res: &mut MatchResources,
    obstacles: FilterId,
    order: BuildOrder,
) -> Result<()> {
    if !world.exists(order.worker) || world.has::<CarriedBy>(order.worker) {
        return Err(GameError::EntityNotFound(order.worker));
    }
    let data = res.tuning.building(&order.building_type)?;
    if !res.map.contains(order.position, data.radius) {
        return Err(GameError::InvalidState("site outside the playable area".into()));
    }
    let blocked = world.members(obstacles).iter().any(|&other| {
        let solid = world
            .get::<Identity>(other)
            .is_some_and(|id| matches!(id.kind, EntityKind::Building | EntityKind::Resource));
        let (Some(at), Some(radius)) = (world.get::<Position>(other), world.get::<Radius>(other))
        else {
            return false;
        };
        solid && at.0.distance(order.position) < radius.0 + data.radius
    });
    if blocked {
        return Err(GameError::InvalidState("site overlaps a structure".into()));
    }

    let player = res
        .players
        .by_index_mut(order.owner.index)
        .ok_or(GameError::UnknownPlayer(order.owner.player.0))?;
    player.try_spend(data.cost)?;

    let site = spawn_building(
        world,
        &res.tuning,
        &order.building_type,
        order.owner,
        order.position,
        true,
    )?;
    world.remove::<AttackTarget>(order.worker);
    world.remove::<GatherTarget>(order.worker);
    world.remove::<MoveTarget>(order.worker);
    world.add(order.worker, BuildTarget(site));
    world.add(order.worker, UnitState::Building);
    info!(
        %site,
        building = %order.building_type,
        player = order.owner.index,
        "construction started"
    );
    Ok(())
}

fn stop_building(world: &mut World, builder: Entity) {
    world.remove::<BuildTarget>(builder);
    world.add(builder, UnitState::Idle);
}

fn work(world: &mut World, res: &MatchResources, builder: Entity) {
    let site = world
        .relation::<BuildTarget>(builder)
        .filter(|&site| world.has::<Construction>(site));
    let Some(site) = site else {
        debug!(%builder, "construction site gone or finished");
        stop_building(world, builder);
        return;
    };

    let stop = reach_distance(world, builder, site, res.tuning.physics.work_reach);
    let Some(goal) = world.get::<Position>(site).map(|p| p.0) else {
        stop_building(world, builder);
        return;
    };
    if step_towards(world, &res.map, builder, goal, stop, res.dt) != Steer::Arrived {
        return;
    }

    let Some(construction) = world.get_mut::<Construction>(site) else {
        return;
    };
    let before = construction.fraction();
    construction.progress += res.dt;
    let after = construction.fraction();
    let complete = construction.is_complete();

    // Floor differences sum to exactly max over the whole build; damage
    // taken while building is kept.
    if let Some(health) = world.get_mut::<Health>(site) {
        let max = Fixed::from_num(health.max);
        let gained = (max * after).to_num::<i32>() - (max * before).to_num::<i32>();
        health.current = (health.current + gained).min(health.max);
    }

    if complete {
        world.remove::<Construction>(site);
        let player_index = super::seat(world, site).unwrap_or_default();
        world.send(BuildingCompleted {
            building: site,
            player_index,
        });
        info!(%site, player = player_index, "building completed");
        stop_building(world, builder);
    }
}
