//! Worker mining loop: gathering → returning → gathering.

use tracing::{debug, info};

use crate::components::{
    AttackTarget, BuildTarget, CanGather, Cargo, CarriedBy, Construction, EntityKind,
    GatherProgress, GatherTarget, Identity, MoveTarget, Owner, Position, ResourceNode, UnitState,
};
use crate::ecs::{Entity, Filter, FilterId, System, World};
use crate::math::Fixed;
use crate::messages::{GatherOrder, ResourceDeposit};

use super::steering::{reach_distance, step_towards, Steer};
use super::{registered, seat, MatchResources};

/// Moves cargo from resource nodes to depots.
#[derive(Debug, Default)]
pub struct GatheringSystem {
    workers: Option<FilterId>,
    depots: Option<FilterId>,
}

impl System<MatchResources> for GatheringSystem {
    fn name(&self) -> &'static str {
        "gathering"
    }

    fn init(&mut self, world: &mut World) {
        self.workers = Some(
            world.add_filter(
                Filter::new()
                    .with::<CanGather>()
                    .with::<Cargo>()
                    .with::<UnitState>()
                    .without::<CarriedBy>(),
            ),
        );
        self.depots = Some(
            world.add_filter(
                Filter::new()
                    .with::<Identity>()
                    .with::<Owner>()
                    .without::<Construction>(),
            ),
        );
    }

    fn run(&mut self, world: &mut World, res: &mut MatchResources) {
        let workers = registered(self.workers, self.name());
        let depots = registered(self.depots, self.name());

        for order in world.read::<GatherOrder>().to_vec() {
            assign(world, order);
        }

        for worker in world.query(workers) {
            match world.get::<UnitState>(worker).copied() {
                Some(UnitState::Gathering) => gather(world, res, worker),
                Some(UnitState::Returning) => return_cargo(world, res, depots, worker),
                _ => {}
            }
        }
    }
}

fn assign(world: &mut World, order: GatherOrder) {
    let GatherOrder { worker, resource } = order;
    if !world.exists(worker) || !world.has::<ResourceNode>(resource) {
        debug!(%worker, %resource, "gather order stale");
        return;
    }
    let state = world.get::<UnitState>(worker).copied();
    let same_target = world.relation::<GatherTarget>(worker) == Some(resource);
    if same_target && matches!(state, Some(UnitState::Gathering | UnitState::Returning)) {
        // Repeating the order must not reset progress.
        return;
    }
    world.remove::<AttackTarget>(worker);
    world.remove::<BuildTarget>(worker);
    world.remove::<MoveTarget>(worker);
    world.add(worker, GatherTarget(resource));
    world.add(worker, GatherProgress::default());
    world.add(worker, UnitState::Gathering);
}

fn gather(world: &mut World, res: &MatchResources, worker: Entity) {
    let live_node = world
        .relation::<GatherTarget>(worker)
        .filter(|&node| world.get::<ResourceNode>(node).is_some_and(|n| !n.is_depleted()));
    let Some(node) = live_node else {
        debug!(%worker, "resource gone");
        finish_trip(world, worker);
        return;
    };
    if world.get::<Cargo>(worker).is_some_and(Cargo::is_full) {
        world.add(worker, UnitState::Returning);
        return;
    }

    let stop = reach_distance(world, worker, node, res.tuning.physics.work_reach);
    let Some(goal) = world.get::<Position>(node).map(|p| p.0) else {
        finish_trip(world, worker);
        return;
    };
    if step_towards(world, &res.map, worker, goal, stop, res.dt) != Steer::Arrived {
        return;
    }

    let Some(progress) = world.get_mut::<GatherProgress>(worker) else {
        return;
    };
    progress.0 += res.dt;
    if progress.0 < Fixed::from_num(1) {
        return;
    }
    progress.0 = Fixed::ZERO;

    let Some(cargo) = world.get::<Cargo>(worker).copied() else {
        return;
    };
    let (extracted, depleted) = match world.get_mut::<ResourceNode>(node) {
        Some(resource) => {
            let room = cargo.capacity - cargo.amount;
            let taken = resource.extract(resource.yield_per_gather.min(room));
            (taken, resource.is_depleted())
        }
        None => (0, true),
    };
    let full = if let Some(cargo) = world.get_mut::<Cargo>(worker) {
        cargo.amount += extracted;
        cargo.is_full()
    } else {
        false
    };

    if depleted {
        info!(%node, "resource depleted");
        world.destroy(node);
    }
    if full || depleted {
        world.add(worker, UnitState::Returning);
    }
}

/// The trip ended without a live node: carry home what we have, or idle.
fn finish_trip(world: &mut World, worker: Entity) {
    if world.get::<Cargo>(worker).is_some_and(|c| c.amount > 0) {
        world.add(worker, UnitState::Returning);
    } else {
        world.remove::<GatherTarget>(worker);
        world.add(worker, UnitState::Idle);
    }
}

/// Nearest completed friendly building that accepts cargo.
fn nearest_depot(
    world: &World,
    res: &MatchResources,
    depots: FilterId,
    worker: Entity,
) -> Option<Entity> {
    let index = seat(world, worker)?;
    let from = world.get::<Position>(worker)?.0;
    let mut best: Option<(Fixed, Entity)> = None;
    for &depot in world.members(depots) {
        let accepts = world.get::<Identity>(depot).is_some_and(|id| {
            id.kind == EntityKind::Building
                && id
                    .subtype
                    .as_deref()
                    .and_then(|name| res.tuning.building(name).ok())
                    .is_some_and(|data| data.accepts_deposits)
        });
        if !accepts || seat(world, depot) != Some(index) {
            continue;
        }
        let Some(at) = world.get::<Position>(depot).map(|p| p.0) else {
            continue;
        };
        let d = from.distance_squared(at);
        if best.map_or(true, |(bd, _)| d < bd) {
            best = Some((d, depot));
        }
    }
    best.map(|(_, depot)| depot)
}

fn return_cargo(world: &mut World, res: &MatchResources, depots: FilterId, worker: Entity) {
    let Some(depot) = nearest_depot(world, res, depots, worker) else {
        debug!(%worker, "no depot to return to");
        world.add(worker, UnitState::Idle);
        return;
    };
    let stop = reach_distance(world, worker, depot, res.tuning.physics.work_reach);
    let Some(goal) = world.get::<Position>(depot).map(|p| p.0) else {
        return;
    };
    if step_towards(world, &res.map, worker, goal, stop, res.dt) != Steer::Arrived {
        return;
    }

    let amount = world.get_mut::<Cargo>(worker).map_or(0, |cargo| {
        let amount = cargo.amount;
        cargo.amount = 0;
        amount
    });
    if amount > 0 {
        if let Some(player_index) = seat(world, worker) {
            world.send(ResourceDeposit {
                player_index,
                amount,
                worker,
            });
        }
    }

    let resumable = world
        .relation::<GatherTarget>(worker)
        .is_some_and(|node| world.get::<ResourceNode>(node).is_some_and(|n| !n.is_depleted()));
    if resumable {
        world.add(worker, UnitState::Gathering);
    } else {
        world.remove::<GatherTarget>(worker);
        world.add(worker, UnitState::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;
    use crate::data::Tuning;
    use crate::math::Vec2Fixed;
    use crate::player::{PlayerId, Players};
    use crate::spawn::{spawn_building, spawn_resource, spawn_unit};

    struct Setup {
        world: World,
        res: MatchResources,
        system: GatheringSystem,
        worker: Entity,
        mineral: Entity,
    }

    fn setup() -> Setup {
        let tuning = Tuning::default();
        let players = Players::new(PlayerId(1), PlayerId(2), 200);
        let res = MatchResources::new(MatchConfig::default(), tuning.clone(), players);
        let mut world = World::new();
        let owner = Owner {
            player: PlayerId(1),
            index: 0,
        };
        spawn_building(&mut world, &tuning, "base", owner, Vec2Fixed::from_ints(500, 500), false)
            .unwrap();
        let mineral = spawn_resource(&mut world, &tuning, Vec2Fixed::from_ints(700, 500));
        // Already within reach of the mineral.
        let worker =
            spawn_unit(&mut world, &tuning, "worker", owner, Vec2Fixed::from_ints(665, 500)).unwrap();
        let mut system = GatheringSystem::default();
        system.init(&mut world);
        Setup {
            world,
            res,
            system,
            worker,
            mineral,
        }
    }

    #[test]
    fn test_repeated_gather_order_is_idempotent() {
        let mut s = setup();
        let (worker, mineral) = (s.worker, s.mineral);
        s.world.send(GatherOrder {
            worker,
            resource: mineral,
        });
        for _ in 0..30 {
            s.system.run(&mut s.world, &mut s.res);
            s.world.rotate_messages();
        }
        let progress = s.world.get::<GatherProgress>(worker).unwrap().0;
        assert!(progress > Fixed::ZERO);

        s.world.send(GatherOrder {
            worker,
            resource: mineral,
        });
        s.system.run(&mut s.world, &mut s.res);
        assert!(s.world.get::<GatherProgress>(worker).unwrap().0 > progress);
        assert_eq!(s.world.relation::<GatherTarget>(worker), Some(mineral));
    }

    #[test]
    fn test_full_cycle_deposits_cargo() {
        let mut s = setup();
        let (worker, mineral) = (s.worker, s.mineral);
        s.world.send(GatherOrder {
            worker,
            resource: mineral,
        });

        let mut deposited = 0;
        for _ in 0..(60 * 10) {
            s.system.run(&mut s.world, &mut s.res);
            deposited += s
                .world
                .read::<ResourceDeposit>()
                .iter()
                .map(|d| d.amount)
                .sum::<i32>();
            s.world.rotate_messages();
            if deposited > 0 {
                break;
            }
        }
        assert_eq!(deposited, 5);
        assert_eq!(
            s.world.get::<ResourceNode>(mineral).map(|n| n.amount),
            Some(1495)
        );
        assert_eq!(s.world.get::<Cargo>(worker).map(|c| c.amount), Some(0));
    }

    #[test]
    fn test_depleted_node_sends_worker_home() {
        let mut s = setup();
        let (worker, mineral) = (s.worker, s.mineral);
        if let Some(node) = s.world.get_mut::<ResourceNode>(mineral) {
            node.amount = 3;
        }
        s.world.send(GatherOrder {
            worker,
            resource: mineral,
        });
        for _ in 0..61 {
            s.system.run(&mut s.world, &mut s.res);
            s.world.rotate_messages();
        }
        assert!(!s.world.exists(mineral));
        assert_eq!(s.world.get::<Cargo>(worker).map(|c| c.amount), Some(3));
        assert_eq!(s.world.get::<UnitState>(worker), Some(&UnitState::Returning));
    }
}
