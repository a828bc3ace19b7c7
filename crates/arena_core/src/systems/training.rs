//! Training queues and unit spawning.

use tracing::{debug, info};

use crate::components::{
    Construction, Owner, Position, RallyPoint, Trainable, TrainingItem, TrainingQueue,
};
use crate::ecs::{Entity, Filter, FilterId, System, World};
use crate::error::{GameError, Result};
use crate::math::{Fixed, Vec2Fixed};
use crate::messages::{CancelTrainingOrder, SpawnUnit, TrainOrder, UnitSpawned};
use crate::spawn::spawn_unit;

use super::{registered, MatchResources};

/// Queues, cancels and advances unit production.
#[derive(Debug, Default)]
pub struct TrainingSystem {
    producers: Option<FilterId>,
}

impl System<MatchResources> for TrainingSystem {
    fn name(&self) -> &'static str {
        "training"
    }

    fn init(&mut self, world: &mut World) {
        self.producers = Some(
            world.add_filter(
                Filter::new()
                    .with::<TrainingQueue>()
                    .with::<Owner>()
                    .without::<Construction>(),
            ),
        );
    }

    fn run(&mut self, world: &mut World, res: &mut MatchResources) {
        let producers = registered(self.producers, self.name());

        for order in world.read::<TrainOrder>().to_vec() {
            let building = order.building;
            if let Err(reason) = enqueue(world, res, order) {
                debug!(%building, %reason, "train order dropped");
            }
        }
        for order in world.read::<CancelTrainingOrder>().to_vec() {
            cancel_last(world, res, order.building);
        }

        for building in world.query(producers) {
            advance(world, res, building);
        }
    }
}

fn enqueue(world: &mut World, res: &mut MatchResources, order: TrainOrder) -> Result<()> {
    let TrainOrder {
        building,
        unit_type,
    } = order;
    let trains = world
        .get::<Trainable>(building)
        .is_some_and(|t| t.0.contains(&unit_type));
    if !trains {
        return Err(GameError::MissingCapability {
            entity: building,
            action: "train",
        });
    }
    if world.has::<Construction>(building) {
        return Err(GameError::InvalidState("building under construction".into()));
    }
    let owner = *world
        .get::<Owner>(building)
        .ok_or(GameError::EntityNotFound(building))?;
    let data = res.tuning.unit(&unit_type)?;
    let (cost, supply, duration) = (data.cost, data.supply, data.train_time);

    let player = res
        .players
        .by_index_mut(owner.index)
        .ok_or(GameError::UnknownPlayer(owner.player.0))?;
    player.check_supply(supply)?;
    player.try_spend(cost)?;
    // Reserved now so a second order in the same tick sees it.
    player.supply_used += supply;

    if let Some(queue) = world.get_mut::<TrainingQueue>(building) {
        queue.items.push_back(TrainingItem {
            unit_type,
            progress: Fixed::ZERO,
            duration,
        });
    }
    Ok(())
}

fn cancel_last(world: &mut World, res: &mut MatchResources, building: Entity) {
    let Some(owner) = world.get::<Owner>(building).copied() else {
        return;
    };
    let Some(item) = world
        .get_mut::<TrainingQueue>(building)
        .and_then(|queue| queue.items.pop_back())
    else {
        debug!(%building, "nothing to cancel");
        return;
    };
    let Ok(data) = res.tuning.unit(&item.unit_type) else {
        return;
    };
    if let Some(player) = res.players.by_index_mut(owner.index) {
        player.resources += data.cost;
        player.supply_used = player.supply_used.saturating_sub(data.supply);
    }
    debug!(%building, unit = %item.unit_type, "training cancelled");
}

fn advance(world: &mut World, res: &MatchResources, building: Entity) {
    let finished = match world.get_mut::<TrainingQueue>(building) {
        Some(queue) => match queue.items.front_mut() {
            Some(head) => {
                head.progress += res.dt;
                if head.progress >= head.duration {
                    queue.items.pop_front()
                } else {
                    None
                }
            }
            None => None,
        },
        None => None,
    };
    let Some(item) = finished else {
        return;
    };

    let (Some(owner), Some(at)) = (
        world.get::<Owner>(building).copied(),
        world.get::<Position>(building).map(|p| p.0),
    ) else {
        return;
    };
    let rally = world
        .get::<RallyPoint>(building)
        .map_or(Vec2Fixed::ZERO, |r| r.0);
    world.send(SpawnUnit {
        owner,
        unit_type: item.unit_type,
        position: at + rally,
    });
}

/// Turns spawn requests into units.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpawnSystem;

impl System<MatchResources> for SpawnSystem {
    fn name(&self) -> &'static str {
        "spawn"
    }

    fn run(&mut self, world: &mut World, res: &mut MatchResources) {
        for request in world.read::<SpawnUnit>().to_vec() {
            let mut position = request.position;
            if let Some(radius) = res.tuning.unit(&request.unit_type).ok().map(|u| u.radius) {
                if let Some(clamped) = res.map.clamp(position, radius) {
                    position = clamped.position;
                }
            }
            match spawn_unit(
                world,
                &res.tuning,
                &request.unit_type,
                request.owner,
                position,
            ) {
                Ok(entity) => {
                    info!(
                        %entity,
                        unit = %request.unit_type,
                        player = request.owner.index,
                        "unit spawned"
                    );
                    world.send(UnitSpawned {
                        entity,
                        player_index: request.owner.index,
                    });
                }
                Err(reason) => debug!(%reason, "spawn request dropped"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Identity, UnitState};
    use crate::config::MatchConfig;
    use crate::data::Tuning;
    use crate::player::{PlayerId, Players};
    use crate::spawn::spawn_building;

    fn setup() -> (World, MatchResources, TrainingSystem, SpawnSystem, Entity) {
        let tuning = Tuning::default();
        let mut players = Players::new(PlayerId(1), PlayerId(2), 200);
        if let Some(p) = players.by_index_mut(0) {
            p.supply_cap = 10;
        }
        let res = MatchResources::new(MatchConfig::default(), tuning.clone(), players);
        let mut world = World::new();
        let owner = Owner {
            player: PlayerId(1),
            index: 0,
        };
        let base =
            spawn_building(&mut world, &tuning, "base", owner, Vec2Fixed::from_ints(500, 900), false)
                .unwrap();
        let mut training = TrainingSystem::default();
        let mut spawn = SpawnSystem;
        training.init(&mut world);
        spawn.init(&mut world);
        (world, res, training, spawn, base)
    }

    fn train(building: Entity) -> TrainOrder {
        TrainOrder {
            building,
            unit_type: "worker".to_string(),
        }
    }

    #[test]
    fn test_train_queues_and_spends() {
        let (mut world, mut res, mut training, _, base) = setup();
        world.send(train(base));
        training.run(&mut world, &mut res);
        assert_eq!(world.get::<TrainingQueue>(base).map(TrainingQueue::len), Some(1));
        let player = res.players.by_index(0).unwrap();
        assert_eq!(player.resources, 150);
        assert_eq!(player.supply_used, 1);
    }

    #[test]
    fn test_cannot_train_foreign_type() {
        let (mut world, mut res, mut training, _, base) = setup();
        world.send(TrainOrder {
            building: base,
            unit_type: "marine".to_string(),
        });
        training.run(&mut world, &mut res);
        assert_eq!(world.get::<TrainingQueue>(base).map(TrainingQueue::len), Some(0));
        assert_eq!(res.players.by_index(0).map(|p| p.resources), Some(200));
    }

    #[test]
    fn test_supply_blocks_training() {
        let (mut world, mut res, mut training, _, base) = setup();
        if let Some(p) = res.players.by_index_mut(0) {
            p.supply_cap = 1;
        }
        world.send(train(base));
        world.send(train(base));
        training.run(&mut world, &mut res);
        assert_eq!(world.get::<TrainingQueue>(base).map(TrainingQueue::len), Some(1));
        assert_eq!(res.players.by_index(0).map(|p| p.resources), Some(150));
    }

    #[test]
    fn test_cancel_refunds_last_item() {
        let (mut world, mut res, mut training, _, base) = setup();
        world.send(train(base));
        world.send(train(base));
        training.run(&mut world, &mut res);
        world.rotate_messages();
        world.send(CancelTrainingOrder { building: base });
        training.run(&mut world, &mut res);
        assert_eq!(world.get::<TrainingQueue>(base).map(TrainingQueue::len), Some(1));
        let player = res.players.by_index(0).unwrap();
        assert_eq!(player.resources, 150);
        assert_eq!(player.supply_used, 1);
    }

    #[test]
    fn test_head_finishes_and_spawns_at_rally() {
        let (mut world, mut res, mut training, mut spawn, base) = setup();
        world.send(train(base));
        let mut spawned = Vec::new();
        for _ in 0..(12 * 61) {
            training.run(&mut world, &mut res);
            spawn.run(&mut world, &mut res);
            spawned.extend(world.read::<UnitSpawned>().iter().map(|s| s.entity));
            world.rotate_messages();
        }
        assert_eq!(spawned.len(), 1);
        let worker = spawned[0];
        assert!(world.get::<Identity>(worker).is_some_and(|id| id.is("worker")));
        assert_eq!(world.get::<UnitState>(worker), Some(&UnitState::Idle));
        assert_eq!(
            world.get::<Position>(worker).map(|p| p.0),
            Some(Vec2Fixed::from_ints(500 + 48 + 24, 900))
        );
        assert_eq!(world.get::<TrainingQueue>(base).map(TrainingQueue::len), Some(0));
    }
}
