//! Entity constructors.
//!
//! Each function assembles the full component bundle for one entity class
//! from the tuning sheet. These are the only places entities are given their
//! initial components.

use crate::components::{
    AttackCooldown, AvatarReach, Ball, CanBuild, CanGather, Cargo, Combat, Construction,
    EntityKind, Friction, GatherProgress, Health, Identity, MoveDirection, Owner, Position,
    Radius, RallyPoint, ResourceNode, Speed, Sprite, SupplyCost, SupplyProvided, Trainable,
    TrainingQueue, UnitState, Velocity, VisionRadius,
};
use crate::data::Tuning;
use crate::ecs::{Entity, World};
use crate::error::Result;
use crate::math::{Fixed, Vec2Fixed};

/// Team colour suffix used in sprite keys.
#[must_use]
pub const fn team_colour(index: u8) -> &'static str {
    if index == 0 {
        "blue"
    } else {
        "red"
    }
}

/// Spawn a unit of `unit_type`, idle, at `position`.
pub fn spawn_unit(
    world: &mut World,
    tuning: &Tuning,
    unit_type: &str,
    owner: Owner,
    position: Vec2Fixed,
) -> Result<Entity> {
    let data = tuning.unit(unit_type)?;
    let entity = world.create();
    world.add(entity, Identity::new(EntityKind::Unit, unit_type));
    world.add(entity, owner);
    world.add(
        entity,
        Sprite(format!("{unit_type}-{}", team_colour(owner.index))),
    );
    world.add(entity, Position(position));
    world.add(entity, Radius(data.radius));
    world.add(entity, Speed(data.speed));
    world.add(entity, VisionRadius(data.vision));
    world.add(entity, Health::new(data.health));
    world.add(
        entity,
        Combat {
            damage: data.damage,
            range: data.range,
            attack_speed: data.attack_speed,
        },
    );
    world.add(entity, AttackCooldown::default());
    world.add(entity, SupplyCost(data.supply));
    world.add(entity, UnitState::Idle);
    if data.can_gather {
        world.add(entity, CanGather);
        world.add(entity, Cargo::empty(data.carry_capacity));
        world.add(entity, GatherProgress::default());
    }
    if data.can_build {
        world.add(entity, CanBuild);
    }
    Ok(entity)
}

/// Spawn a building of `building_type` at `position`.
///
/// A site under construction starts at a sliver of health that grows with
/// construction progress; a finished building starts at full health.
pub fn spawn_building(
    world: &mut World,
    tuning: &Tuning,
    building_type: &str,
    owner: Owner,
    position: Vec2Fixed,
    under_construction: bool,
) -> Result<Entity> {
    let data = tuning.building(building_type)?;
    let entity = world.create();
    world.add(entity, Identity::new(EntityKind::Building, building_type));
    world.add(entity, owner);
    world.add(
        entity,
        Sprite(format!("{building_type}-{}", team_colour(owner.index))),
    );
    world.add(entity, Position(position));
    world.add(entity, Radius(data.radius));
    world.add(entity, VisionRadius(data.vision));
    world.add(entity, SupplyProvided(data.supply_provided));

    let mut health = Health::new(data.health);
    if under_construction {
        health.current = 1;
        world.add(entity, Construction::new(data.build_time));
    }
    world.add(entity, health);

    if !data.trains.is_empty() {
        // Rally towards the opponent's half.
        let side = if owner.index == 0 {
            Fixed::from_num(1)
        } else {
            Fixed::from_num(-1)
        };
        let offset = Vec2Fixed::new((data.radius + Fixed::from_num(24)) * side, Fixed::ZERO);
        world.add(entity, Trainable(data.trains.clone()));
        world.add(entity, TrainingQueue::default());
        world.add(entity, RallyPoint(offset));
    }
    Ok(entity)
}

/// Spawn a mineral patch.
pub fn spawn_resource(world: &mut World, tuning: &Tuning, position: Vec2Fixed) -> Entity {
    let entity = world.create();
    world.add(entity, Identity::new(EntityKind::Resource, "mineral"));
    world.add(entity, Sprite("mineral".to_string()));
    world.add(entity, Position(position));
    world.add(entity, Radius(tuning.resource.radius));
    world.add(
        entity,
        ResourceNode {
            amount: tuning.resource.amount,
            yield_per_gather: tuning.resource.yield_per_gather,
        },
    );
    entity
}

/// Spawn a player's avatar.
pub fn spawn_avatar(world: &mut World, tuning: &Tuning, owner: Owner, position: Vec2Fixed) -> Entity {
    let avatar = &tuning.avatar;
    let entity = world.create();
    world.add(entity, Identity::bare(EntityKind::Avatar));
    world.add(entity, owner);
    world.add(
        entity,
        Sprite(format!("avatar-{}", team_colour(owner.index))),
    );
    world.add(entity, Position(position));
    world.add(entity, Radius(avatar.radius));
    world.add(entity, Speed(avatar.speed));
    world.add(entity, MoveDirection::default());
    world.add(entity, VisionRadius(avatar.vision));
    world.add(
        entity,
        AvatarReach {
            pickup_range: avatar.pickup_range,
            interaction_range: avatar.interaction_range,
        },
    );
    entity
}

/// Spawn the ball at rest.
pub fn spawn_ball(world: &mut World, tuning: &Tuning, position: Vec2Fixed) -> Entity {
    let entity = world.create();
    world.add(entity, Identity::bare(EntityKind::Ball));
    world.add(entity, Sprite("ball".to_string()));
    world.add(entity, Position(position));
    world.add(entity, Radius(tuning.ball.radius));
    world.add(entity, Velocity(Vec2Fixed::ZERO));
    world.add(entity, Friction(tuning.ball.friction));
    world.add(entity, Ball);
    entity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::PlayerId;

    fn owner(index: u8) -> Owner {
        Owner {
            player: PlayerId(u64::from(index) + 1),
            index,
        }
    }

    #[test]
    fn test_worker_has_economy_components() {
        let mut world = World::new();
        let tuning = Tuning::default();
        let worker =
            spawn_unit(&mut world, &tuning, "worker", owner(0), Vec2Fixed::from_ints(5, 5)).unwrap();
        assert!(world.has::<CanGather>(worker));
        assert!(world.has::<CanBuild>(worker));
        assert_eq!(world.get::<Cargo>(worker).map(|c| c.capacity), Some(5));
        assert_eq!(world.get::<UnitState>(worker), Some(&UnitState::Idle));
        assert_eq!(world.get::<Sprite>(worker).map(|s| s.0.as_str()), Some("worker-blue"));
    }

    #[test]
    fn test_marine_cannot_gather() {
        let mut world = World::new();
        let tuning = Tuning::default();
        let marine =
            spawn_unit(&mut world, &tuning, "marine", owner(1), Vec2Fixed::ZERO).unwrap();
        assert!(!world.has::<CanGather>(marine));
        assert!(!world.has::<Cargo>(marine));
    }

    #[test]
    fn test_unknown_type_creates_nothing() {
        let mut world = World::new();
        let tuning = Tuning::default();
        assert!(spawn_unit(&mut world, &tuning, "dragon", owner(0), Vec2Fixed::ZERO).is_err());
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn test_construction_site() {
        let mut world = World::new();
        let tuning = Tuning::default();
        let site = spawn_building(
            &mut world,
            &tuning,
            "supplyDepot",
            owner(0),
            Vec2Fixed::from_ints(300, 300),
            true,
        )
        .unwrap();
        assert!(world.has::<Construction>(site));
        assert_eq!(world.get::<Health>(site).map(|h| h.current), Some(1));
        assert!(!world.has::<TrainingQueue>(site));
    }

    #[test]
    fn test_rally_faces_opponent() {
        let mut world = World::new();
        let tuning = Tuning::default();
        let left =
            spawn_building(&mut world, &tuning, "base", owner(0), Vec2Fixed::ZERO, false).unwrap();
        let right =
            spawn_building(&mut world, &tuning, "base", owner(1), Vec2Fixed::ZERO, false).unwrap();
        assert!(world.get::<RallyPoint>(left).unwrap().0.x > Fixed::ZERO);
        assert!(world.get::<RallyPoint>(right).unwrap().0.x < Fixed::ZERO);
    }
}
