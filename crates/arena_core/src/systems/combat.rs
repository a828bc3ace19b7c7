//! Combat: attack orders, automatic target acquisition, and attack resolution.

use tracing::debug;

use crate::components::{
    AttackCooldown, AttackTarget, AutoAttackOnly, BuildTarget, CarriedBy, Combat, GatherTarget,
    Health, MoveTarget, Position, UnitState,
};
use crate::ecs::{Entity, Filter, FilterId, System, World};
use crate::math::Fixed;
use crate::messages::{AttackEvent, AttackOrder, DeathEvent};

use super::{body, edge_distance, index_bodies, registered, seat, solid_filter, MatchResources};

/// Resolves everything that fights.
#[derive(Debug, Default)]
pub struct CombatSystem {
    fighters: Option<FilterId>,
    solids: Option<FilterId>,
}

impl System<MatchResources> for CombatSystem {
    fn name(&self) -> &'static str {
        "combat"
    }

    fn init(&mut self, world: &mut World) {
        self.fighters = Some(
            world.add_filter(
                Filter::new()
                    .with::<Combat>()
                    .with::<Position>()
                    .with::<UnitState>()
                    .without::<CarriedBy>(),
            ),
        );
        self.solids = Some(world.add_filter(solid_filter()));
    }

    fn run(&mut self, world: &mut World, res: &mut MatchResources) {
        let fighters = registered(self.fighters, self.name());
        // Acquisition sees this tick's positions, spawns and deaths included.
        index_bodies(world, &mut res.spatial, registered(self.solids, self.name()));

        for order in world.read::<AttackOrder>().to_vec() {
            if !world.exists(order.actor) || world.has::<CarriedBy>(order.actor) {
                continue;
            }
            world.remove::<GatherTarget>(order.actor);
            world.remove::<BuildTarget>(order.actor);
            world.remove::<MoveTarget>(order.actor);
            world.add(order.actor, AttackTarget(order.target));
            world.add(order.actor, UnitState::Attacking);
        }

        for fighter in world.query(fighters) {
            // Killed earlier this tick; the death system removes it later.
            if world.get::<Health>(fighter).is_some_and(Health::is_dead) {
                continue;
            }
            if !world.has::<AttackTarget>(fighter) {
                acquire_target(world, res, fighter);
            }
            if world.has::<AttackTarget>(fighter) {
                resolve_attack(world, res, fighter);
            }
        }
    }
}

/// Anything with health that belongs to the other seat and is not carried.
fn is_enemy(world: &World, index: u8, candidate: Entity) -> bool {
    matches!(seat(world, candidate), Some(other) if other != index)
        && world
            .get::<Health>(candidate)
            .is_some_and(|health| !health.is_dead())
        && !world.has::<CarriedBy>(candidate)
}

fn acquire_target(world: &mut World, res: &MatchResources, fighter: Entity) {
    let state = world.get::<UnitState>(fighter).copied().unwrap_or_default();
    let stationary = world.has::<AutoAttackOnly>(fighter);
    if state != UnitState::Idle && !stationary {
        return;
    }
    let (Some(combat), Some(index), Some((position, radius))) = (
        world.get::<Combat>(fighter).copied(),
        seat(world, fighter),
        body(world, fighter),
    ) else {
        return;
    };

    let scan = if stationary {
        combat.range
    } else {
        combat.range + res.tuning.physics.acquisition_bonus
    };
    // Bucket query is padded by the largest plausible target radius.
    let pad = radius + scan + res.tuning.physics.cell_size;
    let mut best: Option<(Fixed, Entity)> = None;
    for candidate in res.spatial.query_circle(position, pad) {
        if candidate == fighter || !world.exists(candidate) || !is_enemy(world, index, candidate) {
            continue;
        }
        let Some(gap) = edge_distance(world, fighter, candidate) else {
            continue;
        };
        if gap <= scan && best.map_or(true, |(d, _)| gap < d) {
            best = Some((gap, candidate));
        }
    }

    if let Some((_, target)) = best {
        debug!(%fighter, %target, "target acquired");
        world.add(fighter, AttackTarget(target));
        world.add(fighter, UnitState::Attacking);
    }
}

fn give_up(world: &mut World, fighter: Entity) {
    world.remove::<AttackTarget>(fighter);
    world.remove::<MoveTarget>(fighter);
    world.add(fighter, UnitState::Idle);
}

fn resolve_attack(world: &mut World, res: &MatchResources, fighter: Entity) {
    let Some(combat) = world.get::<Combat>(fighter).copied() else {
        return;
    };
    let Some(index) = seat(world, fighter) else {
        return;
    };
    let target = match world.relation::<AttackTarget>(fighter) {
        Some(target) if world.has::<Position>(target) && is_enemy(world, index, target) => target,
        _ => {
            debug!(%fighter, "attack target lost");
            give_up(world, fighter);
            return;
        }
    };
    let Some(gap) = edge_distance(world, fighter, target) else {
        give_up(world, fighter);
        return;
    };

    if gap > combat.range {
        if world.has::<AutoAttackOnly>(fighter) {
            // Stationary fighters never chase.
            give_up(world, fighter);
        } else if let Some(at) = world.get::<Position>(target).map(|p| p.0) {
            world.add(fighter, MoveTarget(at));
        }
        return;
    }
    world.remove::<MoveTarget>(fighter);

    let Some(cooldown) = world.get_mut::<AttackCooldown>(fighter) else {
        return;
    };
    cooldown.0 -= res.dt;
    if cooldown.0 > Fixed::ZERO {
        return;
    }
    cooldown.0 = combat.cooldown();

    let mut killed = false;
    if let Some(health) = world.get_mut::<Health>(target) {
        health.apply_damage(combat.damage);
        killed = health.is_dead();
    }
    world.send(AttackEvent {
        attacker: fighter,
        target,
        damage: combat.damage,
    });
    if killed {
        world.send(DeathEvent { entity: target });
        give_up(world, fighter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Owner;
    use crate::config::MatchConfig;
    use crate::data::Tuning;
    use crate::math::Vec2Fixed;
    use crate::player::{PlayerId, Players};
    use crate::spawn::spawn_unit;

    fn setup(gap_x: i32) -> (World, MatchResources, CombatSystem, Entity, Entity) {
        let tuning = Tuning::default();
        let players = Players::new(PlayerId(1), PlayerId(2), 200);
        let res = MatchResources::new(MatchConfig::default(), tuning.clone(), players);
        let mut world = World::new();
        let blue = Owner {
            player: PlayerId(1),
            index: 0,
        };
        let red = Owner {
            player: PlayerId(2),
            index: 1,
        };
        let marine =
            spawn_unit(&mut world, &tuning, "marine", blue, Vec2Fixed::from_ints(1000, 500)).unwrap();
        let victim = spawn_unit(
            &mut world,
            &tuning,
            "worker",
            red,
            Vec2Fixed::from_ints(1000 + gap_x, 500),
        )
        .unwrap();
        let mut system = CombatSystem::default();
        system.init(&mut world);
        (world, res, system, marine, victim)
    }

    #[test]
    fn test_idle_unit_acquires_nearby_enemy() {
        let (mut world, mut res, mut system, marine, victim) = setup(100);
        system.run(&mut world, &mut res);
        assert_eq!(world.relation::<AttackTarget>(marine), Some(victim));
        assert_eq!(world.get::<UnitState>(marine), Some(&UnitState::Attacking));
    }

    #[test]
    fn test_acquisition_sees_positions_from_this_tick() {
        let (mut world, mut res, mut system, marine, victim) = setup(900);
        system.run(&mut world, &mut res);
        assert!(!world.has::<AttackTarget>(marine));

        // Walks into range between two combat passes.
        if let Some(p) = world.get_mut::<Position>(victim) {
            p.0 = Vec2Fixed::from_ints(1100, 500);
        }
        system.run(&mut world, &mut res);
        assert_eq!(world.relation::<AttackTarget>(marine), Some(victim));
    }

    #[test]
    fn test_first_hit_lands_then_cooldown() {
        let (mut world, mut res, mut system, marine, victim) = setup(100);
        world.add(marine, AttackTarget(victim));
        world.add(marine, UnitState::Attacking);
        system.run(&mut world, &mut res);
        assert_eq!(world.read::<AttackEvent>().len(), 1);
        assert_eq!(world.get::<Health>(victim).map(|h| h.current), Some(40 - 6));

        world.rotate_messages();
        system.run(&mut world, &mut res);
        assert!(world.read::<AttackEvent>().is_empty());
    }

    #[test]
    fn test_kill_emits_death_and_goes_idle() {
        let (mut world, mut res, mut system, marine, victim) = setup(100);
        if let Some(health) = world.get_mut::<Health>(victim) {
            health.current = 3;
        }
        world.add(marine, AttackTarget(victim));
        world.add(marine, UnitState::Attacking);
        system.run(&mut world, &mut res);
        assert_eq!(world.read::<DeathEvent>(), &[DeathEvent { entity: victim }]);
        assert!(!world.has::<AttackTarget>(marine));
        assert_eq!(world.get::<UnitState>(marine), Some(&UnitState::Idle));
    }

    #[test]
    fn test_out_of_range_chases() {
        let (mut world, mut res, mut system, marine, victim) = setup(600);
        world.add(marine, AttackTarget(victim));
        world.add(marine, UnitState::Attacking);
        system.run(&mut world, &mut res);
        assert_eq!(
            world.get::<MoveTarget>(marine).map(|t| t.0),
            Some(Vec2Fixed::from_ints(1600, 500))
        );
        assert!(world.read::<AttackEvent>().is_empty());
    }

    #[test]
    fn test_destroyed_target_returns_to_idle() {
        let (mut world, mut res, mut system, marine, victim) = setup(100);
        world.add(marine, AttackTarget(victim));
        world.add(marine, UnitState::Attacking);
        world.destroy(victim);
        system.run(&mut world, &mut res);
        assert!(!world.has::<AttackTarget>(marine));
        assert_eq!(world.get::<UnitState>(marine), Some(&UnitState::Idle));
    }
}
