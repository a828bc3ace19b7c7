//! Free-body integration for anything with velocity and friction (the ball).

use crate::components::{Friction, Position, Radius, Velocity};
use crate::ecs::{Filter, FilterId, System, World};
use crate::map::reflect;
use crate::math::{Fixed, Vec2Fixed};

use super::{registered, MatchResources};

/// Integrates velocity, applies friction and bounces off the boundary.
#[derive(Debug, Default)]
pub struct PhysicsSystem {
    bodies: Option<FilterId>,
}

impl System<MatchResources> for PhysicsSystem {
    fn name(&self) -> &'static str {
        "physics"
    }

    fn init(&mut self, world: &mut World) {
        self.bodies = Some(
            world.add_filter(
                Filter::new()
                    .with::<Velocity>()
                    .with::<Friction>()
                    .with::<Position>(),
            ),
        );
    }

    fn run(&mut self, world: &mut World, res: &mut MatchResources) {
        let bodies = registered(self.bodies, self.name());
        let min_speed = res.tuning.ball.min_speed;
        let restitution = res.tuning.physics.restitution;

        for body in world.query(bodies) {
            let (Some(velocity), Some(friction), Some(position)) = (
                world.get::<Velocity>(body).map(|v| v.0),
                world.get::<Friction>(body).map(|f| f.0),
                world.get::<Position>(body).map(|p| p.0),
            ) else {
                continue;
            };
            let radius = world.get::<Radius>(body).map_or(Fixed::ZERO, |r| r.0);

            let mut next = position + velocity.scale(res.dt);
            let mut velocity = velocity.scale(friction);
            if velocity.length_squared() < min_speed * min_speed {
                velocity = Vec2Fixed::ZERO;
            }
            if let Some(clamped) = res.map.clamp(next, radius) {
                next = clamped.position;
                velocity = reflect(velocity, clamped.normal, restitution);
            }

            if let Some(p) = world.get_mut::<Position>(body) {
                p.0 = next;
            }
            if let Some(v) = world.get_mut::<Velocity>(body) {
                v.0 = velocity;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;
    use crate::data::Tuning;
    use crate::ecs::Entity;
    use crate::player::{PlayerId, Players};
    use crate::spawn::spawn_ball;

    fn setup(at: Vec2Fixed, velocity: Vec2Fixed) -> (World, MatchResources, PhysicsSystem, Entity) {
        let tuning = Tuning::default();
        let players = Players::new(PlayerId(1), PlayerId(2), 200);
        let res = MatchResources::new(MatchConfig::default(), tuning.clone(), players);
        let mut world = World::new();
        let ball = spawn_ball(&mut world, &tuning, at);
        if let Some(v) = world.get_mut::<Velocity>(ball) {
            v.0 = velocity;
        }
        let mut system = PhysicsSystem::default();
        system.init(&mut world);
        (world, res, system, ball)
    }

    #[test]
    fn test_ball_moves_and_slows() {
        let (mut world, mut res, mut system, ball) =
            setup(Vec2Fixed::from_ints(1600, 960), Vec2Fixed::from_ints(300, 0));
        system.run(&mut world, &mut res);
        let pos = world.get::<Position>(ball).unwrap().0;
        assert_eq!(pos.x, Fixed::from_num(1600) + Fixed::from_num(300) * res.dt);
        let speed = world.get::<Velocity>(ball).unwrap().0.x;
        assert!(speed < Fixed::from_num(300));
        assert!(speed > Fixed::from_num(295));
    }

    #[test]
    fn test_slow_ball_comes_to_rest() {
        let (mut world, mut res, mut system, ball) =
            setup(Vec2Fixed::from_ints(1600, 960), Vec2Fixed::from_ints(1, 1));
        system.run(&mut world, &mut res);
        assert!(world.get::<Velocity>(ball).unwrap().0.is_zero());
    }

    #[test]
    fn test_ball_bounces_off_top_wall() {
        let (mut world, mut res, mut system, ball) =
            setup(Vec2Fixed::from_ints(1600, 13), Vec2Fixed::from_ints(0, -600));
        system.run(&mut world, &mut res);
        let velocity = world.get::<Velocity>(ball).unwrap().0;
        assert!(velocity.y > Fixed::ZERO);
        let pos = world.get::<Position>(ball).unwrap().0;
        assert!(pos.y >= Fixed::from_num(12));
    }
}
