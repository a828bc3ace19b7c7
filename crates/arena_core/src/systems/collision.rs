//! Broad/narrow phase collision detection, positional resolution, and the
//! ball's response to being touched.

use crate::components::{Ball, EntityKind, Identity, MoveDirection, Position, Velocity};
use crate::data::Tuning;
use crate::ecs::{Entity, FilterId, System, World};
use crate::math::{Fixed, Vec2Fixed};
use crate::messages::Collision;

use super::{body, index_bodies, registered, solid_filter, MatchResources};

/// Rebuilds the spatial hash and emits a [`Collision`] per overlapping pair.
#[derive(Debug, Default)]
pub struct CollisionDetectionSystem {
    solids: Option<FilterId>,
}

impl System<MatchResources> for CollisionDetectionSystem {
    fn name(&self) -> &'static str {
        "collision_detection"
    }

    fn init(&mut self, world: &mut World) {
        self.solids = Some(world.add_filter(solid_filter()));
    }

    fn run(&mut self, world: &mut World, res: &mut MatchResources) {
        let solids = registered(self.solids, self.name());
        index_bodies(world, &mut res.spatial, solids);

        for (a, b) in res.spatial.candidate_pairs() {
            let (Some((pa, ra)), Some((pb, rb))) = (body(world, a), body(world, b)) else {
                continue;
            };
            let reach = ra + rb;
            let distance = pa.distance(pb);
            if distance >= reach {
                continue;
            }
            let normal = if distance == Fixed::ZERO {
                Vec2Fixed::new(Fixed::from_num(1), Fixed::ZERO)
            } else {
                (pb - pa).normalize()
            };
            world.send(Collision {
                a,
                b,
                normal,
                overlap: reach - distance,
            });
        }
    }
}

/// Push-back mass; `None` means immovable.
fn mass(world: &World, tuning: &Tuning, entity: Entity) -> Option<Fixed> {
    let physics = &tuning.physics;
    match world.get::<Identity>(entity).map(|id| id.kind) {
        Some(EntityKind::Ball) => Some(physics.ball_mass),
        Some(EntityKind::Unit) => Some(physics.unit_mass),
        Some(EntityKind::Avatar) => Some(physics.avatar_mass),
        Some(EntityKind::Building | EntityKind::Resource) | None => None,
    }
}

fn shift(world: &mut World, res: &MatchResources, entity: Entity, by: Vec2Fixed) {
    let Some((position, radius)) = body(world, entity) else {
        return;
    };
    let mut next = position + by;
    if let Some(clamped) = res.map.clamp(next, radius) {
        next = clamped.position;
    }
    if let Some(p) = world.get_mut::<Position>(entity) {
        p.0 = next;
    }
}

/// Separates overlapping pairs, splitting the push by inverse mass.
#[derive(Debug, Default, Clone, Copy)]
pub struct CollisionResolutionSystem;

impl System<MatchResources> for CollisionResolutionSystem {
    fn name(&self) -> &'static str {
        "collision_resolution"
    }

    fn run(&mut self, world: &mut World, res: &mut MatchResources) {
        for hit in world.read::<Collision>().to_vec() {
            if !world.exists(hit.a) || !world.exists(hit.b) {
                continue;
            }
            let (push_a, push_b) = match (
                mass(world, &res.tuning, hit.a),
                mass(world, &res.tuning, hit.b),
            ) {
                (None, None) => continue,
                (None, Some(_)) => (Fixed::ZERO, hit.overlap),
                (Some(_), None) => (hit.overlap, Fixed::ZERO),
                (Some(ma), Some(mb)) => {
                    let total = ma + mb;
                    (hit.overlap * mb / total, hit.overlap * ma / total)
                }
            };
            if push_a > Fixed::ZERO {
                shift(world, res, hit.a, -hit.normal.scale(push_a));
            }
            if push_b > Fixed::ZERO {
                shift(world, res, hit.b, hit.normal.scale(push_b));
            }
        }
    }
}

/// Gives the ball an impulse away from whatever touched it.
#[derive(Debug, Default, Clone, Copy)]
pub struct BallKickSystem;

impl System<MatchResources> for BallKickSystem {
    fn name(&self) -> &'static str {
        "ball_kick"
    }

    fn run(&mut self, world: &mut World, res: &mut MatchResources) {
        for hit in world.read::<Collision>().to_vec() {
            // Normal points from a to b; flip it so it points away from the kicker.
            let (ball, kicker, away) = if world.has::<Ball>(hit.b) {
                (hit.b, hit.a, hit.normal)
            } else if world.has::<Ball>(hit.a) {
                (hit.a, hit.b, -hit.normal)
            } else {
                continue;
            };
            kick(world, &res.tuning, ball, kicker, away);
        }
    }
}

fn kick(world: &mut World, tuning: &Tuning, ball: Entity, kicker: Entity, fallback: Vec2Fixed) {
    let (Some((ball_at, _)), Some((kicker_at, _))) = (body(world, ball), body(world, kicker))
    else {
        return;
    };
    let physics = &tuning.physics;
    let mut direction = (ball_at - kicker_at).normalize();
    if direction.is_zero() {
        direction = fallback;
    }

    let kind = world.get::<Identity>(kicker).map(|id| id.kind);
    let strength = match kind {
        Some(EntityKind::Avatar) => {
            let moving = world
                .get::<MoveDirection>(kicker)
                .map(|d| d.0)
                .filter(|d| !d.is_zero());
            match moving {
                Some(heading) => {
                    let blend = physics.avatar_kick_blend;
                    let mixed = direction.scale(Fixed::from_num(1) - blend) + heading.scale(blend);
                    if !mixed.is_zero() {
                        direction = mixed.normalize();
                    }
                    physics.avatar_kick * physics.avatar_moving_boost
                }
                None => physics.avatar_kick,
            }
        }
        Some(EntityKind::Unit) => physics.unit_kick,
        Some(EntityKind::Building | EntityKind::Resource) => physics.static_kick,
        Some(EntityKind::Ball) | None => return,
    };

    let Some(velocity) = world.get_mut::<Velocity>(ball) else {
        return;
    };
    let into = velocity.0.dot(direction);
    if into < Fixed::ZERO {
        velocity.0 = velocity.0 - direction.scale(into);
    }
    velocity.0 = (velocity.0 + direction.scale(strength)).clamp_length(tuning.ball.max_speed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Owner;
    use crate::config::MatchConfig;
    use crate::player::{PlayerId, Players};
    use crate::spawn::{spawn_avatar, spawn_ball, spawn_building, spawn_unit};

    const BLUE: Owner = Owner {
        player: PlayerId(1),
        index: 0,
    };

    fn resources() -> MatchResources {
        let players = Players::new(PlayerId(1), PlayerId(2), 200);
        MatchResources::new(MatchConfig::default(), Tuning::default(), players)
    }

    fn detect(world: &mut World, res: &mut MatchResources) -> Vec<Collision> {
        let mut detection = CollisionDetectionSystem::default();
        detection.init(world);
        detection.run(world, res);
        world.read::<Collision>().to_vec()
    }

    #[test]
    fn test_overlapping_units_collide() {
        let mut res = resources();
        let mut world = World::new();
        let a = spawn_unit(&mut world, &res.tuning, "marine", BLUE, Vec2Fixed::from_ints(500, 500))
            .unwrap();
        let b = spawn_unit(&mut world, &res.tuning, "marine", BLUE, Vec2Fixed::from_ints(512, 500))
            .unwrap();
        spawn_unit(&mut world, &res.tuning, "marine", BLUE, Vec2Fixed::from_ints(700, 500)).unwrap();

        let hits = detect(&mut world, &mut res);
        assert_eq!(
            hits,
            vec![Collision {
                a,
                b,
                normal: Vec2Fixed::from_ints(1, 0),
                overlap: Fixed::from_num(8),
            }]
        );
    }

    #[test]
    fn test_equal_masses_split_the_push() {
        let mut res = resources();
        let mut world = World::new();
        let a = spawn_unit(&mut world, &res.tuning, "marine", BLUE, Vec2Fixed::from_ints(500, 500))
            .unwrap();
        let b = spawn_unit(&mut world, &res.tuning, "marine", BLUE, Vec2Fixed::from_ints(512, 500))
            .unwrap();
        detect(&mut world, &mut res);
        CollisionResolutionSystem.run(&mut world, &mut res);
        assert_eq!(world.get::<Position>(a).unwrap().0, Vec2Fixed::from_ints(496, 500));
        assert_eq!(world.get::<Position>(b).unwrap().0, Vec2Fixed::from_ints(516, 500));
    }

    #[test]
    fn test_buildings_do_not_move() {
        let mut res = resources();
        let mut world = World::new();
        let depot = spawn_building(
            &mut world,
            &res.tuning,
            "supplyDepot",
            BLUE,
            Vec2Fixed::from_ints(500, 500),
            false,
        )
        .unwrap();
        let unit = spawn_unit(&mut world, &res.tuning, "marine", BLUE, Vec2Fixed::from_ints(530, 500))
            .unwrap();
        detect(&mut world, &mut res);
        CollisionResolutionSystem.run(&mut world, &mut res);
        assert_eq!(world.get::<Position>(depot).unwrap().0, Vec2Fixed::from_ints(500, 500));
        assert_eq!(world.get::<Position>(unit).unwrap().0, Vec2Fixed::from_ints(534, 500));
    }

    #[test]
    fn test_standing_avatar_kicks_ball_away() {
        let mut res = resources();
        let mut world = World::new();
        spawn_avatar(&mut world, &res.tuning, BLUE, Vec2Fixed::from_ints(1580, 960));
        let ball = spawn_ball(&mut world, &res.tuning, Vec2Fixed::from_ints(1600, 960));
        detect(&mut world, &mut res);
        BallKickSystem.run(&mut world, &mut res);
        let velocity = world.get::<Velocity>(ball).unwrap().0;
        assert_eq!(velocity, Vec2Fixed::from_ints(420, 0));
    }

    #[test]
    fn test_kick_speed_is_capped() {
        let mut res = resources();
        let mut world = World::new();
        spawn_avatar(&mut world, &res.tuning, BLUE, Vec2Fixed::from_ints(1580, 960));
        let ball = spawn_ball(&mut world, &res.tuning, Vec2Fixed::from_ints(1600, 960));
        if let Some(v) = world.get_mut::<Velocity>(ball) {
            v.0 = Vec2Fixed::from_ints(800, 0);
        }
        detect(&mut world, &mut res);
        BallKickSystem.run(&mut world, &mut res);
        let speed = world.get::<Velocity>(ball).unwrap().0.length();
        assert!(speed <= Fixed::from_num(900));
        assert!(speed > Fixed::from_num(899));
    }
}
