//! Match-start world layout.
//!
//! The layout is fixed and mirrored across the vertical centre line so both
//! seats start with identical positions: a completed base in the upper
//! quarter of each half, a column of mineral patches behind it, workers in
//! front of it, avatars on the centre line and the ball in the middle.

use tracing::info;

use crate::components::Owner;
use crate::config::MatchConfig;
use crate::data::Tuning;
use crate::ecs::{Entity, World};
use crate::error::Result;
use crate::map::MapGeometry;
use crate::math::{Fixed, Vec2Fixed};
use crate::player::Players;
use crate::spawn::{spawn_avatar, spawn_ball, spawn_building, spawn_resource, spawn_unit};

/// Base position for seat 0, in tiles.
const BASE_TILE: (u32, u32) = (12, 14);
/// Column of the mineral line for seat 0, in tiles.
const MINERAL_COLUMN: u32 = 4;
/// First mineral row, in tiles.
const MINERAL_FIRST_ROW: u32 = 8;
/// Rows between mineral patches.
const MINERAL_ROW_STEP: u32 = 3;
/// Avatar position for seat 0, in tiles.
const AVATAR_TILE: (u32, u32) = (20, 30);
/// Spacing between starting workers, in world units.
const WORKER_SPACING: i32 = 28;

/// Entities created at match start, by seat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartingLayout {
    /// Starting base per seat.
    pub bases: Vec<Entity>,
    /// Starting workers per seat.
    pub workers: Vec<Vec<Entity>>,
    /// Avatar per seat.
    pub avatars: Vec<Entity>,
    /// Every mineral patch.
    pub minerals: Vec<Entity>,
    /// The ball.
    pub ball: Entity,
}

fn tile_point(config: &MatchConfig, tile: (u32, u32)) -> Vec2Fixed {
    Vec2Fixed::new(config.tiles(tile.0), config.tiles(tile.1))
}

/// Populate an empty world for a new match.
pub fn generate_world(
    world: &mut World,
    config: &MatchConfig,
    tuning: &Tuning,
    map: &MapGeometry,
    players: &Players,
) -> Result<StartingLayout> {
    let mut layout = StartingLayout::default();

    for seat in players.iter() {
        let owner = Owner {
            player: seat.id,
            index: seat.index,
        };
        let place = |point: Vec2Fixed| {
            if seat.index == 0 {
                point
            } else {
                map.mirror(point)
            }
        };

        let base_pos = place(tile_point(config, BASE_TILE));
        let base = spawn_building(world, tuning, "base", owner, base_pos, false)?;
        layout.bases.push(base);

        for i in 0..config.minerals_per_side {
            let row = MINERAL_FIRST_ROW + i * MINERAL_ROW_STEP;
            let pos = place(tile_point(config, (MINERAL_COLUMN, row)));
            layout.minerals.push(spawn_resource(world, tuning, pos));
        }

        // Workers line up just below the base.
        let below =
            config.tiles(BASE_TILE.1) + tuning.building("base")?.radius + Fixed::from_num(32);
        let half_span = Fixed::from_num(WORKER_SPACING) * Fixed::from_num(config.workers_per_base)
            / Fixed::from_num(2);
        let mut workers = Vec::new();
        for i in 0..config.workers_per_base {
            let x = config.tiles(BASE_TILE.0) - half_span
                + Fixed::from_num(WORKER_SPACING) * Fixed::from_num(i)
                + Fixed::from_num(WORKER_SPACING / 2);
            let pos = place(Vec2Fixed::new(x, below));
            workers.push(spawn_unit(world, tuning, "worker", owner, pos)?);
        }
        layout.workers.push(workers);

        let avatar_pos = place(tile_point(config, AVATAR_TILE));
        layout.avatars.push(spawn_avatar(world, tuning, owner, avatar_pos));
    }

    layout.ball = spawn_ball(world, tuning, map.centre());

    info!(
        entities = world.entity_count(),
        minerals = layout.minerals.len(),
        "world generated"
    );
    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Identity, Position};
    use crate::player::PlayerId;

    #[test]
    fn test_layout_is_mirrored() {
        let config = MatchConfig::default();
        let tuning = Tuning::default();
        let map = MapGeometry::from_config(&config);
        let players = Players::new(PlayerId(1), PlayerId(2), config.starting_resources);
        let mut world = World::new();
        let layout = generate_world(&mut world, &config, &tuning, &map, &players).unwrap();

        let left = world.get::<Position>(layout.bases[0]).unwrap().0;
        let right = world.get::<Position>(layout.bases[1]).unwrap().0;
        assert_eq!(map.mirror(left), right);
        assert_eq!(world.get::<Position>(layout.ball).unwrap().0, map.centre());
        assert!(world
            .get::<Identity>(layout.minerals[0])
            .is_some_and(|id| id.is("mineral")));
    }

    #[test]
    fn test_everything_starts_inside_the_octagon() {
        let config = MatchConfig::default();
        let tuning = Tuning::default();
        let map = MapGeometry::from_config(&config);
        let players = Players::new(PlayerId(1), PlayerId(2), config.starting_resources);
        let mut world = World::new();
        generate_world(&mut world, &config, &tuning, &map, &players).unwrap();

        for (_, position) in world.get_all::<Position>() {
            assert!(map.contains(position.0, Fixed::from_num(10)));
        }
    }
}
