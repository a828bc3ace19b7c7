//! Goal detection.

use tracing::info;

use crate::components::{Ball, Position};
use crate::ecs::{System, World};
use crate::messages::GameOver;

use super::MatchResources;

/// Ends the match when the ball crosses a goal line inside the goal band.
#[derive(Debug, Default)]
pub struct VictorySystem {
    fired: bool,
}

impl System<MatchResources> for VictorySystem {
    fn name(&self) -> &'static str {
        "victory"
    }

    fn run(&mut self, world: &mut World, res: &mut MatchResources) {
        if self.fired {
            return;
        }
        let ball = world.get_all::<Ball>().map(|(e, _)| e).next();
        let Some(at) = ball.and_then(|b| world.get::<Position>(b)).map(|p| p.0) else {
            return;
        };
        let Some((winner_index, goal)) = res.map.goal_scored(at) else {
            return;
        };
        let reason = format!("goal scored against player {}", goal.defender);
        info!(winner = winner_index, tick = res.tick, %reason, "game over");
        world.send(GameOver {
            winner_index,
            reason,
        });
        self.fired = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;
    use crate::data::Tuning;
    use crate::math::Vec2Fixed;
    use crate::player::{PlayerId, Players};
    use crate::spawn::spawn_ball;

    fn run_with_ball_at(x: i32, y: i32) -> Vec<GameOver> {
        let tuning = Tuning::default();
        let players = Players::new(PlayerId(1), PlayerId(2), 200);
        let mut res = MatchResources::new(MatchConfig::default(), tuning.clone(), players);
        let mut world = World::new();
        spawn_ball(&mut world, &tuning, Vec2Fixed::from_ints(x, y));
        let mut system = VictorySystem::default();
        let mut seen = Vec::new();
        for _ in 0..3 {
            system.run(&mut world, &mut res);
            seen.extend(world.read::<GameOver>().iter().cloned());
            world.rotate_messages();
        }
        seen
    }

    #[test]
    fn test_left_goal_wins_for_right_player_once() {
        let seen = run_with_ball_at(40, 960);
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].winner_index, 1);
    }

    #[test]
    fn test_right_goal_wins_for_left_player() {
        let seen = run_with_ball_at(3160, 960);
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].winner_index, 0);
    }

    #[test]
    fn test_outside_band_is_not_a_goal() {
        assert!(run_with_ball_at(40, 500).is_empty());
        assert!(run_with_ball_at(1600, 960).is_empty());
    }
}
