//! Whole-match determinism.
//!
//! A busy scripted match (mining, building, training, avatar play) must
//! hash identically on every replay and on every thread.

use arena_core::prelude::*;
use arena_test_utils::determinism::{
    find_first_divergence, match_hash, run_parallel_simulations_scoped, run_script,
    verify_script_determinism, verify_simulation_determinism, ScriptedCommand,
};
use arena_test_utils::fixtures::{playing_match, PLAYER_ONE, PLAYER_TWO};

fn busy_script(sim: &Simulation) -> Vec<ScriptedCommand> {
    let layout = sim.layout();
    let mut script = Vec::new();
    for seat in 0..2 {
        let player = if seat == 0 { PLAYER_ONE } else { PLAYER_TWO };
        let workers = &layout.workers[seat];
        let minerals = &layout.minerals[seat * 4..seat * 4 + 4];
        script.push(ScriptedCommand {
            tick: 0,
            player,
            command: PlayerCommand::Gather {
                workers: workers[..3].to_vec(),
                resource: minerals[1],
            },
        });
        let site_x = if seat == 0 { 700.0 } else { 2500.0 };
        script.push(ScriptedCommand {
            tick: 1,
            player,
            command: PlayerCommand::Build {
                worker: workers[3],
                building_type: "supplyDepot".into(),
                x: site_x,
                y: 640.0,
            },
        });
        script.push(ScriptedCommand {
            tick: 2,
            player,
            command: PlayerCommand::Train {
                building: layout.bases[seat],
                unit_type: "worker".into(),
            },
        });
        let dir_x = if seat == 0 { 1 } else { -1 };
        script.push(ScriptedCommand {
            tick: 3,
            player,
            command: PlayerCommand::AvatarMove { dir_x, dir_y: 0 },
        });
    }
    script
}

#[test]
fn idle_match_is_deterministic() {
    assert!(verify_simulation_determinism(playing_match, 300));
}

#[test]
fn busy_match_replays_identically() {
    let script = busy_script(&playing_match());
    assert!(verify_script_determinism(playing_match, &script, 900));
}

#[test]
fn busy_match_differs_from_idle_match() {
    let mut busy = playing_match();
    let script = busy_script(&busy);
    run_script(&mut busy, &script, 300);
    let mut idle = playing_match();
    run_script(&mut idle, &[], 300);
    assert_ne!(match_hash(&busy), match_hash(&idle));
}

#[test]
fn parallel_matches_agree() {
    let result = run_parallel_simulations_scoped(
        || {
            let mut sim = playing_match();
            let script = busy_script(&sim);
            run_script(&mut sim, &script, 10);
            sim
        },
        4,
        240,
    );
    result.assert_deterministic();
}

#[test]
fn countdown_is_deterministic() {
    let setup = || {
        let mut sim = Simulation::with_defaults(PLAYER_ONE, PLAYER_TWO).unwrap();
        sim.start();
        sim
    };
    assert_eq!(find_first_divergence(setup, 240), None);
}
