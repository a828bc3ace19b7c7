//! End-to-end match scenarios.
//!
//! Each test drives a full match through `Simulation` with player commands
//! only, and checks what a client would see in the snapshot.

use arena_core::prelude::*;
use arena_test_utils::determinism::match_hash;
use arena_test_utils::fixtures::{
    avatar_of, base_of, entities_of_type, first_worker, playing_match, run_ticks, run_until,
    waiting_match, PLAYER_ONE, PLAYER_TWO,
};

fn owned_workers(sim: &Simulation, player: PlayerId) -> usize {
    sim.snapshot()
        .actors
        .iter()
        .filter(|a| a.subtype.as_deref() == Some("worker") && a.owner_id == Some(player.0))
        .count()
}

#[test]
fn world_generation_populates_both_halves() {
    let sim = waiting_match();
    let snapshot = sim.snapshot();

    assert_eq!((snapshot.width, snapshot.height), (100, 60));
    assert_eq!(entities_of_type(sim.world(), "base").len(), 2);
    assert_eq!(owned_workers(&sim, PLAYER_ONE), 4);
    assert_eq!(owned_workers(&sim, PLAYER_TWO), 4);
    assert_eq!(snapshot.actors.iter().filter(|a| a.kind == "avatar").count(), 2);
    assert_eq!(snapshot.actors.iter().filter(|a| a.kind == "ball").count(), 1);
    assert!(snapshot.actors.iter().filter(|a| a.kind == "resource").count() >= 4);
}

#[test]
fn move_order_walks_worker_and_goes_idle() {
    let mut sim = playing_match();
    // Rightmost worker, so the path does not cross the others.
    let worker = sim.layout().workers[0][3];
    sim.queue_command(
        PLAYER_ONE,
        PlayerCommand::Move {
            actors: vec![worker],
            x: 600.0,
            y: 700.0,
        },
    )
    .unwrap();

    sim.tick();
    let moving = sim.snapshot();
    let view = moving.actor(worker).unwrap();
    assert_eq!(view.state.as_deref(), Some("moving"));
    assert_eq!((view.target_x, view.target_y), (Some(600.0), Some(700.0)));

    let arrived = run_until(&mut sim, 60 * 10, |s| {
        s.snapshot().actor(worker).and_then(|a| a.state.clone()).as_deref() == Some("idle")
    });
    assert!(arrived.is_some(), "worker never arrived");
    let view = sim.snapshot().actor(worker).cloned().unwrap();
    assert!((view.x - 600.0).abs() <= 5.0 && (view.y - 700.0).abs() <= 5.0);
}

#[test]
fn gather_order_delivers_minerals() {
    let mut sim = playing_match();
    let worker = first_worker(&sim, 0);
    let mineral = sim.layout().minerals[0];
    sim.queue_command(
        PLAYER_ONE,
        PlayerCommand::Gather {
            workers: vec![worker],
            resource: mineral,
        },
    )
    .unwrap();

    let mut deposited = 0;
    for _ in 0..60 * 30 {
        deposited += sim.tick().deposits.iter().map(|d| d.amount).sum::<i32>();
        if deposited > 0 {
            break;
        }
    }
    assert_eq!(deposited, 5);
    assert_eq!(sim.players().by_index(0).map(|p| p.resources), Some(205));
}

#[test]
fn build_order_places_construction_site() {
    let mut sim = playing_match();
    let worker = first_worker(&sim, 0);
    sim.queue_command(
        PLAYER_ONE,
        PlayerCommand::Build {
            worker,
            building_type: "supplyDepot".into(),
            x: 700.0,
            y: 640.0,
        },
    )
    .unwrap();
    run_ticks(&mut sim, 3);

    let snapshot = sim.snapshot();
    let site = snapshot
        .actors
        .iter()
        .find(|a| a.subtype.as_deref() == Some("supplyDepot"))
        .expect("construction site");
    assert_eq!(site.kind, "building");
    assert_eq!(site.state.as_deref(), Some("constructing"));
    assert_eq!(site.owner_id, Some(PLAYER_ONE.0));
    assert!((site.x - 700.0).abs() < 1.0 && (site.y - 640.0).abs() < 1.0);
    assert_eq!(snapshot.players[0].resources, 100);
}

#[test]
fn train_order_queues_then_spawns_worker() {
    let mut sim = playing_match();
    let base = base_of(&sim, 0);
    sim.queue_command(
        PLAYER_ONE,
        PlayerCommand::Train {
            building: base,
            unit_type: "worker".into(),
        },
    )
    .unwrap();
    sim.tick();

    let snapshot = sim.snapshot();
    let queue = snapshot.actor(base).and_then(|a| a.training_queue.clone());
    assert_eq!(queue.map(|q| q.len()), Some(1));
    assert_eq!(snapshot.actor(base).and_then(|a| a.state.clone()).as_deref(), Some("training"));
    assert_eq!(snapshot.players[0].resources, 150);
    assert_eq!(snapshot.players[0].supply_used, 5);
    assert_eq!(owned_workers(&sim, PLAYER_ONE), 4);

    let spawned = run_until(&mut sim, 60 * 14, |s| owned_workers(s, PLAYER_ONE) == 5);
    assert!(spawned.is_some(), "worker never spawned");
    let snapshot = sim.snapshot();
    assert_eq!(snapshot.actor(base).and_then(|a| a.state.clone()).as_deref(), Some("idle"));
    assert_eq!(snapshot.players[0].supply_used, 5);
}

#[test]
fn ball_pushed_into_left_goal_ends_match_once() {
    let mut sim = playing_match();
    // Clear the lane in front of the left goal.
    let blocker = avatar_of(&sim, 0);
    if let Some(position) = sim.world_mut().get_mut::<Position>(blocker) {
        position.0 = Vec2Fixed::from_ints(640, 300);
    }
    sim.queue_command(PLAYER_TWO, PlayerCommand::AvatarMove { dir_x: -1, dir_y: 0 })
        .unwrap();

    let mut game_overs = Vec::new();
    for events in run_ticks(&mut sim, 60 * 30) {
        game_overs.extend(events.game_over);
    }

    assert_eq!(game_overs.len(), 1);
    assert_eq!(game_overs[0].winner_index, 1);
    assert!(matches!(sim.phase(), MatchPhase::GameOver { winner: 1, .. }));
    assert!(matches!(
        sim.queue_command(PLAYER_ONE, PlayerCommand::Pickup),
        Err(GameError::MatchOver)
    ));
}

#[test]
fn finished_match_is_frozen() {
    let mut sim = playing_match();
    let ball = sim.layout().ball;
    if let Some(position) = sim.world_mut().get_mut::<Position>(ball) {
        position.0 = Vec2Fixed::from_ints(40, 960);
    }
    let events = sim.tick();
    assert_eq!(events.game_over.map(|g| g.winner_index), Some(1));

    let hash = match_hash(&sim);
    let tick = sim.tick_count();
    for events in run_ticks(&mut sim, 30) {
        assert!(events.is_empty());
    }
    assert_eq!(sim.tick_count(), tick);
    assert_eq!(match_hash(&sim), hash);
}

#[test]
fn broadcast_events_are_ordered() {
    let mut sim = playing_match();
    let ball = sim.layout().ball;
    if let Some(position) = sim.world_mut().get_mut::<Position>(ball) {
        position.0 = Vec2Fixed::from_ints(3170, 960);
    }
    let broadcast = sim.tick().broadcast();
    assert_eq!(
        broadcast,
        vec![MatchEvent::GameOver {
            winner_index: 0,
            reason: "goal scored against player 1".into(),
        }]
    );
}
