//! Room loop tests on tokio's paused clock.
//!
//! With the clock paused, time only moves when every task is idle, so the
//! 60 Hz interval and the 20 Hz broadcast are exact and the tests are fast.

use std::time::Duration;

use arena_core::commands::PlayerCommand;
use arena_core::data::Tuning;
use arena_core::snapshot::{MatchEvent, WorldSnapshot};
use arena_server::{spawn_room, RoomOutcome, ServerConfig, ServerError, ServerMessage};
use arena_test_utils::fixtures::{instant_config, PLAYER_ONE, PLAYER_TWO};
use tokio::sync::broadcast;
use tokio::time;

fn config() -> ServerConfig {
    ServerConfig {
        match_config: instant_config(),
        ..ServerConfig::default()
    }
}

fn drain_snapshots(updates: &mut broadcast::Receiver<ServerMessage>) -> Vec<WorldSnapshot> {
    let mut snapshots = Vec::new();
    while let Ok(message) = updates.try_recv() {
        if let ServerMessage::Snapshot(snapshot) = message {
            snapshots.push(snapshot);
        }
    }
    snapshots
}

#[tokio::test(start_paused = true)]
async fn snapshots_arrive_at_broadcast_rate_not_tick_rate() {
    let room = spawn_room(1, &config(), Tuning::default(), (PLAYER_ONE, PLAYER_TWO)).unwrap();
    let mut updates = room.subscribe();

    // Sample every 50 ms for two seconds.
    let mut snapshots = 0usize;
    let mut last_tick = 0;
    for _ in 0..40 {
        time::sleep(Duration::from_millis(50)).await;
        for snapshot in drain_snapshots(&mut updates) {
            snapshots += 1;
            last_tick = snapshot.tick;
        }
    }

    let per_second = snapshots as f64 / 2.0;
    assert!(
        (15.0..=25.0).contains(&per_second),
        "{snapshots} snapshots in 2 s"
    );
    // The simulation itself ran at 60 Hz.
    assert!((115..=121).contains(&last_tick), "last snapshot at tick {last_tick}");

    room.shutdown();
    assert!(matches!(room.join().await, Ok(RoomOutcome::Stopped { .. })));
}

#[tokio::test(start_paused = true)]
async fn queued_commands_reach_the_next_tick() {
    let room = spawn_room(2, &config(), Tuning::default(), (PLAYER_ONE, PLAYER_TWO)).unwrap();
    let mut updates = room.subscribe();

    time::sleep(Duration::from_millis(100)).await;
    let first = drain_snapshots(&mut updates).pop().expect("a snapshot");
    let base = first
        .actors
        .iter()
        .find(|a| a.subtype.as_deref() == Some("base") && a.owner_id == Some(PLAYER_ONE.0))
        .map(|a| a.id)
        .expect("player one's base");

    room.submit_json(
        PLAYER_ONE,
        &format!(r#"{{"type":"train","building":{base},"unitType":"worker"}}"#),
    )
    .unwrap();
    time::sleep(Duration::from_millis(100)).await;

    let latest = drain_snapshots(&mut updates).pop().expect("a snapshot");
    assert_eq!(latest.players[0].resources, 150);
    let queue = latest
        .actors
        .iter()
        .find(|a| a.id == base)
        .and_then(|a| a.training_queue.clone());
    assert_eq!(queue.map(|q| q.len()), Some(1));

    room.shutdown();
    room.join().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn shutdown_discards_queued_commands() {
    let room = spawn_room(3, &config(), Tuning::default(), (PLAYER_ONE, PLAYER_TWO)).unwrap();
    for _ in 0..3 {
        room.submit(PLAYER_ONE, PlayerCommand::Pickup).unwrap();
    }
    room.shutdown();

    let outcome = room.join().await.unwrap();
    assert_eq!(outcome, RoomOutcome::Stopped { discarded: 3, ticks: 0 });
}

#[tokio::test(start_paused = true)]
async fn closed_room_refuses_commands() {
    let room = spawn_room(4, &config(), Tuning::default(), (PLAYER_ONE, PLAYER_TWO)).unwrap();
    room.shutdown();
    while !room.is_finished() {
        time::sleep(Duration::from_millis(10)).await;
    }
    let result = room.submit(PLAYER_TWO, PlayerCommand::Drop);
    assert!(matches!(result, Err(ServerError::RoomClosed(4))));
}

#[tokio::test(start_paused = true)]
async fn full_queue_is_reported() {
    let config = ServerConfig {
        command_queue_limit: 2,
        ..config()
    };
    let room = spawn_room(5, &config, Tuning::default(), (PLAYER_ONE, PLAYER_TWO)).unwrap();
    room.submit(PLAYER_ONE, PlayerCommand::Pickup).unwrap();
    room.submit(PLAYER_ONE, PlayerCommand::Pickup).unwrap();
    let result = room.submit(PLAYER_ONE, PlayerCommand::Pickup);
    assert!(matches!(result, Err(ServerError::QueueFull(5))));
    room.shutdown();
    room.join().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn goal_ends_the_room() {
    let room = spawn_room(6, &config(), Tuning::default(), (PLAYER_ONE, PLAYER_TWO)).unwrap();
    let mut updates = room.subscribe();
    // Left avatar steps out of the lane, right avatar dribbles the ball home.
    room.submit(PLAYER_ONE, PlayerCommand::AvatarMove { dir_x: 0, dir_y: -1 })
        .unwrap();
    room.submit(PLAYER_TWO, PlayerCommand::AvatarMove { dir_x: -1, dir_y: 0 })
        .unwrap();

    let mut game_over_events = 0;
    let mut final_snapshot = None;
    let collect = async {
        loop {
            match updates.recv().await {
                Ok(ServerMessage::Event(MatchEvent::GameOver { winner_index, .. })) => {
                    assert_eq!(winner_index, 1);
                    game_over_events += 1;
                }
                Ok(ServerMessage::Snapshot(snapshot)) if snapshot.phase.is_over() => {
                    final_snapshot = Some(snapshot);
                    break;
                }
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };
    time::timeout(Duration::from_secs(60), collect)
        .await
        .expect("match should end");

    assert_eq!(game_over_events, 1);
    assert!(final_snapshot.is_some());
    match room.join().await.unwrap() {
        RoomOutcome::Finished { winner, .. } => assert_eq!(winner, 1),
        other => panic!("unexpected outcome {other:?}"),
    }
}
