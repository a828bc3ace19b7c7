//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a match produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! Every client renders snapshots of the same authoritative match, and
//! replays must reproduce it bit for bit. Sources of non-determinism include:
//!
//! - **Floating-point math**: Different CPUs can produce different results.
//!   We use fixed-point arithmetic via [`arena_core::math::Fixed`] throughout.
//!
//! - **Map iteration order**: Rust's default hasher is randomized.
//!   Component stores and filters iterate in entity id order.
//!
//! - **System randomness**: The simulation has no random source at all.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual system behaviour (movement, combat, etc.)
//! 2. **Property tests**: Random command scripts must still replay identically
//! 3. **Integration tests**: Full match scenarios are reproducible
//! 4. **Parallel tests**: Running N matches on N threads all match

use std::thread;

use arena_core::commands::PlayerCommand;
use arena_core::player::PlayerId;
use arena_core::simulation::Simulation;
use arena_core::snapshot::WorldSnapshot;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic match).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the match was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Match is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Result of parallel match runs.
#[derive(Debug, Clone)]
pub struct ParallelSimResult {
    /// Final state hash from each match.
    pub hashes: Vec<u64>,
    /// Number of ticks each match ran.
    pub ticks: u64,
    /// Number of matches run.
    pub num_sims: usize,
}

impl ParallelSimResult {
    /// Check if all matches produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all matches agreed.
    ///
    /// # Panics
    ///
    /// Panics if matches produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel matches diverged!\n\
                 Matches: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_sims,
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// A command to queue just before a given tick runs.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedCommand {
    /// Tick (counted from kick-off) the command is queued before.
    pub tick: u64,
    /// Issuing player.
    pub player: PlayerId,
    /// The command.
    pub command: PlayerCommand,
}

/// Run `ticks` ticks, queuing each scripted command before its tick.
///
/// Commands the match refuses (unknown player, match over) are skipped,
/// the same way the server drops them.
pub fn run_script(sim: &mut Simulation, script: &[ScriptedCommand], ticks: u64) {
    for tick in 0..ticks {
        for scripted in script.iter().filter(|s| s.tick == tick) {
            let _ = sim.queue_command(scripted.player, scripted.command.clone());
        }
        sim.tick();
    }
}

/// Final state hash of a match, or 0 if the snapshot cannot be encoded.
#[must_use]
pub fn match_hash(sim: &Simulation) -> u64 {
    sim.state_hash().unwrap_or_default()
}

/// Run a match multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the match
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance state by one tick
/// * `hash` - Function to compute state hash
///
/// # Example
///
/// ```ignore
/// use arena_test_utils::determinism::{match_hash, verify_determinism};
/// use arena_test_utils::fixtures::playing_match;
///
/// let result = verify_determinism(
///     5,   // Run 5 times
///     100, // 100 ticks each
///     playing_match,
///     |sim| { sim.tick(); },
///     match_hash,
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run a match twice with identical setup and compare final hashes.
pub fn verify_simulation_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    let result = verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |sim| {
            sim.tick();
        },
        match_hash,
    );
    result.is_deterministic
}

/// Replay a command script twice and compare final hashes.
pub fn verify_script_determinism<F>(setup_fn: F, script: &[ScriptedCommand], ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    let mut first = setup_fn();
    let mut second = setup_fn();
    run_script(&mut first, script, ticks);
    run_script(&mut second, script, ticks);
    match_hash(&first) == match_hash(&second)
}

/// Run N matches on scoped threads and collect final hashes.
///
/// Catches non-determinism that only shows up under thread scheduling
/// or memory layout differences.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel_simulations_scoped<F>(
    setup_fn: F,
    num_sims: usize,
    num_ticks: u64,
) -> ParallelSimResult
where
    F: Fn() -> Simulation + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup_fn();
                    for _ in 0..num_ticks {
                        sim.tick();
                    }
                    match_hash(&sim)
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    ParallelSimResult {
        hashes,
        ticks: num_ticks,
        num_sims,
    }
}

/// Compare two runs tick-by-tick, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs agree throughout, `Some(tick)` if they diverge
/// at that tick.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Simulation,
{
    let mut sim1 = setup_fn();
    let mut sim2 = setup_fn();

    if match_hash(&sim1) != match_hash(&sim2) {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        sim1.tick();
        sim2.tick();

        if match_hash(&sim1) != match_hash(&sim2) {
            return Some(tick);
        }
    }

    None
}

/// Verify that a JSON round-trip of the snapshot preserves its hash.
pub fn verify_snapshot_round_trip(sim: &Simulation) -> bool {
    let snapshot = sim.snapshot();
    let Ok(json) = snapshot.to_json() else {
        return false;
    };
    let Ok(restored) = WorldSnapshot::from_json(&json) else {
        return false;
    };
    matches!(
        (snapshot.state_hash(), restored.state_hash()),
        (Ok(a), Ok(b)) if a == b
    )
}

/// Proptest strategies for determinism and robustness testing.
///
/// Entity ids are drawn from a small range so that generated commands
/// hit real entities often, and dangling ids the rest of the time.
pub mod strategies {
    use proptest::prelude::*;

    use arena_core::commands::{InteractAction, PlayerCommand};
    use arena_core::ecs::Entity;
    use arena_core::player::PlayerId;

    use super::ScriptedCommand;

    /// Generate an entity id, valid or not.
    pub fn arb_entity() -> impl Strategy<Value = Entity> {
        (0u64..64).prop_map(Entity)
    }

    /// Generate a list of entity ids.
    pub fn arb_entities() -> impl Strategy<Value = Vec<Entity>> {
        proptest::collection::vec(arb_entity(), 0..6)
    }

    /// Generate a world coordinate, sometimes off the map.
    pub fn arb_coordinate() -> impl Strategy<Value = f64> {
        prop_oneof![
            8 => (0i32..3200).prop_map(f64::from),
            1 => (-2000i32..6000).prop_map(f64::from),
            1 => Just(f64::NAN),
        ]
    }

    /// Generate a player id: one of the two seated players or a stranger.
    pub fn arb_player() -> impl Strategy<Value = PlayerId> {
        prop_oneof![Just(PlayerId(1)), Just(PlayerId(2)), Just(PlayerId(7))]
    }

    /// Generate a data-table key, known or unknown.
    pub fn arb_type_key() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("worker".to_string()),
            Just("marine".to_string()),
            Just("base".to_string()),
            Just("supplyDepot".to_string()),
            Just("barracks".to_string()),
            Just("dragon".to_string()),
        ]
    }

    /// Generate any player command.
    pub fn arb_command() -> impl Strategy<Value = PlayerCommand> {
        prop_oneof![
            (-2i8..=2, -2i8..=2).prop_map(|(dir_x, dir_y)| PlayerCommand::AvatarMove {
                dir_x,
                dir_y
            }),
            (arb_entities(), arb_coordinate(), arb_coordinate())
                .prop_map(|(actors, x, y)| PlayerCommand::Move { actors, x, y }),
            (arb_entities(), arb_entity())
                .prop_map(|(actors, target)| PlayerCommand::Attack { actors, target }),
            (arb_entities(), arb_entity())
                .prop_map(|(workers, resource)| PlayerCommand::Gather { workers, resource }),
            (arb_entity(), arb_type_key(), arb_coordinate(), arb_coordinate()).prop_map(
                |(worker, building_type, x, y)| PlayerCommand::Build {
                    worker,
                    building_type,
                    x,
                    y
                }
            ),
            (arb_entity(), arb_type_key())
                .prop_map(|(building, unit_type)| PlayerCommand::Train { building, unit_type }),
            Just(PlayerCommand::Pickup),
            Just(PlayerCommand::Drop),
            (
                arb_entity(),
                prop_oneof![Just(InteractAction::Train), Just(InteractAction::CancelTraining)],
                proptest::option::of(arb_type_key()),
            )
                .prop_map(|(building, action, unit_type)| PlayerCommand::Interact {
                    building,
                    action,
                    unit_type
                }),
        ]
    }

    /// Generate a command script spread over `ticks` ticks.
    pub fn arb_script(max_len: usize, ticks: u64) -> impl Strategy<Value = Vec<ScriptedCommand>> {
        proptest::collection::vec(
            (0..ticks.max(1), arb_player(), arb_command()).prop_map(|(tick, player, command)| {
                ScriptedCommand {
                    tick,
                    player,
                    command,
                }
            }),
            0..max_len,
        )
    }
}
