//! One match: world, schedule, shared resources and the phase machine.
//!
//! # Phases
//!
//! ```text
//! Waiting --start()--> Countdown { remaining } --0--> Playing --goal--> GameOver
//! ```
//!
//! Gameplay systems only run while `Playing`. `GameOver` is terminal:
//! further ticks do nothing and further commands are refused.
//!
//! # Example
//!
//! ```
//! use arena_core::prelude::*;
//!
//! let mut sim = Simulation::with_defaults(PlayerId(1), PlayerId(2)).unwrap();
//! sim.start();
//! while !sim.phase().is_playing() {
//!     sim.tick();
//! }
//! sim.queue_command(PlayerId(1), PlayerCommand::Pickup).unwrap();
//! sim.tick();
//! ```

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::commands::PlayerCommand;
use crate::config::MatchConfig;
use crate::data::Tuning;
use crate::ecs::{Scheduler, World};
use crate::error::{GameError, Result};
use crate::map_generation::{generate_world, StartingLayout};
use crate::messages::{AttackEvent, DeathEvent, GameOver, ResourceDeposit};
use crate::player::{PlayerId, Players};
use crate::snapshot::{MatchEvent, WorldSnapshot};
use crate::systems::{build_schedule, recompute_supply, MatchResources};

/// Where a match is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum MatchPhase {
    /// Created, not started.
    Waiting,
    /// Counting down to kick-off.
    Countdown {
        /// Ticks left.
        remaining: u64,
    },
    /// Gameplay running.
    Playing,
    /// Finished.
    GameOver {
        /// Winning seat.
        winner: u8,
        /// Why the match ended.
        reason: String,
    },
}

impl MatchPhase {
    /// Check if gameplay is running.
    #[must_use]
    pub const fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }

    /// Check if the match has ended.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        matches!(self, Self::GameOver { .. })
    }
}

/// Events produced by one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchEvents {
    /// Hits landed.
    pub attacks: Vec<AttackEvent>,
    /// Entities killed.
    pub deaths: Vec<DeathEvent>,
    /// Cargo delivered.
    pub deposits: Vec<ResourceDeposit>,
    /// Set on the tick the match ends.
    pub game_over: Option<GameOver>,
}

impl MatchEvents {
    /// Check if nothing happened.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attacks.is_empty()
            && self.deaths.is_empty()
            && self.deposits.is_empty()
            && self.game_over.is_none()
    }

    /// Events clients are told about, in a stable order. Deposits stay
    /// internal.
    #[must_use]
    pub fn broadcast(&self) -> Vec<MatchEvent> {
        self.attacks
            .iter()
            .map(MatchEvent::from)
            .chain(self.deaths.iter().map(MatchEvent::from))
            .chain(self.game_over.iter().map(MatchEvent::from))
            .collect()
    }
}

/// A single deterministic match.
pub struct Simulation {
    world: World,
    scheduler: Scheduler<MatchResources>,
    resources: MatchResources,
    phase: MatchPhase,
    layout: StartingLayout,
}

impl Simulation {
    /// Set up a match between two players and lay out the map.
    pub fn new(
        config: MatchConfig,
        tuning: Tuning,
        first: PlayerId,
        second: PlayerId,
    ) -> Result<Self> {
        config.validate()?;
        tuning.validate()?;
        if first == second {
            return Err(GameError::InvalidState(
                "a match needs two distinct players".into(),
            ));
        }
        let players = Players::new(first, second, config.starting_resources);
        let mut resources = MatchResources::new(config, tuning, players);

        let mut world = World::new();
        let layout = generate_world(
            &mut world,
            &resources.config,
            &resources.tuning,
            &resources.map,
            &resources.players,
        )?;
        // Starting buildings and workers count before the first tick runs.
        recompute_supply(&world, &resources.tuning, &mut resources.players);
        let scheduler = build_schedule(&mut world);

        Ok(Self {
            world,
            scheduler,
            resources,
            phase: MatchPhase::Waiting,
            layout,
        })
    }

    /// Match with default settings and the built-in tuning sheet.
    pub fn with_defaults(first: PlayerId, second: PlayerId) -> Result<Self> {
        Self::new(MatchConfig::default(), Tuning::default(), first, second)
    }

    /// Begin the countdown. Does nothing unless waiting.
    pub fn start(&mut self) {
        if self.phase != MatchPhase::Waiting {
            return;
        }
        let remaining = self.resources.config.countdown_ticks();
        self.phase = if remaining == 0 {
            MatchPhase::Playing
        } else {
            MatchPhase::Countdown { remaining }
        };
        info!(countdown_ticks = remaining, "match starting");
    }

    /// Advance one fixed tick.
    pub fn tick(&mut self) -> MatchEvents {
        match self.phase {
            MatchPhase::Waiting | MatchPhase::GameOver { .. } => MatchEvents::default(),
            MatchPhase::Countdown { remaining } => {
                let remaining = remaining.saturating_sub(1);
                self.phase = if remaining == 0 {
                    info!(tick = self.resources.tick, "kick-off");
                    MatchPhase::Playing
                } else {
                    MatchPhase::Countdown { remaining }
                };
                self.resources.tick += 1;
                MatchEvents::default()
            }
            MatchPhase::Playing => self.run_systems(),
        }
    }

    fn run_systems(&mut self) -> MatchEvents {
        self.scheduler.tick(&mut self.world, &mut self.resources);
        self.resources.tick += 1;

        // The bus has rotated; this tick's messages are now the previous ones.
        let events = MatchEvents {
            attacks: self.world.read_previous::<AttackEvent>().to_vec(),
            deaths: self.world.read_previous::<DeathEvent>().to_vec(),
            deposits: self.world.read_previous::<ResourceDeposit>().to_vec(),
            game_over: self.world.read_previous::<GameOver>().first().cloned(),
        };
        if let Some(over) = &events.game_over {
            info!(
                winner = over.winner_index,
                tick = self.resources.tick,
                "match finished"
            );
            self.phase = MatchPhase::GameOver {
                winner: over.winner_index,
                reason: over.reason.clone(),
            };
            self.world.clear_messages();
        }

        #[cfg(feature = "debug-validation")]
        {
            if let Ok(hash) = self.state_hash() {
                tracing::debug!(tick = self.resources.tick, state_hash = hash, "state hash");
            }
        }

        events
    }

    /// Queue a command for the next tick.
    pub fn queue_command(&mut self, player: PlayerId, command: PlayerCommand) -> Result<()> {
        match self.phase {
            MatchPhase::GameOver { .. } => return Err(GameError::MatchOver),
            MatchPhase::Playing => {}
            _ => return Err(GameError::InvalidState("match is not running".into())),
        }
        self.resources.players.index_of(player)?;
        self.resources.pending.push_back((player, command));
        Ok(())
    }

    /// Commands waiting for the next tick.
    #[must_use]
    pub fn pending_commands(&self) -> usize {
        self.resources.pending.len()
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> &MatchPhase {
        &self.phase
    }

    /// Ticks run since `start`.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.resources.tick
    }

    /// Entities created at match start.
    #[must_use]
    pub const fn layout(&self) -> &StartingLayout {
        &self.layout
    }

    /// Read access to the world.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Mutable world access for tests and tools. Mutating outside a tick
    /// bypasses command validation.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Shared match resources.
    #[must_use]
    pub const fn resources(&self) -> &MatchResources {
        &self.resources
    }

    /// Both players.
    #[must_use]
    pub const fn players(&self) -> &Players {
        &self.resources.players
    }

    /// Names of the gameplay systems in execution order.
    #[must_use]
    pub fn system_names(&self) -> Vec<&'static str> {
        self.scheduler.system_names()
    }

    /// Capture the world for clients.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::capture(&self.world, &self.resources, &self.phase)
    }

    /// Hash of the canonical snapshot, for determinism checks.
    pub fn state_hash(&self) -> Result<u64> {
        self.snapshot().state_hash()
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("phase", &self.phase)
            .field("tick", &self.resources.tick)
            .field("entities", &self.world.entity_count())
            .finish_non_exhaustive()
    }
}
