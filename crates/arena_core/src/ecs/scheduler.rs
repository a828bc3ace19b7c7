//! Fixed-order system scheduler.
//!
//! Systems run once per tick in registration order against the world and a
//! shared resources value, after which the message bus rotates. There is no
//! parallelism inside a tick: one match is a single writer.

use crate::ecs::World;

/// A unit of per-tick logic.
///
/// `R` is the resources value shared by every system of a schedule (tuning
/// data, players, the command inbox, and so on).
pub trait System<R>: Send {
    /// Name used in trace spans.
    fn name(&self) -> &'static str;

    /// Register filters or other world state. Called once, when added.
    fn init(&mut self, _world: &mut World) {}

    /// Execute the system for one tick.
    fn run(&mut self, world: &mut World, resources: &mut R);
}

/// Ordered list of systems.
pub struct Scheduler<R> {
    systems: Vec<Box<dyn System<R>>>,
    ticks_run: u64,
}

impl<R> Scheduler<R> {
    /// Create an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
            ticks_run: 0,
        }
    }

    /// Append a system and let it initialise against the world.
    pub fn add_system<S: System<R> + 'static>(&mut self, world: &mut World, mut system: S) {
        system.init(world);
        self.systems.push(Box::new(system));
    }

    /// Run every system once, in order, then rotate messages.
    pub fn tick(&mut self, world: &mut World, resources: &mut R) {
        for system in &mut self.systems {
            let _span = tracing::trace_span!("system", name = system.name()).entered();
            system.run(world, resources);
        }
        world.rotate_messages();
        self.ticks_run += 1;
    }

    /// Names of registered systems, in execution order.
    #[must_use]
    pub fn system_names(&self) -> Vec<&'static str> {
        self.systems.iter().map(|system| system.name()).collect()
    }

    /// Get the number of registered systems.
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Number of completed ticks.
    #[must_use]
    pub const fn ticks_run(&self) -> u64 {
        self.ticks_run
    }
}

impl<R> Default for Scheduler<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> std::fmt::Debug for Scheduler<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("systems", &self.system_names())
            .field("ticks_run", &self.ticks_run)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::Entity;
    use crate::messages::DeathEvent;

    struct Emitter;

    impl System<Vec<String>> for Emitter {
        fn name(&self) -> &'static str {
            "emitter"
        }

        fn run(&mut self, world: &mut World, log: &mut Vec<String>) {
            log.push(format!(
                "emitter saw {} previous",
                world.read_previous::<DeathEvent>().len()
            ));
            world.send(DeathEvent { entity: Entity(1) });
        }
    }

    struct Reader;

    impl System<Vec<String>> for Reader {
        fn name(&self) -> &'static str {
            "reader"
        }

        fn run(&mut self, world: &mut World, log: &mut Vec<String>) {
            log.push(format!(
                "reader saw {} current",
                world.read::<DeathEvent>().len()
            ));
        }
    }

    #[test]
    fn test_systems_run_in_registration_order() {
        let mut world = World::new();
        let mut scheduler = Scheduler::new();
        scheduler.add_system(&mut world, Emitter);
        scheduler.add_system(&mut world, Reader);
        assert_eq!(scheduler.system_names(), vec!["emitter", "reader"]);

        let mut log = Vec::new();
        scheduler.tick(&mut world, &mut log);
        scheduler.tick(&mut world, &mut log);

        assert_eq!(
            log,
            vec![
                "emitter saw 0 previous",
                "reader saw 1 current",
                "emitter saw 1 previous",
                "reader saw 1 current",
            ]
        );
        assert_eq!(scheduler.ticks_run(), 2);
        assert!(world.read::<DeathEvent>().is_empty());
    }
}
