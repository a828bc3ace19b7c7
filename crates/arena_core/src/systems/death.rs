//! Removal of killed entities.

use tracing::debug;

use crate::components::{CarriedBy, CarriedUnit};
use crate::ecs::{System, World};
use crate::messages::DeathEvent;

use super::MatchResources;

/// Destroys every entity named by a death event this tick.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeathSystem;

impl System<MatchResources> for DeathSystem {
    fn name(&self) -> &'static str {
        "death"
    }

    fn run(&mut self, world: &mut World, _res: &mut MatchResources) {
        for event in world.read::<DeathEvent>().to_vec() {
            let entity = event.entity;
            if !world.exists(entity) {
                continue;
            }
            if let Some(avatar) = world.relation::<CarriedBy>(entity) {
                world.remove::<CarriedUnit>(avatar);
            }
            world.destroy(entity);
            debug!(%entity, "entity removed");
        }
    }
}
