//! Player stockpiles and supply.

use tracing::info;

use crate::components::{Construction, Owner, SupplyCost, SupplyProvided, TrainingQueue};
use crate::data::Tuning;
use crate::ecs::{Filter, FilterEvent, FilterId, System, World};
use crate::messages::ResourceDeposit;
use crate::player::Players;

use super::{registered, MatchResources};

/// Credits deposits and recomputes supply from the world.
#[derive(Debug, Default)]
pub struct EconomySystem {
    providers: Option<FilterId>,
}

impl System<MatchResources> for EconomySystem {
    fn name(&self) -> &'static str {
        "economy"
    }

    fn init(&mut self, world: &mut World) {
        self.providers = Some(
            world.add_filter(
                Filter::new()
                    .with::<SupplyProvided>()
                    .with::<Owner>()
                    .without::<Construction>()
                    .tracked(),
            ),
        );
    }

    fn run(&mut self, world: &mut World, res: &mut MatchResources) {
        let providers = registered(self.providers, self.name());

        for deposit in world.read::<ResourceDeposit>() {
            if let Some(player) = res.players.by_index_mut(deposit.player_index) {
                player.resources += deposit.amount;
            }
        }

        for event in world.drain_filter_events(providers) {
            match event {
                FilterEvent::Added(building) => info!(%building, "supply online"),
                FilterEvent::Removed(building) => info!(%building, "supply offline"),
            }
        }

        recompute_supply(world, &res.tuning, &mut res.players);
    }
}

/// Set every player's supply from the world: cap from completed buildings,
/// usage from live units plus queued production.
pub(crate) fn recompute_supply(world: &World, tuning: &Tuning, players: &mut Players) {
    let mut cap = [0u32; 2];
    let mut used = [0u32; 2];
    for (building, supply) in world.get_all::<SupplyProvided>() {
        if world.has::<Construction>(building) {
            continue;
        }
        if let Some(slot) = world
            .get::<Owner>(building)
            .and_then(|owner| cap.get_mut(owner.index as usize))
        {
            *slot += supply.0;
        }
    }
    for (unit, cost) in world.get_all::<SupplyCost>() {
        if let Some(slot) = world
            .get::<Owner>(unit)
            .and_then(|owner| used.get_mut(owner.index as usize))
        {
            *slot += cost.0;
        }
    }
    for (building, queue) in world.get_all::<TrainingQueue>() {
        let queued: u32 = queue
            .items
            .iter()
            .filter_map(|item| tuning.unit(&item.unit_type).ok())
            .map(|data| data.supply)
            .sum();
        if let Some(slot) = world
            .get::<Owner>(building)
            .and_then(|owner| used.get_mut(owner.index as usize))
        {
            *slot += queued;
        }
    }

    for player in players.iter_mut() {
        let seat = player.index as usize;
        player.supply_cap = cap.get(seat).copied().unwrap_or_default();
        player.supply_used = used.get(seat).copied().unwrap_or_default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::TrainingItem;
    use crate::config::MatchConfig;
    use crate::ecs::Entity;
    use crate::math::{Fixed, Vec2Fixed};
    use crate::player::{PlayerId, Players};
    use crate::spawn::{spawn_building, spawn_unit};

    fn owner(index: u8) -> Owner {
        Owner {
            player: PlayerId(u64::from(index) + 1),
            index,
        }
    }

    fn setup() -> (World, MatchResources, EconomySystem) {
        let tuning = Tuning::default();
        let players = Players::new(PlayerId(1), PlayerId(2), 200);
        let res = MatchResources::new(MatchConfig::default(), tuning, players);
        let mut world = World::new();
        let mut system = EconomySystem::default();
        system.init(&mut world);
        (world, res, system)
    }

    fn building(
        world: &mut World,
        res: &MatchResources,
        kind: &str,
        seat: u8,
        site: bool,
    ) -> Entity {
        let at = Vec2Fixed::from_ints(400, 400);
        spawn_building(world, &res.tuning, kind, owner(seat), at, site).unwrap()
    }

    #[test]
    fn test_deposit_credits_owner() {
        let (mut world, mut res, mut system) = setup();
        let worker = world.create();
        world.send(ResourceDeposit {
            player_index: 1,
            amount: 5,
            worker,
        });
        system.run(&mut world, &mut res);
        assert_eq!(res.players.by_index(0).map(|p| p.resources), Some(200));
        assert_eq!(res.players.by_index(1).map(|p| p.resources), Some(205));
    }

    #[test]
    fn test_supply_counts_completed_buildings_only() {
        let (mut world, mut res, mut system) = setup();
        building(&mut world, &res, "base", 0, false);
        let depot = building(&mut world, &res, "supplyDepot", 0, true);
        building(&mut world, &res, "supplyDepot", 1, false);
        system.run(&mut world, &mut res);
        assert_eq!(res.players.by_index(0).map(|p| p.supply_cap), Some(10));
        assert_eq!(res.players.by_index(1).map(|p| p.supply_cap), Some(8));

        world.remove::<Construction>(depot);
        system.run(&mut world, &mut res);
        assert_eq!(res.players.by_index(0).map(|p| p.supply_cap), Some(18));
    }

    #[test]
    fn test_supply_used_includes_queue() {
        let (mut world, mut res, mut system) = setup();
        let base = building(&mut world, &res, "base", 0, false);
        spawn_unit(&mut world, &res.tuning, "brute", owner(0), Vec2Fixed::from_ints(500, 500))
            .unwrap();
        if let Some(queue) = world.get_mut::<TrainingQueue>(base) {
            queue.items.push_back(TrainingItem {
                unit_type: "worker".to_string(),
                progress: Fixed::ZERO,
                duration: Fixed::from_num(12),
            });
        }
        system.run(&mut world, &mut res);
        assert_eq!(res.players.by_index(0).map(|p| p.supply_used), Some(3));
        assert_eq!(res.players.by_index(1).map(|p| p.supply_used), Some(0));
    }
}
