//! Command intake: turns queued player commands into validated orders.
//!
//! Every command is checked once here. Anything referencing a missing
//! entity, an entity the player does not own, a carried unit or an actor
//! without the needed capability is dropped with a debug line. Stale
//! commands are routine, so none of this is an error for the match.

use tracing::debug;

use crate::commands::{InteractAction, PlayerCommand};
use crate::components::{
    AutoAttackOnly, AvatarReach, CanBuild, CanGather, CarriedBy, Combat, EntityKind, Health,
    Identity, Owner, ResourceNode, Speed, Trainable,
};
use crate::ecs::{Entity, Filter, FilterId, System, World};
use crate::error::{GameError, Result};
use crate::math::{Fixed, Vec2Fixed};
use crate::messages::{
    AttackOrder, AvatarMoveOrder, BuildOrder, DropOrder, GatherOrder, InteractKind,
    InteractOrder, MoveOrder, PickupOrder, TrainOrder,
};
use crate::player::PlayerId;

use super::{registered, MatchResources};

/// Drains the command queue into order messages.
#[derive(Debug, Default)]
pub struct CommandIntakeSystem {
    avatars: Option<FilterId>,
}

impl System<MatchResources> for CommandIntakeSystem {
    fn name(&self) -> &'static str {
        "command_intake"
    }

    fn init(&mut self, world: &mut World) {
        self.avatars = Some(world.add_filter(Filter::new().with::<AvatarReach>().with::<Owner>()));
    }

    fn run(&mut self, world: &mut World, res: &mut MatchResources) {
        let avatars = registered(self.avatars, self.name());
        while let Some((player, command)) = res.pending.pop_front() {
            let name = command.name();
            if let Err(reason) = self.apply(world, res, avatars, player, command) {
                debug!(%player, command = name, %reason, "command dropped");
            }
        }
    }
}

impl CommandIntakeSystem {
    fn apply(
        &self,
        world: &mut World,
        res: &MatchResources,
        avatars: FilterId,
        player: PlayerId,
        command: PlayerCommand,
    ) -> Result<()> {
        let index = res.players.index_of(player)?;
        match command {
            PlayerCommand::AvatarMove { dir_x, dir_y } => {
                let avatar = avatar_of(world, avatars, index, player)?;
                let direction = Vec2Fixed::new(
                    Fixed::from_num(dir_x.signum()),
                    Fixed::from_num(dir_y.signum()),
                )
                .normalize();
                world.send(AvatarMoveOrder { avatar, direction });
            }
            PlayerCommand::Move { actors, x, y } => {
                let target = point(x, y)?;
                for actor in actors {
                    match check_actor(world, index, player, actor, "move", is_mobile_unit) {
                        Ok(()) => world.send(MoveOrder { actor, target }),
                        Err(reason) => debug!(%actor, %reason, "move skipped for actor"),
                    }
                }
            }
            PlayerCommand::Attack { actors, target } => {
                check_enemy_target(world, index, target)?;
                for actor in actors {
                    match check_actor(world, index, player, actor, "attack", |w, e| {
                        w.has::<Combat>(e)
                    }) {
                        Ok(()) => world.send(AttackOrder { actor, target }),
                        Err(reason) => debug!(%actor, %reason, "attack skipped for actor"),
                    }
                }
            }
            PlayerCommand::Gather { workers, resource } => {
                if !world.has::<ResourceNode>(resource) {
                    return Err(GameError::EntityNotFound(resource));
                }
                for worker in workers {
                    match check_actor(world, index, player, worker, "gather", |w, e| {
                        w.has::<CanGather>(e) && is_mobile_unit(w, e)
                    }) {
                        Ok(()) => world.send(GatherOrder { worker, resource }),
                        Err(reason) => debug!(%worker, %reason, "gather skipped for worker"),
                    }
                }
            }
            PlayerCommand::Build {
                worker,
                building_type,
                x,
                y,
            } => {
                res.tuning.building(&building_type)?;
                let position = point(x, y)?;
                check_actor(world, index, player, worker, "build", |w, e| {
                    w.has::<CanBuild>(e) && is_mobile_unit(w, e)
                })?;
                let owner = Owner { player, index };
                world.send(BuildOrder {
                    worker,
                    owner,
                    building_type,
                    position,
                });
            }
            PlayerCommand::Train {
                building,
                unit_type,
            } => {
                res.tuning.unit(&unit_type)?;
                check_actor(world, index, player, building, "train", |w, e| {
                    w.has::<Trainable>(e)
                })?;
                world.send(TrainOrder {
                    building,
                    unit_type,
                });
            }
            PlayerCommand::Pickup => {
                let avatar = avatar_of(world, avatars, index, player)?;
                world.send(PickupOrder { avatar });
            }
            PlayerCommand::Drop => {
                let avatar = avatar_of(world, avatars, index, player)?;
                world.send(DropOrder { avatar });
            }
            PlayerCommand::Interact {
                building,
                action,
                unit_type,
            } => {
                let avatar = avatar_of(world, avatars, index, player)?;
                check_actor(world, index, player, building, "be used", |w, e| {
                    w.has::<Trainable>(e)
                })?;
                let kind = match (action, unit_type) {
                    (InteractAction::Train, Some(unit_type)) => {
                        res.tuning.unit(&unit_type)?;
                        InteractKind::Train(unit_type)
                    }
                    (InteractAction::Train, None) => {
                        return Err(GameError::InvalidState(
                            "train interaction without a unit type".to_string(),
                        ))
                    }
                    (InteractAction::CancelTraining, _) => InteractKind::CancelTraining,
                };
                world.send(InteractOrder {
                    avatar,
                    building,
                    kind,
                });
            }
        }
        Ok(())
    }
}

/// Convert a client coordinate pair, rejecting NaN and out-of-range values.
fn point(x: f64, y: f64) -> Result<Vec2Fixed> {
    match (Fixed::checked_from_num(x), Fixed::checked_from_num(y)) {
        (Some(x), Some(y)) => Ok(Vec2Fixed::new(x, y)),
        _ => Err(GameError::InvalidState(format!(
            "coordinates out of range: ({x}, {y})"
        ))),
    }
}

fn is_mobile_unit(world: &World, entity: Entity) -> bool {
    world
        .get::<Identity>(entity)
        .is_some_and(|id| id.kind == EntityKind::Unit)
        && world.has::<Speed>(entity)
        && !world.has::<AutoAttackOnly>(entity)
}

/// The common actor checks: exists, owned by the issuing seat, not carried,
/// and has the capability.
fn check_actor(
    world: &World,
    index: u8,
    player: PlayerId,
    actor: Entity,
    action: &'static str,
    capable: impl Fn(&World, Entity) -> bool,
) -> Result<()> {
    if !world.exists(actor) {
        return Err(GameError::EntityNotFound(actor));
    }
    if world.get::<Owner>(actor).map(|owner| owner.index) != Some(index) {
        return Err(GameError::NotOwner {
            player: player.0,
            entity: actor,
        });
    }
    if world.has::<CarriedBy>(actor) {
        return Err(GameError::Carried(actor));
    }
    if !capable(world, actor) {
        return Err(GameError::MissingCapability {
            entity: actor,
            action,
        });
    }
    Ok(())
}

fn check_enemy_target(world: &World, index: u8, target: Entity) -> Result<()> {
    if !world.exists(target) || !world.has::<Health>(target) {
        return Err(GameError::EntityNotFound(target));
    }
    match world.get::<Owner>(target) {
        Some(owner) if owner.index != index => Ok(()),
        _ => Err(GameError::InvalidState(format!("{target} is not an enemy"))),
    }
}

fn avatar_of(world: &World, avatars: FilterId, index: u8, player: PlayerId) -> Result<Entity> {
    world
        .members(avatars)
        .iter()
        .copied()
        .find(|&avatar| world.get::<Owner>(avatar).map(|o| o.index) == Some(index))
        .ok_or(GameError::UnknownPlayer(player.0))
}
