//! Client-facing views of a match.
//!
//! A [`WorldSnapshot`] is a flat, self-contained picture of the world at a
//! tick boundary: every actor with its type-specific fields, both players'
//! economy, and the match phase. It is the only thing the network layer
//! serializes. Fixed-point values are converted to `f64` here and nowhere
//! else.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::components::{
    AttackTarget, BuildTarget, Cargo, CarriedBy, CarriedUnit, Combat, Construction, EntityKind,
    GatherTarget, Health, Identity, MoveTarget, Owner, Position, Radius, ResourceNode, Speed,
    Sprite, TrainingQueue, UnitState, Velocity, VisionRadius,
};
use crate::ecs::{Entity, World};
use crate::error::{GameError, Result};
use crate::math::{Fixed, Vec2Fixed};
use crate::messages::{AttackEvent, DeathEvent, GameOver};
use crate::player::PlayerState;
use crate::simulation::MatchPhase;
use crate::systems::MatchResources;

/// One player's public economy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    /// Player id.
    pub id: u64,
    /// Seat index.
    pub index: u8,
    /// Minerals banked.
    pub resources: i32,
    /// Supply in use or reserved.
    pub supply_used: u32,
    /// Supply available.
    pub supply_cap: u32,
}

impl From<&PlayerState> for PlayerView {
    fn from(player: &PlayerState) -> Self {
        Self {
            id: player.id.0,
            index: player.index,
            resources: player.resources,
            supply_used: player.supply_used,
            supply_cap: player.supply_cap,
        }
    }
}

/// One queued unit as shown to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingView {
    /// Unit type key.
    pub unit_type: String,
    /// Seconds elapsed.
    pub progress: f64,
    /// Seconds required.
    pub duration: f64,
}

/// Everything a client needs to draw one entity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorView {
    /// Entity id.
    pub id: u64,
    /// Centre x in world units.
    pub x: f64,
    /// Centre y in world units.
    pub y: f64,
    /// Sprite key.
    pub sprite: String,
    /// Entity kind (`unit`, `building`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Type key within the kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    /// Owning player id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<u64>,
    /// Current hit points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<i32>,
    /// Maximum hit points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_health: Option<i32>,
    /// Behaviour state name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Collision radius.
    pub radius: f64,
    /// Vision radius.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vision_radius: Option<f64>,

    // Units.
    /// Damage per hit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attack: Option<i32>,
    /// Movement speed per second.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    /// Where the unit is heading, x.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_x: Option<f64>,
    /// Where the unit is heading, y.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_y: Option<f64>,
    /// Minerals carried.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carry_amount: Option<i32>,
    /// Held by an avatar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_carried: Option<bool>,

    // Avatars.
    /// Unit held by this avatar.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carried_unit_id: Option<u64>,

    // Buildings.
    /// Seconds of construction done.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub construction_progress: Option<f64>,
    /// Seconds of construction required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_construction_time: Option<f64>,
    /// Queued units, head first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_queue: Option<Vec<TrainingView>>,

    // Resources.
    /// Minerals left.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<i32>,

    // Ball.
    /// Ball velocity x.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity_x: Option<f64>,
    /// Ball velocity y.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity_y: Option<f64>,
}

/// The whole match at a tick boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldSnapshot {
    /// Ticks simulated so far.
    pub tick: u64,
    /// Match phase.
    pub phase: MatchPhase,
    /// Map width in tiles.
    pub width: u32,
    /// Map height in tiles.
    pub height: u32,
    /// Both seats.
    pub players: Vec<PlayerView>,
    /// Every visible entity, in id order.
    pub actors: Vec<ActorView>,
}

fn f(value: Fixed) -> f64 {
    value.to_num()
}

fn position_of(world: &World, entity: Entity) -> Option<Vec2Fixed> {
    world.get::<Position>(entity).map(|p| p.0)
}

/// Where a unit is heading: its move target, else whatever it works on.
fn unit_target(world: &World, unit: Entity) -> Option<Vec2Fixed> {
    if let Some(target) = world.get::<MoveTarget>(unit) {
        return Some(target.0);
    }
    world
        .relation::<AttackTarget>(unit)
        .or_else(|| world.relation::<GatherTarget>(unit))
        .or_else(|| world.relation::<BuildTarget>(unit))
        .and_then(|target| position_of(world, target))
}

fn building_state(world: &World, building: Entity) -> &'static str {
    if world.has::<Construction>(building) {
        "constructing"
    } else if world
        .get::<TrainingQueue>(building)
        .is_some_and(|queue| !queue.is_empty())
    {
        "training"
    } else {
        "idle"
    }
}

impl ActorView {
    /// Build the view of one entity; `None` for entities clients never see.
    #[must_use]
    pub fn capture(world: &World, entity: Entity) -> Option<Self> {
        let identity = world.get::<Identity>(entity)?;
        let at = position_of(world, entity)?;
        let health = world.get::<Health>(entity);
        let mut view = Self {
            id: entity.raw(),
            x: f(at.x),
            y: f(at.y),
            sprite: world
                .get::<Sprite>(entity)
                .map_or_else(String::new, |s| s.0.clone()),
            kind: identity.kind.as_str().to_string(),
            subtype: identity.subtype.clone(),
            owner_id: world.get::<Owner>(entity).map(|o| o.player.0),
            health: health.map(|h| h.current),
            max_health: health.map(|h| h.max),
            radius: world.get::<Radius>(entity).map_or(0.0, |r| f(r.0)),
            vision_radius: world.get::<VisionRadius>(entity).map(|v| f(v.0)),
            ..Self::default()
        };

        match identity.kind {
            EntityKind::Unit => {
                view.state = world.get::<UnitState>(entity).map(|s| s.as_str().to_string());
                view.attack = world.get::<Combat>(entity).map(|c| c.damage);
                view.speed = world.get::<Speed>(entity).map(|s| f(s.0));
                if let Some(target) = unit_target(world, entity) {
                    view.target_x = Some(f(target.x));
                    view.target_y = Some(f(target.y));
                }
                view.carry_amount = world.get::<Cargo>(entity).map(|c| c.amount);
                view.is_carried = Some(world.has::<CarriedBy>(entity));
            }
            EntityKind::Avatar => {
                view.state = Some("idle".to_string());
                view.speed = world.get::<Speed>(entity).map(|s| f(s.0));
                view.carried_unit_id = world.relation::<CarriedUnit>(entity).map(Entity::raw);
            }
            EntityKind::Building => {
                view.state = Some(building_state(world, entity).to_string());
                if let Some(construction) = world.get::<Construction>(entity) {
                    view.construction_progress = Some(f(construction.progress));
                    view.max_construction_time = Some(f(construction.duration));
                }
                view.training_queue = world.get::<TrainingQueue>(entity).map(|queue| {
                    queue
                        .items
                        .iter()
                        .map(|item| TrainingView {
                            unit_type: item.unit_type.clone(),
                            progress: f(item.progress),
                            duration: f(item.duration),
                        })
                        .collect()
                });
            }
            EntityKind::Resource => {
                view.amount = world.get::<ResourceNode>(entity).map(|n| n.amount);
            }
            EntityKind::Ball => {
                if let Some(velocity) = world.get::<Velocity>(entity) {
                    view.velocity_x = Some(f(velocity.0.x));
                    view.velocity_y = Some(f(velocity.0.y));
                }
            }
        }
        Some(view)
    }
}

impl WorldSnapshot {
    /// Capture the world as it stands.
    #[must_use]
    pub fn capture(world: &World, res: &MatchResources, phase: &MatchPhase) -> Self {
        Self {
            tick: res.tick,
            phase: phase.clone(),
            width: res.config.map_width,
            height: res.config.map_height,
            players: res.players.iter().map(PlayerView::from).collect(),
            actors: world
                .entities()
                .filter_map(|entity| ActorView::capture(world, entity))
                .collect(),
        }
    }

    /// Look up an actor by id.
    #[must_use]
    pub fn actor(&self, id: Entity) -> Option<&ActorView> {
        self.actors.iter().find(|actor| actor.id == id.raw())
    }

    /// Serialize to JSON for the wire.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize snapshot: {e}")))
    }

    /// Parse a snapshot back from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| GameError::DataParseError {
            source_name: "snapshot".to_string(),
            message: e.to_string(),
        })
    }

    /// Canonical binary encoding.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to encode snapshot: {e}")))
    }

    /// Hash of the canonical encoding; equal states hash equal.
    pub fn state_hash(&self) -> Result<u64> {
        let bytes = self.to_bytes()?;
        let mut hasher = DefaultHasher::new();
        bytes.hash(&mut hasher);
        Ok(hasher.finish())
    }
}

/// Events pushed to clients as they happen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum MatchEvent {
    /// A hit landed.
    Attack {
        /// Attacker id.
        attacker_id: u64,
        /// Victim id.
        target_id: u64,
        /// Damage dealt.
        damage: i32,
    },
    /// An entity died.
    Death {
        /// Dead entity id.
        actor_id: u64,
    },
    /// The match ended.
    GameOver {
        /// Winning seat.
        winner_index: u8,
        /// Why.
        reason: String,
    },
}

impl From<&AttackEvent> for MatchEvent {
    fn from(event: &AttackEvent) -> Self {
        Self::Attack {
            attacker_id: event.attacker.raw(),
            target_id: event.target.raw(),
            damage: event.damage,
        }
    }
}

impl From<&DeathEvent> for MatchEvent {
    fn from(event: &DeathEvent) -> Self {
        Self::Death {
            actor_id: event.entity.raw(),
        }
    }
}

impl From<&GameOver> for MatchEvent {
    fn from(event: &GameOver) -> Self {
        Self::GameOver {
            winner_index: event.winner_index,
            reason: event.reason.clone(),
        }
    }
}
