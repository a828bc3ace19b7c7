//! The full tuning sheet for a match.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::building_data::BuildingData;
use super::unit_data::UnitData;
use crate::error::{GameError, Result};
use crate::math::{decimal_serde, Fixed};

/// Mineral patch stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceData {
    /// Starting minerals.
    pub amount: i32,
    /// Minerals extracted per second of mining.
    pub yield_per_gather: i32,
    /// Collision radius.
    #[serde(with = "decimal_serde")]
    pub radius: Fixed,
}

/// Avatar stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarData {
    /// Movement speed in world units per second.
    #[serde(with = "decimal_serde")]
    pub speed: Fixed,
    /// Collision radius.
    #[serde(with = "decimal_serde")]
    pub radius: Fixed,
    /// Edge distance for picking up units.
    #[serde(with = "decimal_serde")]
    pub pickup_range: Fixed,
    /// Edge distance for using buildings.
    #[serde(with = "decimal_serde")]
    pub interaction_range: Fixed,
    /// Vision radius reported to clients.
    #[serde(with = "decimal_serde")]
    pub vision: Fixed,
}

/// Ball stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallData {
    /// Collision radius.
    #[serde(with = "decimal_serde")]
    pub radius: Fixed,
    /// Velocity multiplier applied every tick.
    #[serde(with = "decimal_serde")]
    pub friction: Fixed,
    /// Speeds below this snap to zero.
    #[serde(with = "decimal_serde")]
    pub min_speed: Fixed,
    /// Hard speed cap after a kick.
    #[serde(with = "decimal_serde")]
    pub max_speed: Fixed,
}

/// Collision, kick and reach constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicsData {
    /// Spatial hash cell edge.
    #[serde(with = "decimal_serde")]
    pub cell_size: Fixed,
    /// Ball mass.
    #[serde(with = "decimal_serde")]
    pub ball_mass: Fixed,
    /// Unit mass.
    #[serde(with = "decimal_serde")]
    pub unit_mass: Fixed,
    /// Avatar mass.
    #[serde(with = "decimal_serde")]
    pub avatar_mass: Fixed,
    /// Kick impulse from an avatar.
    #[serde(with = "decimal_serde")]
    pub avatar_kick: Fixed,
    /// Extra kick multiplier while the avatar is moving.
    #[serde(with = "decimal_serde")]
    pub avatar_moving_boost: Fixed,
    /// Weight of the avatar's move direction in a moving kick.
    #[serde(with = "decimal_serde")]
    pub avatar_kick_blend: Fixed,
    /// Kick impulse from a unit.
    #[serde(with = "decimal_serde")]
    pub unit_kick: Fixed,
    /// Bounce impulse from buildings and resources.
    #[serde(with = "decimal_serde")]
    pub static_kick: Fixed,
    /// Velocity kept when bouncing off the boundary.
    #[serde(with = "decimal_serde")]
    pub restitution: Fixed,
    /// Added to attack range when scanning for targets.
    #[serde(with = "decimal_serde")]
    pub acquisition_bonus: Fixed,
    /// Edge distance for gathering, building and depositing.
    #[serde(with = "decimal_serde")]
    pub work_reach: Fixed,
    /// Distance at which a moving unit counts as arrived.
    #[serde(with = "decimal_serde")]
    pub arrival_threshold: Fixed,
}

/// Read-only stat sheets, loaded once at match start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tuning {
    /// Unit sheets keyed by type.
    pub units: BTreeMap<String, UnitData>,
    /// Building sheets keyed by type.
    pub buildings: BTreeMap<String, BuildingData>,
    /// Mineral patches.
    pub resource: ResourceData,
    /// Avatars.
    pub avatar: AvatarData,
    /// The ball.
    pub ball: BallData,
    /// Physics constants.
    pub physics: PhysicsData,
}

impl Tuning {
    /// Parse a tuning sheet from RON.
    pub fn from_ron_str(source_name: &str, ron_text: &str) -> Result<Self> {
        let tuning: Self = ron::from_str(ron_text).map_err(|e| GameError::DataParseError {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Check cross-references between sheets.
    pub fn validate(&self) -> Result<()> {
        for building in self.buildings.values() {
            if let Some(missing) = building.trains.iter().find(|t| !self.units.contains_key(*t)) {
                return Err(GameError::UnknownUnitType(missing.clone()));
            }
        }
        if !self.buildings.values().any(|b| b.accepts_deposits) {
            return Err(GameError::InvalidState(
                "no building type accepts deposits".to_string(),
            ));
        }
        Ok(())
    }

    /// Look up a unit sheet.
    pub fn unit(&self, unit_type: &str) -> Result<&UnitData> {
        self.units
            .get(unit_type)
            .ok_or_else(|| GameError::UnknownUnitType(unit_type.to_string()))
    }

    /// Look up a building sheet.
    pub fn building(&self, building_type: &str) -> Result<&BuildingData> {
        self.buildings
            .get(building_type)
            .ok_or_else(|| GameError::UnknownBuildingType(building_type.to_string()))
    }
}

impl Default for Tuning {
    fn default() -> Self {
        let mut units = BTreeMap::new();
        units.insert(
            "worker".to_string(),
            UnitData {
                cost: 50,
                health: 40,
                speed: Fixed::from_num(90),
                radius: Fixed::from_num(10),
                damage: 5,
                range: Fixed::from_num(16),
                attack_speed: Fixed::from_num(1),
                train_time: Fixed::from_num(12),
                supply: 1,
                vision: Fixed::from_num(256),
                can_gather: true,
                can_build: true,
                carry_capacity: 5,
            },
        );
        units.insert(
            "marine".to_string(),
            UnitData {
                cost: 50,
                health: 45,
                speed: Fixed::from_num(80),
                radius: Fixed::from_num(10),
                damage: 6,
                range: Fixed::from_num(120),
                attack_speed: Fixed::from_num(1.25),
                train_time: Fixed::from_num(18),
                supply: 1,
                vision: Fixed::from_num(256),
                can_gather: false,
                can_build: false,
                carry_capacity: 0,
            },
        );
        units.insert(
            "brute".to_string(),
            UnitData {
                cost: 100,
                health: 100,
                speed: Fixed::from_num(70),
                radius: Fixed::from_num(14),
                damage: 12,
                range: Fixed::from_num(20),
                attack_speed: Fixed::from_num(0.8),
                train_time: Fixed::from_num(25),
                supply: 2,
                vision: Fixed::from_num(256),
                can_gather: false,
                can_build: false,
                carry_capacity: 0,
            },
        );

        let mut buildings = BTreeMap::new();
        buildings.insert(
            "base".to_string(),
            BuildingData {
                cost: 400,
                health: 1500,
                build_time: Fixed::from_num(60),
                radius: Fixed::from_num(48),
                supply_provided: 10,
                trains: vec!["worker".to_string()],
                vision: Fixed::from_num(320),
                accepts_deposits: true,
            },
        );
        buildings.insert(
            "supplyDepot".to_string(),
            BuildingData {
                cost: 100,
                health: 400,
                build_time: Fixed::from_num(20),
                radius: Fixed::from_num(24),
                supply_provided: 8,
                trains: Vec::new(),
                vision: Fixed::from_num(320),
                accepts_deposits: false,
            },
        );
        buildings.insert(
            "barracks".to_string(),
            BuildingData {
                cost: 150,
                health: 1000,
                build_time: Fixed::from_num(40),
                radius: Fixed::from_num(36),
                supply_provided: 0,
                trains: vec!["marine".to_string(), "brute".to_string()],
                vision: Fixed::from_num(320),
                accepts_deposits: false,
            },
        );

        Self {
            units,
            buildings,
            resource: ResourceData {
                amount: 1500,
                yield_per_gather: 5,
                radius: Fixed::from_num(20),
            },
            avatar: AvatarData {
                speed: Fixed::from_num(220),
                radius: Fixed::from_num(16),
                pickup_range: Fixed::from_num(40),
                interaction_range: Fixed::from_num(90),
                vision: Fixed::from_num(400),
            },
            ball: BallData {
                radius: Fixed::from_num(12),
                friction: Fixed::from_num(0.985),
                min_speed: Fixed::from_num(2),
                max_speed: Fixed::from_num(900),
            },
            physics: PhysicsData {
                cell_size: Fixed::from_num(64),
                ball_mass: Fixed::from_num(1),
                unit_mass: Fixed::from_num(2),
                avatar_mass: Fixed::from_num(4),
                avatar_kick: Fixed::from_num(420),
                avatar_moving_boost: Fixed::from_num(1.3),
                avatar_kick_blend: Fixed::from_num(0.5),
                unit_kick: Fixed::from_num(220),
                static_kick: Fixed::from_num(60),
                restitution: Fixed::from_num(0.8),
                acquisition_bonus: Fixed::from_num(100),
                work_reach: Fixed::from_num(12),
                arrival_threshold: Fixed::from_num(5),
            },
        }
    }
}
