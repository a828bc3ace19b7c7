//! Unit stat sheets.

use serde::{Deserialize, Serialize};

use crate::math::{decimal_serde, Fixed};

/// Data-driven unit definition.
///
/// # Example RON
///
/// ```ron
/// UnitData(
///     cost: 50,
///     health: 40,
///     speed: 90.0,
///     radius: 10.0,
///     damage: 5,
///     range: 16.0,
///     attack_speed: 1.0,
///     train_time: 12.0,
///     supply: 1,
///     can_gather: true,
///     can_build: true,
///     carry_capacity: 5,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitData {
    /// Minerals to train.
    pub cost: i32,

    /// Maximum health points.
    pub health: i32,

    /// Movement speed in world units per second.
    #[serde(with = "decimal_serde")]
    pub speed: Fixed,

    /// Collision radius.
    #[serde(with = "decimal_serde")]
    pub radius: Fixed,

    /// Damage per hit.
    pub damage: i32,

    /// Edge-to-edge attack reach.
    #[serde(with = "decimal_serde")]
    pub range: Fixed,

    /// Hits per second.
    #[serde(with = "decimal_serde")]
    pub attack_speed: Fixed,

    /// Seconds to train.
    #[serde(with = "decimal_serde")]
    pub train_time: Fixed,

    /// Supply consumed.
    pub supply: u32,

    /// Vision radius reported to clients.
    #[serde(with = "decimal_serde", default = "default_vision")]
    pub vision: Fixed,

    /// May mine resource nodes.
    #[serde(default)]
    pub can_gather: bool,

    /// May construct buildings.
    #[serde(default)]
    pub can_build: bool,

    /// Minerals carried per trip (gatherers only).
    #[serde(default)]
    pub carry_capacity: i32,
}

/// Default unit vision.
fn default_vision() -> Fixed {
    Fixed::from_num(256)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ron_with_defaults() {
        let ron = r#"
            UnitData(
                cost: 50,
                health: 45,
                speed: 80.0,
                radius: 10.0,
                damage: 6,
                range: 120.0,
                attack_speed: 1.25,
                train_time: 18.0,
                supply: 1,
            )
        "#;
        let unit: UnitData = ron::from_str(ron).unwrap();
        assert_eq!(unit.attack_speed, Fixed::from_num(1.25));
        assert_eq!(unit.vision, Fixed::from_num(256));
        assert!(!unit.can_gather);
        assert_eq!(unit.carry_capacity, 0);
    }
}
