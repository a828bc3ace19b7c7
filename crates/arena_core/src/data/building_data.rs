//! Building stat sheets.

use serde::{Deserialize, Serialize};

use crate::math::{decimal_serde, Fixed};

/// Data-driven building definition.
///
/// # Example RON
///
/// ```ron
/// BuildingData(
///     cost: 150,
///     health: 1000,
///     build_time: 40.0,
///     radius: 36.0,
///     supply_provided: 0,
///     trains: ["marine", "brute"],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingData {
    /// Minerals to place.
    pub cost: i32,

    /// Maximum health points.
    pub health: i32,

    /// Seconds of builder work required.
    #[serde(with = "decimal_serde")]
    pub build_time: Fixed,

    /// Collision radius.
    #[serde(with = "decimal_serde")]
    pub radius: Fixed,

    /// Supply granted once complete.
    #[serde(default)]
    pub supply_provided: u32,

    /// Unit types this building can train.
    #[serde(default)]
    pub trains: Vec<String>,

    /// Vision radius reported to clients.
    #[serde(with = "decimal_serde", default = "default_vision")]
    pub vision: Fixed,

    /// Accepts worker cargo.
    #[serde(default)]
    pub accepts_deposits: bool,
}

/// Default building vision.
fn default_vision() -> Fixed {
    Fixed::from_num(320)
}

impl BuildingData {
    /// Check if this building trains the given unit type.
    #[must_use]
    pub fn can_train(&self, unit_type: &str) -> bool {
        self.trains.iter().any(|t| t == unit_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_train() {
        let building = BuildingData {
            cost: 150,
            health: 1000,
            build_time: Fixed::from_num(40),
            radius: Fixed::from_num(36),
            supply_provided: 0,
            trains: vec!["marine".to_string()],
            vision: Fixed::from_num(320),
            accepts_deposits: false,
        };
        assert!(building.can_train("marine"));
        assert!(!building.can_train("worker"));
    }
}
