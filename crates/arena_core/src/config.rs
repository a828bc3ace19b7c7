//! Match configuration.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::math::Fixed;

/// Per-match settings that are not unit stats.
///
/// # Example RON
///
/// ```ron
/// MatchConfig(
///     tick_rate: 60,
///     countdown_seconds: 3,
///     map_width: 100,
///     map_height: 60,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Simulation ticks per second.
    pub tick_rate: u32,
    /// Countdown between start and play.
    pub countdown_seconds: u32,
    /// Map width in tiles.
    pub map_width: u32,
    /// Map height in tiles.
    pub map_height: u32,
    /// Tile edge in world units.
    pub tile_size: u32,
    /// Tiles cut diagonally off each map corner.
    pub corner_cut_tiles: u32,
    /// Goal band height in tiles.
    pub goal_height_tiles: u32,
    /// Distance of each goal line from its map edge, in tiles.
    pub goal_inset_tiles: u32,
    /// Minerals each player starts with.
    pub starting_resources: i32,
    /// Workers spawned next to each base.
    pub workers_per_base: u32,
    /// Mineral patches placed per side.
    pub minerals_per_side: u32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            countdown_seconds: 3,
            map_width: 100,
            map_height: 60,
            tile_size: 32,
            corner_cut_tiles: 8,
            goal_height_tiles: 8,
            goal_inset_tiles: 2,
            starting_resources: 200,
            workers_per_base: 4,
            minerals_per_side: 4,
        }
    }
}

impl MatchConfig {
    /// Parse from RON; missing fields take their defaults.
    pub fn from_ron_str(source_name: &str, ron_text: &str) -> Result<Self> {
        let config: Self = ron::from_str(ron_text).map_err(|e| GameError::DataParseError {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the simulation cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.tick_rate == 0 {
            return Err(GameError::InvalidState("tick_rate must be positive".into()));
        }
        if self.map_width < 2 * self.corner_cut_tiles || self.map_height < 2 * self.corner_cut_tiles
        {
            return Err(GameError::InvalidState(
                "map too small for its corner cut".into(),
            ));
        }
        if self.goal_height_tiles > self.map_height {
            return Err(GameError::InvalidState("goal taller than map".into()));
        }
        Ok(())
    }

    /// Seconds per tick.
    #[must_use]
    pub fn dt(&self) -> Fixed {
        Fixed::from_num(1) / Fixed::from_num(self.tick_rate)
    }

    /// Countdown length in ticks.
    #[must_use]
    pub const fn countdown_ticks(&self) -> u64 {
        self.countdown_seconds as u64 * self.tick_rate as u64
    }

    /// Map width in world units.
    #[must_use]
    pub fn world_width(&self) -> Fixed {
        Fixed::from_num(self.map_width * self.tile_size)
    }

    /// Map height in world units.
    #[must_use]
    pub fn world_height(&self) -> Fixed {
        Fixed::from_num(self.map_height * self.tile_size)
    }

    /// Convert a tile count to world units.
    #[must_use]
    pub fn tiles(&self, count: u32) -> Fixed {
        Fixed::from_num(count * self.tile_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = MatchConfig::from_ron_str("match.ron", "(tick_rate: 30)").unwrap();
        assert_eq!(config.tick_rate, 30);
        assert_eq!(config.map_width, 100);
        assert_eq!(config.countdown_ticks(), 90);
    }

    #[test]
    fn test_validate_rejects_zero_tick_rate() {
        let config = MatchConfig {
            tick_rate: 0,
            ..MatchConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_world_dimensions() {
        let config = MatchConfig::default();
        assert_eq!(config.world_width(), Fixed::from_num(3200));
        assert_eq!(config.world_height(), Fixed::from_num(1920));
    }
}
