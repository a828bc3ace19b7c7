//! Playable area geometry: the octagon boundary and the two goals.
//!
//! The playable area is the map rectangle with its four corners cut along
//! 45° diagonals. Each seat defends a goal: a band centred vertically on its
//! own edge, scored when the ball's centre passes the goal line inside the
//! band. Seat 0 defends the left goal, seat 1 the right.

use serde::{Deserialize, Serialize};

use crate::config::MatchConfig;
use crate::math::{fixed_sqrt, Fixed, Vec2Fixed};

/// A goal band on one side of the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    /// x of the goal line.
    #[serde(with = "crate::math::fixed_serde")]
    pub line_x: Fixed,
    /// Top of the band.
    #[serde(with = "crate::math::fixed_serde")]
    pub top: Fixed,
    /// Bottom of the band.
    #[serde(with = "crate::math::fixed_serde")]
    pub bottom: Fixed,
    /// Seat defending this goal.
    pub defender: u8,
}

impl Goal {
    fn in_band(&self, y: Fixed) -> bool {
        y >= self.top && y <= self.bottom
    }
}

/// Result of pushing a circle back inside the octagon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clamped {
    /// Corrected centre.
    pub position: Vec2Fixed,
    /// Combined inward normal of every violated edge, unit length.
    pub normal: Vec2Fixed,
}

/// Boundary and goal geometry in world units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapGeometry {
    /// Map width.
    #[serde(with = "crate::math::fixed_serde")]
    pub width: Fixed,
    /// Map height.
    #[serde(with = "crate::math::fixed_serde")]
    pub height: Fixed,
    /// Corner cut along each axis.
    #[serde(with = "crate::math::fixed_serde")]
    pub corner_cut: Fixed,
    /// Goal defended by seat 0.
    pub left_goal: Goal,
    /// Goal defended by seat 1.
    pub right_goal: Goal,
}

impl MapGeometry {
    /// Derive geometry from match settings.
    #[must_use]
    pub fn from_config(config: &MatchConfig) -> Self {
        let width = config.world_width();
        let height = config.world_height();
        let half_goal = config.tiles(config.goal_height_tiles) / Fixed::from_num(2);
        let mid = height / Fixed::from_num(2);
        let inset = config.tiles(config.goal_inset_tiles);
        Self {
            width,
            height,
            corner_cut: config.tiles(config.corner_cut_tiles),
            left_goal: Goal {
                line_x: inset,
                top: mid - half_goal,
                bottom: mid + half_goal,
                defender: 0,
            },
            right_goal: Goal {
                line_x: width - inset,
                top: mid - half_goal,
                bottom: mid + half_goal,
                defender: 1,
            },
        }
    }

    /// Map centre.
    #[must_use]
    pub fn centre(&self) -> Vec2Fixed {
        Vec2Fixed::new(self.width / Fixed::from_num(2), self.height / Fixed::from_num(2))
    }

    /// Mirror a point across the vertical centre line.
    #[must_use]
    pub fn mirror(&self, point: Vec2Fixed) -> Vec2Fixed {
        Vec2Fixed::new(self.width - point.x, point.y)
    }

    /// Whether a circle lies fully inside the octagon.
    #[must_use]
    pub fn contains(&self, position: Vec2Fixed, radius: Fixed) -> bool {
        self.clamp(position, radius).is_none()
    }

    /// Push a circle back inside the octagon.
    ///
    /// Returns `None` if nothing had to move.
    #[must_use]
    pub fn clamp(&self, position: Vec2Fixed, radius: Fixed) -> Option<Clamped> {
        let one = Fixed::from_num(1);
        let mut pos = position;
        let mut normal = Vec2Fixed::ZERO;
        let mut touched = false;

        // Axis-aligned edges.
        let axis_edges = [
            (Vec2Fixed::new(one, Fixed::ZERO), radius - pos.x),
            (Vec2Fixed::new(-one, Fixed::ZERO), pos.x - (self.width - radius)),
            (Vec2Fixed::new(Fixed::ZERO, one), radius - pos.y),
            (Vec2Fixed::new(Fixed::ZERO, -one), pos.y - (self.height - radius)),
        ];
        for (inward, depth) in axis_edges {
            if depth > Fixed::ZERO {
                pos += inward.scale(depth);
                normal += inward;
                touched = true;
            }
        }

        // Diagonal corner edges: each is `sx * x + sy * y >= offset`.
        let w = self.width;
        let h = self.height;
        let c = self.corner_cut;
        let diagonals = [
            (one, one, c),
            (-one, one, c - w),
            (one, -one, c - h),
            (-one, -one, c - w - h),
        ];
        let root2 = fixed_sqrt(Fixed::from_num(2));
        for (sx, sy, offset) in diagonals {
            let signed = (sx * pos.x + sy * pos.y - offset) / root2;
            let depth = radius - signed;
            if depth > Fixed::ZERO {
                let inward = Vec2Fixed::new(sx / root2, sy / root2);
                pos += inward.scale(depth);
                normal += inward;
                touched = true;
            }
        }

        touched.then(|| Clamped {
            position: pos,
            normal: normal.normalize(),
        })
    }

    /// Seat that wins if the ball is at `position`, if any.
    ///
    /// The left goal is checked first.
    #[must_use]
    pub fn goal_scored(&self, position: Vec2Fixed) -> Option<(u8, &Goal)> {
        if position.x < self.left_goal.line_x && self.left_goal.in_band(position.y) {
            return Some((1 - self.left_goal.defender, &self.left_goal));
        }
        if position.x > self.right_goal.line_x && self.right_goal.in_band(position.y) {
            return Some((1 - self.right_goal.defender, &self.right_goal));
        }
        None
    }
}

/// Reflect `velocity` off a boundary with inward `normal`, if it points
/// into the boundary. Speed is scaled by `restitution` on a bounce.
#[must_use]
pub fn reflect(velocity: Vec2Fixed, normal: Vec2Fixed, restitution: Fixed) -> Vec2Fixed {
    let into = velocity.dot(normal);
    if into >= Fixed::ZERO {
        return velocity;
    }
    let reflected = velocity - normal.scale(into * Fixed::from_num(2));
    reflected.scale(restitution)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> MapGeometry {
        MapGeometry::from_config(&MatchConfig::default())
    }

    #[test]
    fn test_goal_layout() {
        let map = geometry();
        assert_eq!(map.left_goal.line_x, Fixed::from_num(64));
        assert_eq!(map.right_goal.line_x, Fixed::from_num(3136));
        assert_eq!(map.left_goal.top, Fixed::from_num(832));
        assert_eq!(map.left_goal.bottom, Fixed::from_num(1088));
    }

    #[test]
    fn test_centre_is_inside() {
        let map = geometry();
        assert!(map.contains(map.centre(), Fixed::from_num(12)));
    }

    #[test]
    fn test_clamp_axis_edge() {
        let map = geometry();
        let clamped = map
            .clamp(Vec2Fixed::from_ints(-5, 960), Fixed::from_num(10))
            .unwrap();
        assert_eq!(clamped.position, Vec2Fixed::from_ints(10, 960));
        assert_eq!(clamped.normal, Vec2Fixed::from_ints(1, 0));
    }

    #[test]
    fn test_clamp_cut_corner() {
        let map = geometry();
        // (10, 10) is inside the rectangle but outside the top-left cut.
        let clamped = map
            .clamp(Vec2Fixed::from_ints(10, 10), Fixed::from_num(0))
            .unwrap();
        let sum = clamped.position.x + clamped.position.y;
        assert!((sum - Fixed::from_num(256)).abs() < Fixed::from_num(0.01));
        assert!(clamped.normal.x > Fixed::ZERO && clamped.normal.y > Fixed::ZERO);
    }

    #[test]
    fn test_reflect_only_into_boundary() {
        let normal = Vec2Fixed::from_ints(1, 0);
        let incoming = Vec2Fixed::from_ints(-100, 50);
        let bounced = reflect(incoming, normal, Fixed::from_num(0.8));
        assert!((bounced.x - Fixed::from_num(80)).abs() < Fixed::from_num(0.001));
        assert!((bounced.y - Fixed::from_num(40)).abs() < Fixed::from_num(0.001));

        let outgoing = Vec2Fixed::from_ints(100, 50);
        assert_eq!(reflect(outgoing, normal, Fixed::from_num(0.8)), outgoing);
    }

    #[test]
    fn test_goal_scored_names_opponent() {
        let map = geometry();
        let (winner, goal) = map.goal_scored(Vec2Fixed::from_ints(40, 960)).unwrap();
        assert_eq!(winner, 1);
        assert_eq!(goal.defender, 0);

        let (winner, _) = map.goal_scored(Vec2Fixed::from_ints(3180, 900)).unwrap();
        assert_eq!(winner, 0);

        assert!(map.goal_scored(Vec2Fixed::from_ints(40, 200)).is_none());
        assert!(map.goal_scored(map.centre()).is_none());
    }
}
