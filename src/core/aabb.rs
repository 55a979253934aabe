//! Axis-Aligned Bounding Boxes
//!
//! Boxes are stored as center + half extents, which is the shape the
//! sweep queries take.

use serde::{Serialize, Deserialize};

use super::vec2::Vec2;

/// Axis-aligned rectangle in world space.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Aabb {
    /// Center point
    pub center: Vec2,
    /// Half width / half height (always non-negative)
    pub half_extents: Vec2,
}

impl Aabb {
    /// Create from center and half extents.
    #[inline]
    pub fn new(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            center,
            half_extents: half_extents.abs(),
        }
    }

    /// Create from the minimum corner and full size.
    #[inline]
    pub fn from_min_size(min: Vec2, size: Vec2) -> Self {
        let half = size.abs().scale(0.5);
        Self {
            center: min + half,
            half_extents: half,
        }
    }

    /// Minimum (bottom-left) corner.
    #[inline]
    pub fn min(&self) -> Vec2 {
        self.center - self.half_extents
    }

    /// Maximum (top-right) corner.
    #[inline]
    pub fn max(&self) -> Vec2 {
        self.center + self.half_extents
    }

    /// Same box moved by `offset`.
    #[inline]
    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            center: self.center + offset,
            half_extents: self.half_extents,
        }
    }

    /// Strict interior overlap. Boxes that only share an edge do not overlap.
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let d = (self.center - other.center).abs();
        let r = self.half_extents + other.half_extents;
        d.x < r.x && d.y < r.y
    }

    /// Penetration depth on each axis (zero when separated on that axis).
    #[inline]
    pub fn penetration(&self, other: &Aabb) -> Vec2 {
        let d = (self.center - other.center).abs();
        let r = self.half_extents + other.half_extents;
        Vec2::new((r.x - d.x).max(0.0), (r.y - d.y).max(0.0))
    }

    /// Minkowski sum: `other`'s half extents added to this box.
    #[inline]
    pub fn expanded(&self, half_extents: Vec2) -> Self {
        Self {
            center: self.center,
            half_extents: self.half_extents + half_extents.abs(),
        }
    }
}
