//! Axis-aligned bounding box

use crate::core::types::DVec3;

/// Axis-aligned bounding box defined by min and max corners
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    /// Create AABB from min and max corners
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Get center point
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Check if point is inside AABB (faces included)
    pub fn contains_point(&self, p: DVec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x &&
        p.y >= self.min.y && p.y <= self.max.y &&
        p.z >= self.min.z && p.z <= self.max.z
    }
}
