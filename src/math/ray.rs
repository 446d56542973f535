//! Ray type and operations
//!
//! A [`Ray`] is a finite segment between two physical points. Positions
//! along it are expressed by a parameter `t` in `[0, 1]`, with `t = 0` at
//! the origin and `t = 1` at the target.

use crate::core::types::DVec3;
use super::aabb::Aabb;

/// A ray segment defined by origin and target points
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: DVec3,
    pub target: DVec3,
}

impl Ray {
    /// Create a new ray segment from `origin` to `target`
    pub fn new(origin: DVec3, target: DVec3) -> Self {
        Self { origin, target }
    }

    /// Unnormalized direction, `target - origin`
    pub fn delta(&self) -> DVec3 {
        self.target - self.origin
    }

    /// Physical length of the segment
    pub fn length(&self) -> f64 {
        self.delta().length()
    }

    /// True when origin and target coincide
    pub fn is_degenerate(&self) -> bool {
        self.origin == self.target
    }

    /// Get point along segment at parameter t
    pub fn at(&self, t: f64) -> DVec3 {
        self.origin + self.delta() * t
    }

    /// Same origin, target pushed out to `origin + factor * (target - origin)`
    pub fn extended(&self, factor: f64) -> Ray {
        Ray::new(self.origin, self.origin + self.delta() * factor)
    }

    /// Clip the segment against an AABB using the slab method.
    ///
    /// Returns `Some((t_enter, t_exit))` with `0 <= t_enter < t_exit <= 1`
    /// when a non-empty piece of the segment lies inside the box. Touching
    /// the box in a single point yields `None`. Axes with a zero direction
    /// component never constrain `t`; they reject the segment when it runs
    /// outside that slab or exactly in one of its faces, so a segment lying
    /// in any outer face of the box only touches it and yields `None`.
    pub fn clip_parameters(&self, aabb: &Aabb) -> Option<(f64, f64)> {
        let delta = self.delta();
        let mut t_enter = 0.0_f64;
        let mut t_exit = 1.0_f64;

        for axis in 0..3 {
            let o = self.origin[axis];
            let d = delta[axis];
            let (lo, hi) = (aabb.min[axis], aabb.max[axis]);

            if d == 0.0 {
                if o <= lo || o >= hi {
                    return None;
                }
                continue;
            }

            let mut t0 = (lo - o) / d;
            let mut t1 = (hi - o) / d;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }

            t_enter = t_enter.max(t0);
            t_exit = t_exit.min(t1);
            if t_enter >= t_exit {
                return None;
            }
        }

        Some((t_enter, t_exit))
    }
}
