//! Exact voxel traversal of a line segment (Amanatides–Woo)
//!
//! The segment is first clipped to the grid bounds. Starting from the voxel
//! that contains the entry point, the walk repeatedly crosses whichever
//! voxel face comes next along the segment, so every voxel the segment
//! passes through is visited exactly once and in travel order.
//!
//! Face crossings are computed from the absolute face positions of the
//! current voxel rather than by accumulating per-step increments, which
//! keeps long walks free of drift. All `t` values are segment parameters in
//! `[0, 1]`; the physical length of a piece is `Δt * segment length`.

use crate::math::Ray;
use crate::volume::{GridGeometry, VoxelIndex};

/// One voxel crossed by a segment
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RaySample {
    /// Flat buffer offset of the voxel
    pub linear: usize,
    pub voxel: VoxelIndex,
    /// Physical length of the segment inside the voxel (always > 0)
    pub length: f64,
}

/// List every voxel crossed by `ray`, in travel order, with the length of
/// the segment inside each.
///
/// Returns an empty list for a degenerate ray or one that misses the grid.
/// Voxels that the segment only touches along an edge or at a corner are
/// not reported, and neither is anything for a segment lying in an outer
/// face of the grid. A segment lying in an interior face is attributed to
/// the voxels on the high side of that face. The lengths sum to the length of the clipped segment.
pub fn traverse(geometry: &GridGeometry, ray: &Ray) -> Vec<RaySample> {
    let mut samples = Vec::new();
    traverse_into(geometry, ray, &mut samples);
    samples
}

/// Like [`traverse`], but writes into `out` (cleared first) so the inner
/// loop of a depth pass can reuse one buffer for every ray.
pub fn traverse_into(geometry: &GridGeometry, ray: &Ray, out: &mut Vec<RaySample>) {
    out.clear();

    if ray.is_degenerate() {
        return;
    }
    let Some((t_enter, t_exit)) = ray.clip_parameters(&geometry.bounds()) else {
        return;
    };

    let dims = geometry.dims;
    let delta = ray.delta();
    let seg_len = delta.length();
    let entry = ray.at(t_enter);

    let mut cell = [0_i64; 3];
    let mut step = [0_i64; 3];
    let mut t_next = [f64::INFINITY; 3];
    for axis in 0..3 {
        step[axis] = if delta[axis] > 0.0 {
            1
        } else if delta[axis] < 0.0 {
            -1
        } else {
            0
        };
        cell[axis] = entry_cell(geometry, axis, entry[axis], step[axis]);
        t_next[axis] = next_crossing(geometry, ray, axis, cell[axis], step[axis]);
    }

    let max_steps = dims.cols + dims.rows + dims.frames;
    out.reserve(max_steps);

    let mut t = t_enter;
    loop {
        // Lowest axis wins ties
        let mut axis = 0;
        for a in 1..3 {
            if t_next[a] < t_next[axis] {
                axis = a;
            }
        }
        let t_boundary = t_next[axis];
        let t_out = t_boundary.min(t_exit);

        if t_out > t {
            let voxel = VoxelIndex::new(cell[2] as usize, cell[1] as usize, cell[0] as usize);
            if let Some(linear) = dims.linear(voxel) {
                out.push(RaySample { linear, voxel, length: (t_out - t) * seg_len });
            }
        }

        if t_boundary >= t_exit {
            break;
        }
        t = t.max(t_boundary);

        cell[axis] += step[axis];
        if cell[axis] < 0 || cell[axis] >= dims.axis_len(axis) as i64 {
            break;
        }
        t_next[axis] = next_crossing(geometry, ray, axis, cell[axis], step[axis]);
    }
}

/// Voxel slab containing `p` along `axis`. A point lying exactly on a face
/// belongs to the voxel the ray is about to enter.
fn entry_cell(geometry: &GridGeometry, axis: usize, p: f64, step: i64) -> i64 {
    let u = (p - geometry.origin[axis]) / geometry.spacing[axis];
    let mut cell = u.floor();
    if step < 0 && cell == u {
        cell -= 1.0;
    }
    let last = geometry.dims.axis_len(axis) as i64 - 1;
    (cell as i64).clamp(0, last)
}

/// Segment parameter at which the ray leaves slab `cell` along `axis`
fn next_crossing(geometry: &GridGeometry, ray: &Ray, axis: usize, cell: i64, step: i64) -> f64 {
    let face = match step {
        1 => geometry.face(axis, cell + 1),
        -1 => geometry.face(axis, cell),
        _ => return f64::INFINITY,
    };
    (face - ray.origin[axis]) / (ray.target[axis] - ray.origin[axis])
}
