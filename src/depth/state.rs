//! Per-voxel accumulation buffers for one depth pass

use crate::core::{Result, TraversalError};
use crate::volume::{GridDims, VoxelIndex, try_filled};

/// Running sums, visit counts and resolved flags, one entry per voxel.
///
/// "Resolved" is tracked separately from the sums so a legitimate depth of
/// zero is never mistaken for an unvisited voxel.
#[derive(Clone, Debug)]
pub struct AccumulationState {
    dims: GridDims,
    sums: Vec<f64>,
    counts: Vec<u32>,
    resolved: Vec<bool>,
}

impl AccumulationState {
    /// Fresh state: nothing resolved, all sums and counts zero
    pub fn new(dims: GridDims) -> Result<Self> {
        let len = dims.len();
        Ok(Self {
            dims,
            sums: try_filled("depth sums", len, 0.0)?,
            counts: try_filled("visit counts", len, 0)?,
            resolved: try_filled("resolved flags", len, false)?,
        })
    }

    pub fn is_resolved(&self, linear: usize) -> bool {
        self.resolved[linear]
    }

    pub fn visits(&self, linear: usize) -> u32 {
        self.counts[linear]
    }

    /// Add one ray's depth value to a voxel
    pub fn record(&mut self, linear: usize, depth: f64) {
        self.sums[linear] += depth;
        self.counts[linear] += 1;
        self.resolved[linear] = true;
    }

    /// Flat index of the first voxel in row-major order no ray has reached
    pub fn first_unresolved(&self) -> Option<usize> {
        self.resolved.iter().position(|&r| !r)
    }

    /// Average every voxel's sum over its visit count
    pub fn normalize(self) -> Result<Vec<f32>> {
        if let Some(i) = self.first_unresolved() {
            return Err(TraversalError::Unresolved(self.voxel(i)).into());
        }

        let mut depths = try_filled("depth grid", self.sums.len(), 0.0_f32)?;
        for (i, depth) in depths.iter_mut().enumerate() {
            let count = self.counts[i];
            if count == 0 {
                return Err(TraversalError::ZeroVisits(self.voxel(i)).into());
            }
            *depth = (self.sums[i] / count as f64) as f32;
        }
        Ok(depths)
    }

    fn voxel(&self, linear: usize) -> VoxelIndex {
        // `linear` always comes from a buffer sized to `dims`
        self.dims.unflatten(linear).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Error;

    #[test]
    fn test_record_and_normalize() {
        let dims = GridDims::new(1, 1, 2).unwrap();
        let mut state = AccumulationState::new(dims).unwrap();
        state.record(0, 1.0);
        state.record(0, 3.0);
        state.record(1, 0.0);

        assert_eq!(state.visits(0), 2);
        assert!(state.is_resolved(1));
        assert_eq!(state.normalize().unwrap(), vec![2.0, 0.0]);
    }

    #[test]
    fn test_unresolved_voxel_is_an_error() {
        let dims = GridDims::new(2, 2, 2).unwrap();
        let mut state = AccumulationState::new(dims).unwrap();
        for i in 0..dims.len() {
            if i != 5 {
                state.record(i, 1.0);
            }
        }
        assert_eq!(state.first_unresolved(), Some(5));
        match state.normalize() {
            Err(Error::Traversal(TraversalError::Unresolved(v))) => {
                assert_eq!(v, VoxelIndex::new(1, 0, 1));
            }
            other => panic!("expected unresolved voxel, got {:?}", other),
        }
    }
}
