//! Grid dimensions and bounds-checked voxel indexing

use std::fmt;

use crate::core::{Error, Result};

/// Integer position of a voxel in the grid
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoxelIndex {
    pub frame: usize,
    pub row: usize,
    pub col: usize,
}

impl VoxelIndex {
    pub fn new(frame: usize, row: usize, col: usize) -> Self {
        Self { frame, row, col }
    }

    /// Component along a physical axis (0 = x/col, 1 = y/row, 2 = z/frame)
    pub fn axis(&self, axis: usize) -> usize {
        match axis {
            0 => self.col,
            1 => self.row,
            _ => self.frame,
        }
    }
}

impl fmt::Display for VoxelIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.frame, self.row, self.col)
    }
}

/// Dimensions of a grid: frames × rows × cols, all non-zero
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridDims {
    pub frames: usize,
    pub rows: usize,
    pub cols: usize,
}

impl GridDims {
    /// Create dimensions, rejecting zero extents and overflowing volumes
    pub fn new(frames: usize, rows: usize, cols: usize) -> Result<Self> {
        if frames == 0 || rows == 0 || cols == 0 {
            return Err(Error::Shape(format!(
                "grid dimensions must be > 0, got ({}, {}, {})",
                frames, rows, cols
            )));
        }
        frames
            .checked_mul(rows)
            .and_then(|n| n.checked_mul(cols))
            .ok_or_else(|| Error::Shape(format!(
                "grid dimensions ({}, {}, {}) overflow the address space",
                frames, rows, cols
            )))?;
        Ok(Self { frames, rows, cols })
    }

    /// Dimensions from a `[frames, rows, cols]` shape slice
    pub fn from_shape(shape: &[usize]) -> Result<Self> {
        match *shape {
            [frames, rows, cols] => Self::new(frames, rows, cols),
            _ => Err(Error::Shape(format!(
                "grid must have exactly 3 dimensions, got {} ({:?})",
                shape.len(),
                shape
            ))),
        }
    }

    /// `[frames, rows, cols]`
    pub fn shape(&self) -> [usize; 3] {
        [self.frames, self.rows, self.cols]
    }

    /// Total number of voxels
    pub fn len(&self) -> usize {
        self.frames * self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of voxels along a physical axis (0 = x/cols, 1 = y/rows, 2 = z/frames)
    pub fn axis_len(&self, axis: usize) -> usize {
        match axis {
            0 => self.cols,
            1 => self.rows,
            _ => self.frames,
        }
    }

    pub fn contains(&self, index: VoxelIndex) -> bool {
        index.frame < self.frames && index.row < self.rows && index.col < self.cols
    }

    /// Flat buffer offset of `index`, or `None` when it lies outside the grid
    pub fn linear(&self, index: VoxelIndex) -> Option<usize> {
        self.contains(index).then(|| {
            index.frame * self.cols * self.rows + index.row * self.cols + index.col
        })
    }

    /// Inverse of [`GridDims::linear`]
    pub fn unflatten(&self, linear: usize) -> Option<VoxelIndex> {
        if linear >= self.len() {
            return None;
        }
        let plane = self.cols * self.rows;
        let frame = linear / plane;
        let rest = linear % plane;
        Some(VoxelIndex::new(frame, rest / self.cols, rest % self.cols))
    }

    /// All voxel indices in row-major (frame, row, col) order
    pub fn iter(&self) -> impl Iterator<Item = VoxelIndex> {
        let (frames, rows, cols) = (self.frames, self.rows, self.cols);
        (0..frames).flat_map(move |f| {
            (0..rows).flat_map(move |r| (0..cols).map(move |c| VoxelIndex::new(f, r, c)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_dimension() {
        assert!(matches!(GridDims::new(0, 2, 2), Err(Error::Shape(_))));
        assert!(matches!(GridDims::new(2, 2, 0), Err(Error::Shape(_))));
    }

    #[test]
    fn test_from_shape_requires_rank_three() {
        assert!(GridDims::from_shape(&[2, 3, 4]).is_ok());
        assert!(matches!(GridDims::from_shape(&[2, 3]), Err(Error::Shape(_))));
        assert!(matches!(GridDims::from_shape(&[1, 2, 3, 4]), Err(Error::Shape(_))));
    }

    #[test]
    fn test_linear_formula() {
        let dims = GridDims::new(3, 4, 5).unwrap();
        assert_eq!(dims.linear(VoxelIndex::new(0, 0, 0)), Some(0));
        assert_eq!(dims.linear(VoxelIndex::new(0, 0, 4)), Some(4));
        assert_eq!(dims.linear(VoxelIndex::new(0, 1, 0)), Some(5));
        assert_eq!(dims.linear(VoxelIndex::new(2, 3, 4)), Some(2 * 20 + 3 * 5 + 4));
        assert_eq!(dims.linear(VoxelIndex::new(3, 0, 0)), None);
        assert_eq!(dims.linear(VoxelIndex::new(0, 4, 0)), None);
    }

    #[test]
    fn test_unflatten_inverts_linear() {
        let dims = GridDims::new(3, 4, 5).unwrap();
        for (i, index) in dims.iter().enumerate() {
            assert_eq!(dims.linear(index), Some(i));
            assert_eq!(dims.unflatten(i), Some(index));
        }
        assert_eq!(dims.unflatten(dims.len()), None);
    }

    #[test]
    fn test_axis_mapping() {
        let dims = GridDims::new(2, 3, 4).unwrap();
        assert_eq!(dims.axis_len(0), 4);
        assert_eq!(dims.axis_len(1), 3);
        assert_eq!(dims.axis_len(2), 2);
        let index = VoxelIndex::new(7, 8, 9);
        assert_eq!([index.axis(0), index.axis(1), index.axis(2)], [9, 8, 7]);
    }
}
