//! Regular axis-aligned voxel grids
//!
//! Storage is a flat row-major buffer addressed by
//! `idx = frame * cols * rows + row * cols + col`. Physical axes map onto
//! grid axes as x ↔ cols, y ↔ rows, z ↔ frames.

pub mod grid;
pub mod index;

pub use grid::{GridGeometry, VoxelGrid};
pub use index::{GridDims, VoxelIndex};

use crate::core::{Error, Result};

/// Allocate a buffer of `len` copies of `value`, surfacing allocation
/// failure as [`Error::Allocation`] instead of aborting.
pub(crate) fn try_filled<T: Clone>(what: &'static str, len: usize, value: T) -> Result<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| Error::Allocation { what, len })?;
    buf.resize(len, value);
    Ok(buf)
}
