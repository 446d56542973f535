//! Applies a conversion table to every voxel of a CT grid

use rayon::prelude::*;

use crate::core::{Error, Result};
use crate::volume::{VoxelGrid, try_filled};

use super::table::ConversionTable;

/// Voxels per rayon work item in [`DensityConverter::convert_par`]
const PAR_CHUNK: usize = 4096;

/// Converts CT grids to density grids of identical shape and geometry
pub struct DensityConverter<'a> {
    table: &'a ConversionTable,
}

impl<'a> DensityConverter<'a> {
    pub fn new(table: &'a ConversionTable) -> Self {
        Self { table }
    }

    /// Convert every voxel in row-major order, stopping at the first
    /// out-of-range value.
    pub fn convert(&self, ct: &VoxelGrid<f64>) -> Result<VoxelGrid<f64>> {
        let mut out = try_filled("density grid", ct.dims().len(), 0.0_f64)?;
        for (i, (dst, &value)) in out.iter_mut().zip(ct.data()).enumerate() {
            *dst = self.convert_voxel(ct, i, value)?;
        }
        self.finish(ct, out)
    }

    /// Same result as [`DensityConverter::convert`], with voxels converted
    /// on the rayon pool. When several voxels are out of range, the error
    /// reported is the one with the lowest flat index.
    pub fn convert_par(&self, ct: &VoxelGrid<f64>) -> Result<VoxelGrid<f64>> {
        let mut out = try_filled("density grid", ct.dims().len(), 0.0_f64)?;

        let first_failure = out
            .par_chunks_mut(PAR_CHUNK)
            .zip(ct.data().par_chunks(PAR_CHUNK))
            .enumerate()
            .filter_map(|(chunk, (dst, src))| {
                for (k, (d, &value)) in dst.iter_mut().zip(src).enumerate() {
                    match self.table.convert(value) {
                        Ok(density) => *d = density,
                        Err(err) => return Some((chunk * PAR_CHUNK + k, err)),
                    }
                }
                None
            })
            .min_by_key(|(i, _)| *i);

        if let Some((i, err)) = first_failure {
            self.report(ct, i, &err);
            return Err(err);
        }
        self.finish(ct, out)
    }

    fn convert_voxel(&self, ct: &VoxelGrid<f64>, i: usize, value: f64) -> Result<f64> {
        self.table.convert(value).inspect_err(|err| self.report(ct, i, err))
    }

    fn report(&self, ct: &VoxelGrid<f64>, i: usize, err: &Error) {
        if let Some(index) = ct.dims().unflatten(i) {
            log::error!(
                "Density conversion failed at voxel (f,r,c)=({},{},{}): {}",
                index.frame, index.row, index.col, err
            );
        }
    }

    fn finish(&self, ct: &VoxelGrid<f64>, out: Vec<f64>) -> Result<VoxelGrid<f64>> {
        log::debug!(
            "Converted {} voxels with a {}-point table",
            out.len(),
            self.table.len()
        );
        VoxelGrid::from_vec(*ct.geometry(), out)
    }
}
