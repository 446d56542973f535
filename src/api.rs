//! Array-level entry points
//!
//! These mirror what a host-language binding hands over: an n-dimensional
//! buffer with an arbitrary shape and plain geometry vectors. Ranks and
//! vector lengths are validated here before any grid is built.

use crate::conversion::{ConversionTable, DensityConverter};
use crate::core::types::DVec3;
use crate::core::{Error, Result};
use crate::depth::DepthAccumulator;
use crate::volume::{GridDims, GridGeometry, VoxelGrid};

/// Owned row-major n-dimensional array
#[derive(Clone, Debug, PartialEq)]
pub struct NdArray<T> {
    shape: Vec<usize>,
    data: Vec<T>,
}

impl<T: Copy> NdArray<T> {
    /// Wrap a buffer; its length must equal the product of `shape`
    pub fn new(shape: Vec<usize>, data: Vec<T>) -> Result<Self> {
        let expected = shape
            .iter()
            .try_fold(1usize, |acc, &n| acc.checked_mul(n))
            .ok_or_else(|| Error::Shape(format!("shape {:?} overflows", shape)))?;
        if expected != data.len() {
            return Err(Error::Shape(format!(
                "array of shape {:?} needs {} values, got {}",
                shape,
                expected,
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    /// Interpret as a 3D grid with the given placement
    fn to_grid(&self, origin: DVec3, spacing: DVec3) -> Result<VoxelGrid<T>> {
        let dims = GridDims::from_shape(&self.shape)?;
        VoxelGrid::from_vec(GridGeometry::new(dims, origin, spacing)?, self.data.clone())
    }

    fn from_grid(grid: VoxelGrid<T>) -> Self {
        Self { shape: grid.dims().shape().to_vec(), data: grid.into_data() }
    }
}

/// Read a 3-component geometry vector
fn vec3(name: &str, v: &[f32]) -> Result<DVec3> {
    match *v {
        [x, y, z] => Ok(DVec3::new(x as f64, y as f64, z as f64)),
        _ => Err(Error::Shape(format!(
            "{} vector must have 3 elements ({} given)",
            name,
            v.len()
        ))),
    }
}

/// Convert a 3D CT array to densities with a 2×N conversion table
/// (row 0 CT values ascending, row 1 densities).
pub fn convert_density(ct: &NdArray<f64>, table: &NdArray<f64>) -> Result<NdArray<f64>> {
    let table = ConversionTable::from_rows(table.shape(), table.data())?;
    let grid = ct.to_grid(DVec3::ZERO, DVec3::ONE)?;
    let density = DensityConverter::new(&table).convert(&grid)?;
    Ok(NdArray::from_grid(density))
}

/// Radiological depth of a 3D density array.
///
/// `start` is the physical position of voxel (0, 0, 0), `inc` the voxel
/// spacing and `source` the ray source, all as (x, y, z).
pub fn compute_radiological_depth(
    density: &NdArray<f32>,
    start: &[f32],
    inc: &[f32],
    source: &[f32],
) -> Result<NdArray<f32>> {
    if density.ndim() != 3 {
        return Err(Error::Shape(format!(
            "density grid must have 3 dimensions, got {}",
            density.ndim()
        )));
    }
    let origin = vec3("start", start)?;
    let spacing = vec3("increment", inc)?;
    let source = vec3("source", source)?;

    let grid = density.to_grid(origin, spacing)?;
    let depth = DepthAccumulator::new(&grid, source).compute()?;
    Ok(NdArray::from_grid(depth))
}
