//! Voxel grid storage and physical geometry

use crate::core::types::DVec3;
use crate::core::{Error, Result};
use crate::math::Aabb;

use super::index::{GridDims, VoxelIndex};
use super::try_filled;

/// Placement of a grid in physical space
///
/// Voxel `(f, r, c)` occupies the box from
/// `origin + (c, r, f) * spacing` to `origin + (c + 1, r + 1, f + 1) * spacing`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridGeometry {
    pub dims: GridDims,
    /// Physical coordinate of the (0, 0, 0) voxel's minimum corner
    pub origin: DVec3,
    /// Physical voxel size along x, y, z
    pub spacing: DVec3,
}

impl GridGeometry {
    /// Create a geometry; spacing must be finite and strictly positive
    pub fn new(dims: GridDims, origin: DVec3, spacing: DVec3) -> Result<Self> {
        if !origin.is_finite() {
            return Err(Error::Shape(format!("grid origin must be finite, got {:?}", origin)));
        }
        if !spacing.is_finite() || spacing.min_element() <= 0.0 {
            return Err(Error::Shape(format!(
                "grid spacing must be finite and > 0 on every axis, got {:?}",
                spacing
            )));
        }
        Ok(Self { dims, origin, spacing })
    }

    /// Geometry with origin at zero and unit spacing
    pub fn unit(dims: GridDims) -> Self {
        Self { dims, origin: DVec3::ZERO, spacing: DVec3::ONE }
    }

    /// Physical bounding box of the whole grid
    pub fn bounds(&self) -> Aabb {
        let extent = DVec3::new(
            self.dims.cols as f64,
            self.dims.rows as f64,
            self.dims.frames as f64,
        );
        Aabb::new(self.origin, self.origin + extent * self.spacing)
    }

    /// Lower voxel-face coordinates along a physical axis:
    /// `origin[axis] + i * spacing[axis]` for every voxel `i` on that axis
    pub fn axis_coordinates(&self, axis: usize) -> Vec<f64> {
        (0..self.dims.axis_len(axis))
            .map(|i| self.origin[axis] + i as f64 * self.spacing[axis])
            .collect()
    }

    /// Position of the lower face of voxel slab `i` along `axis`
    pub fn face(&self, axis: usize, i: i64) -> f64 {
        self.origin[axis] + i as f64 * self.spacing[axis]
    }
}

/// A regular 3D grid of scalars with its physical placement
#[derive(Clone, Debug, PartialEq)]
pub struct VoxelGrid<T> {
    geometry: GridGeometry,
    data: Vec<T>,
}

impl<T: Copy> VoxelGrid<T> {
    /// Wrap an existing row-major buffer
    pub fn from_vec(geometry: GridGeometry, data: Vec<T>) -> Result<Self> {
        if data.len() != geometry.dims.len() {
            return Err(Error::Shape(format!(
                "buffer holds {} values but dimensions {:?} need {}",
                data.len(),
                geometry.dims.shape(),
                geometry.dims.len()
            )));
        }
        Ok(Self { geometry, data })
    }

    /// Grid with every voxel set to `value`
    pub fn filled(geometry: GridGeometry, value: T) -> Result<Self> {
        let data = try_filled("voxel grid", geometry.dims.len(), value)?;
        Ok(Self { geometry, data })
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn dims(&self) -> GridDims {
        self.geometry.dims
    }

    /// Replace the physical placement, keeping the same dimensions
    pub fn with_geometry(mut self, geometry: GridGeometry) -> Result<Self> {
        if geometry.dims != self.geometry.dims {
            return Err(Error::Shape(format!(
                "geometry dimensions {:?} do not match grid dimensions {:?}",
                geometry.dims.shape(),
                self.geometry.dims.shape()
            )));
        }
        self.geometry = geometry;
        Ok(self)
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    pub fn get(&self, index: VoxelIndex) -> Option<T> {
        self.geometry.dims.linear(index).map(|i| self.data[i])
    }

    pub fn get_linear(&self, linear: usize) -> Option<T> {
        self.data.get(linear).copied()
    }

    pub fn set(&mut self, index: VoxelIndex, value: T) -> Result<()> {
        let i = self.geometry.dims.linear(index).ok_or_else(|| {
            Error::Shape(format!("voxel {:?} outside grid {:?}", index, self.geometry.dims.shape()))
        })?;
        self.data[i] = value;
        Ok(())
    }

    /// Same geometry, element type converted with `f`
    pub fn map<U: Copy>(&self, f: impl Fn(T) -> U) -> Result<VoxelGrid<U>> {
        let mut data = Vec::new();
        data.try_reserve_exact(self.data.len())
            .map_err(|_| Error::Allocation { what: "voxel grid", len: self.data.len() })?;
        data.extend(self.data.iter().map(|&v| f(v)));
        Ok(VoxelGrid { geometry: self.geometry, data })
    }
}
