//! Raddepth - CT density conversion and radiological depth ray tracing
//!
//! Converts a CT volume of Hounsfield units into a density (or relative
//! stopping power) volume through a piecewise-linear table, then computes
//! for every voxel the density-weighted path length from a point source.

pub mod core;
pub mod math;
pub mod volume;
pub mod conversion;
pub mod raytrace;
pub mod depth;
pub mod api;
pub mod config;
pub mod io;
pub mod pipeline;

pub use api::{NdArray, compute_radiological_depth, convert_density};
pub use crate::core::{Error, Result};
