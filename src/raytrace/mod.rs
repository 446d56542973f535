//! Ray traversal through voxel grids

pub mod traversal;

pub use traversal::{RaySample, traverse, traverse_into};
