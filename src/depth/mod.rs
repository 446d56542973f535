//! Radiological depth of every voxel as seen from a point source

pub mod accumulator;
pub mod state;

pub use accumulator::{DepthAccumulator, RAY_EXTENSION_FACTOR, compute_depth};
pub use state::AccumulationState;
