//! Error types for density conversion and depth computation

use thiserror::Error;

use crate::volume::VoxelIndex;

/// Main error type for the crate
///
/// Every variant is fatal to the call that produced it: no partial output
/// is returned alongside an error.
#[derive(Debug, Error)]
pub enum Error {
    /// Wrong rank, wrong vector length, or inconsistent grid shape
    #[error("Shape error: {0}")]
    Shape(String),

    /// A temporary or output buffer could not be reserved
    #[error("Allocation error: could not allocate {len} elements for {what}")]
    Allocation { what: &'static str, len: usize },

    /// CT value outside the table range and both tolerance bands
    #[error("CT value {value} out of conversion table range [{low}, {high}]")]
    Range { value: f64, low: f64, high: f64 },

    #[error("Traversal error: {0}")]
    Traversal(#[from] TraversalError),

    /// Malformed conversion table
    #[error("Conversion table error: {0}")]
    Table(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    /// Malformed volume file
    #[error("Format error: {0}")]
    Format(String),
}

/// Failures of the depth accumulation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TraversalError {
    /// No constructed ray ever crossed this voxel
    #[error("raytrace failed to resolve voxel (f,r,c)={0}")]
    Unresolved(VoxelIndex),

    /// A resolved voxel reached normalization without any visit
    #[error("voxel (f,r,c)={0} has no visits at normalization")]
    ZeroVisits(VoxelIndex),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_message_reports_value_and_bounds() {
        let err = Error::Range { value: -1200.0, low: -1000.0, high: 1000.0 };
        let msg = err.to_string();
        assert!(msg.contains("-1200"));
        assert!(msg.contains("[-1000, 1000]"));
    }

    #[test]
    fn test_traversal_message_reports_voxel() {
        let err: Error = TraversalError::Unresolved(VoxelIndex::new(1, 2, 3)).into();
        assert!(err.to_string().contains("(1, 2, 3)"));
    }
}
