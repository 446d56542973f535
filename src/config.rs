//! Run configuration for the `raddepth` binary

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::conversion::ConversionTable;
use crate::core::types::DVec3;
use crate::core::{Error, Result};
use crate::depth::RAY_EXTENSION_FACTOR;

/// Physical placement of the CT grid
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeometryConfig {
    /// Position of voxel (0, 0, 0), (x, y, z)
    pub origin: [f32; 3],
    /// Voxel size along x, y, z
    pub spacing: [f32; 3],
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self { origin: [0.0; 3], spacing: [1.0; 3] }
    }
}

/// Conversion table as two parallel columns
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    pub ct_values: Vec<f64>,
    pub densities: Vec<f64>,
}

impl Default for TableConfig {
    fn default() -> Self {
        // Air, water, dense bone
        Self {
            ct_values: vec![-1000.0, 0.0, 1000.0],
            densities: vec![0.0, 1.0, 1.5],
        }
    }
}

impl TableConfig {
    pub fn build(&self) -> Result<ConversionTable> {
        ConversionTable::from_columns(&self.ct_values, &self.densities)
    }

    /// Load a standalone table file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Everything `raddepth run` needs for CT → density → depth
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Overrides the geometry stored in the input volume when set
    pub geometry: Option<GeometryConfig>,
    /// Ray source, (x, y, z)
    pub source: [f32; 3],
    pub conversion_table: TableConfig,
    /// Factor the source → voxel ray is stretched by
    pub ray_extension: f64,
    /// Convert densities on the rayon pool
    pub parallel_conversion: bool,
    pub ct: Option<PathBuf>,
    pub density_out: Option<PathBuf>,
    pub depth_out: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            geometry: None,
            source: [0.0; 3],
            conversion_table: TableConfig::default(),
            ray_extension: RAY_EXTENSION_FACTOR,
            parallel_conversion: false,
            ct: None,
            density_out: None,
            depth_out: None,
        }
    }
}

impl RunConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: RunConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        log::debug!("Loaded run config from {}", path.display());
        Self::from_json_str(&text)
    }

    /// Check values serde cannot: finiteness, table ordering, extension
    pub fn validate(&self) -> Result<()> {
        if self.source.iter().any(|v| !v.is_finite()) {
            return Err(Error::Config(format!("source must be finite, got {:?}", self.source)));
        }
        if let Some(g) = &self.geometry {
            if g.origin.iter().any(|v| !v.is_finite()) {
                return Err(Error::Config(format!("origin must be finite, got {:?}", g.origin)));
            }
            if g.spacing.iter().any(|v| !v.is_finite() || *v <= 0.0) {
                return Err(Error::Config(format!(
                    "spacing must be finite and > 0, got {:?}",
                    g.spacing
                )));
            }
        }
        if !self.ray_extension.is_finite() || self.ray_extension < 1.0 {
            return Err(Error::Config(format!(
                "ray_extension must be finite and >= 1, got {}",
                self.ray_extension
            )));
        }
        self.conversion_table.build()?;
        Ok(())
    }

    pub fn source(&self) -> DVec3 {
        DVec3::from_array(self.source.map(f64::from))
    }
}
