//! CT → density → depth, as driven by a [`RunConfig`]

use std::time::Instant;

use crate::config::{GeometryConfig, RunConfig};
use crate::conversion::{ConversionTable, DensityConverter};
use crate::core::types::DVec3;
use crate::core::{Error, Result};
use crate::depth::DepthAccumulator;
use crate::io::{read_volume, write_volume};
use crate::volume::{GridGeometry, VoxelGrid};

/// Grids produced by one pipeline run
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineOutput {
    pub density: VoxelGrid<f64>,
    pub depth: VoxelGrid<f32>,
}

/// Convert a CT grid to densities, optionally on the rayon pool
pub fn convert_volume(ct: &VoxelGrid<f64>, table: &ConversionTable, parallel: bool) -> Result<VoxelGrid<f64>> {
    let start = Instant::now();
    let converter = DensityConverter::new(table);
    let density = if parallel {
        converter.convert_par(ct)?
    } else {
        converter.convert(ct)?
    };
    log::info!(
        "Converted {} CT voxels to density in {:.1}ms",
        density.dims().len(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    Ok(density)
}

/// Replace a grid's placement with a configured origin and spacing
pub fn apply_geometry<T: Copy>(grid: VoxelGrid<T>, config: &GeometryConfig) -> Result<VoxelGrid<T>> {
    let geometry = GridGeometry::new(
        grid.dims(),
        DVec3::from_array(config.origin.map(f64::from)),
        DVec3::from_array(config.spacing.map(f64::from)),
    )?;
    grid.with_geometry(geometry)
}

/// Run the in-memory part: geometry override, conversion, f32 narrowing
/// and the depth pass.
pub fn process(config: &RunConfig, ct: VoxelGrid<f64>) -> Result<PipelineOutput> {
    let ct = match &config.geometry {
        Some(geometry) => apply_geometry(ct, geometry)?,
        None => ct,
    };

    let table = config.conversion_table.build()?;
    let density = convert_volume(&ct, &table, config.parallel_conversion)?;

    let narrowed = density.map(|v| v as f32)?;
    let depth = DepthAccumulator::new(&narrowed, config.source())
        .with_extension(config.ray_extension)
        .compute()?;

    Ok(PipelineOutput { density, depth })
}

/// Read the configured CT volume, process it and write whichever outputs
/// the config names.
pub fn run(config: &RunConfig) -> Result<PipelineOutput> {
    let ct_path = config
        .ct
        .as_ref()
        .ok_or_else(|| Error::Config("run config has no `ct` path".to_string()))?;

    let start = Instant::now();
    let ct: VoxelGrid<f64> = read_volume(ct_path)?;
    let output = process(config, ct)?;

    if let Some(path) = &config.density_out {
        write_volume(path, &output.density)?;
    }
    if let Some(path) = &config.depth_out {
        write_volume(path, &output.depth)?;
    }

    log::info!("Pipeline finished in {:.2}s", start.elapsed().as_secs_f64());
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::depth::compute_depth;
    use crate::volume::GridDims;

    fn ct_grid() -> VoxelGrid<f64> {
        let dims = GridDims::new(2, 2, 3).unwrap();
        let values = (0..dims.len()).map(|i| -900.0 + i as f64 * 150.0).collect();
        VoxelGrid::from_vec(GridGeometry::unit(dims), values).unwrap()
    }

    fn override_geometry() -> GeometryConfig {
        GeometryConfig { origin: [1.0, 2.0, 3.0], spacing: [0.5, 1.0, 2.0] }
    }

    #[test]
    fn test_run_applies_geometry_override() {
        let dir = tempfile::tempdir().unwrap();
        let ct_path = dir.path().join("ct.rdv");
        let density_path = dir.path().join("density.rdv");
        let depth_path = dir.path().join("depth.rdv");
        write_volume(&ct_path, &ct_grid()).unwrap();

        let config = RunConfig {
            geometry: Some(override_geometry()),
            source: [-4.0, 2.25, 3.5],
            ct: Some(ct_path),
            density_out: Some(density_path.clone()),
            depth_out: Some(depth_path.clone()),
            ..RunConfig::default()
        };
        let output = run(&config).unwrap();

        let depth: VoxelGrid<f32> = read_volume(&depth_path).unwrap();
        let density: VoxelGrid<f64> = read_volume(&density_path).unwrap();
        assert_eq!(depth, output.depth);
        assert_eq!(density, output.density);
        for geometry in [depth.geometry(), density.geometry()] {
            assert_eq!(geometry.origin, DVec3::new(1.0, 2.0, 3.0));
            assert_eq!(geometry.spacing, DVec3::new(0.5, 1.0, 2.0));
            assert_eq!(geometry.dims, ct_grid().dims());
        }

        // Same result as converting, narrowing and tracing by hand
        let ct = apply_geometry(ct_grid(), &override_geometry()).unwrap();
        let table = config.conversion_table.build().unwrap();
        let expected_density = DensityConverter::new(&table).convert(&ct).unwrap();
        let narrowed = expected_density.map(|v| v as f32).unwrap();
        let expected_depth = compute_depth(&narrowed, config.source()).unwrap();
        assert_eq!(density, expected_density);
        assert_eq!(depth, expected_depth);
    }

    #[test]
    fn test_process_keeps_stored_geometry_without_override() {
        let dims = GridDims::new(1, 1, 2).unwrap();
        let geometry = GridGeometry::new(dims, DVec3::new(-1.0, 0.0, 0.0), DVec3::splat(1.0)).unwrap();
        let ct = VoxelGrid::from_vec(geometry, vec![0.0, 1000.0]).unwrap();
        let config = RunConfig { source: [-5.0, 0.5, 0.5], ..RunConfig::default() };

        let output = process(&config, ct).unwrap();
        assert_eq!(*output.depth.geometry(), geometry);
        assert!((output.depth.data()[0] - 1.0).abs() < 1e-6);
        assert!((output.depth.data()[1] - 2.5).abs() < 1e-6);
    }

    #[test]
    fn test_process_parallel_matches_sequential() {
        let config = RunConfig { source: [-3.0, 0.7, 1.2], ..RunConfig::default() };
        let parallel = RunConfig { parallel_conversion: true, ..config.clone() };
        assert_eq!(process(&config, ct_grid()).unwrap(), process(&parallel, ct_grid()).unwrap());
    }

    #[test]
    fn test_run_requires_ct_path() {
        let result = run(&RunConfig::default());
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_apply_geometry_rejects_bad_spacing() {
        let config = GeometryConfig { origin: [0.0; 3], spacing: [1.0, -1.0, 1.0] };
        assert!(matches!(apply_geometry(ct_grid(), &config), Err(Error::Shape(_))));
    }
}
