//! Raddepth command line tool
//!
//! Usage:
//!   raddepth convert --ct <IN> --table <TABLE.json> --out <OUT> [--parallel]
//!   raddepth depth --density <IN> --source <X,Y,Z> --out <OUT> [--extension <F>]
//!                  [--origin <X,Y,Z>] [--spacing <X,Y,Z>]
//!   raddepth run --config <RUN.json>
//!
//! Volumes are read and written in the `.rdv` container format
//! (see `raddepth::io::volume_file`). Set RUST_LOG=debug for per-pass details.

use std::path::PathBuf;
use std::process::ExitCode;

use raddepth::config::{RunConfig, TableConfig};
use raddepth::core::logging;
use raddepth::core::types::DVec3;
use raddepth::depth::{DepthAccumulator, RAY_EXTENSION_FACTOR};
use raddepth::io::{read_volume, write_volume};
use raddepth::pipeline;
use raddepth::volume::{GridGeometry, VoxelGrid};
use raddepth::{Error, Result};

fn main() -> ExitCode {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    let result = match args.get(1).map(String::as_str) {
        Some("convert") => cmd_convert(&args),
        Some("depth") => cmd_depth(&args),
        Some("run") => cmd_run(&args),
        _ => {
            print_usage();
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            eprintln!("raddepth: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    eprintln!("usage:");
    eprintln!("  raddepth convert --ct <IN> --table <TABLE.json> --out <OUT> [--parallel]");
    eprintln!("  raddepth depth --density <IN> --source <X,Y,Z> --out <OUT> [--extension <F>]");
    eprintln!("                 [--origin <X,Y,Z>] [--spacing <X,Y,Z>]");
    eprintln!("  raddepth run --config <RUN.json>");
}

fn cmd_convert(args: &[String]) -> Result<()> {
    let ct_path = required_path(args, "--ct")?;
    let table_path = required_path(args, "--table")?;
    let out_path = required_path(args, "--out")?;

    let table = TableConfig::load(&table_path)?.build()?;
    let ct: VoxelGrid<f64> = read_volume(&ct_path)?;
    let density = pipeline::convert_volume(&ct, &table, has_flag(args, "--parallel"))?;
    write_volume(&out_path, &density)
}

fn cmd_depth(args: &[String]) -> Result<()> {
    let density_path = required_path(args, "--density")?;
    let out_path = required_path(args, "--out")?;
    let source = parse_vec3_arg(args, "--source")?
        .ok_or_else(|| Error::Config("missing --source".to_string()))?;
    let extension = parse_f64_arg(args, "--extension")?.unwrap_or(RAY_EXTENSION_FACTOR);

    let mut density: VoxelGrid<f32> = read_volume(&density_path)?;
    let origin = parse_vec3_arg(args, "--origin")?;
    let spacing = parse_vec3_arg(args, "--spacing")?;
    if origin.is_some() || spacing.is_some() {
        let current = *density.geometry();
        let geometry = GridGeometry::new(
            current.dims,
            origin.unwrap_or(current.origin),
            spacing.unwrap_or(current.spacing),
        )?;
        density = density.with_geometry(geometry)?;
    }

    let depth = DepthAccumulator::new(&density, source)
        .with_extension(extension)
        .compute()?;
    write_volume(&out_path, &depth)
}

fn cmd_run(args: &[String]) -> Result<()> {
    let config = RunConfig::load(required_path(args, "--config")?)?;
    pipeline::run(&config)?;
    Ok(())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn required_path(args: &[String], flag: &str) -> Result<PathBuf> {
    parse_str_arg(args, flag)
        .map(PathBuf::from)
        .ok_or_else(|| Error::Config(format!("missing {}", flag)))
}

fn parse_f64_arg(args: &[String], flag: &str) -> Result<Option<f64>> {
    parse_str_arg(args, flag)
        .map(|s| {
            s.parse::<f64>()
                .map_err(|e| Error::Config(format!("{} {:?}: {}", flag, s, e)))
        })
        .transpose()
}

fn parse_vec3_arg(args: &[String], flag: &str) -> Result<Option<DVec3>> {
    let Some(s) = parse_str_arg(args, flag) else {
        return Ok(None);
    };
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::Config(format!("{} {:?}: {}", flag, s, e)))?;
    match parts[..] {
        [x, y, z] => Ok(Some(DVec3::new(x, y, z))),
        _ => Err(Error::Config(format!("{} expects X,Y,Z, got {:?}", flag, s))),
    }
}
