//! Volume container on disk
//!
//! Layout:
//! ```text
//! [8 bytes]  magic "RDVOL\0\x01\0"
//! [4 bytes]  header length, u32 little-endian
//! [n bytes]  JSON header (dtype, dims, origin, spacing, byte order)
//! [rest]     lz4 block with prepended size: row-major scalars
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::types::DVec3;
use crate::core::{Error, Result};
use crate::volume::{GridDims, GridGeometry, VoxelGrid};

const MAGIC: &[u8; 8] = b"RDVOL\x00\x01\x00";

/// Scalar types that can be stored in a volume file
pub trait VolumeScalar: bytemuck::Pod {
    const DTYPE: &'static str;
}

impl VolumeScalar for f32 {
    const DTYPE: &'static str = "f32";
}

impl VolumeScalar for f64 {
    const DTYPE: &'static str = "f64";
}

#[derive(Debug, Serialize, Deserialize)]
struct VolumeHeader {
    dtype: String,
    dims: [usize; 3],
    origin: [f64; 3],
    spacing: [f64; 3],
    little_endian: bool,
}

/// Serialize a grid to bytes
pub fn encode_volume<T: VolumeScalar>(grid: &VoxelGrid<T>) -> Result<Vec<u8>> {
    let geometry = grid.geometry();
    let header = VolumeHeader {
        dtype: T::DTYPE.to_string(),
        dims: geometry.dims.shape(),
        origin: geometry.origin.to_array(),
        spacing: geometry.spacing.to_array(),
        little_endian: cfg!(target_endian = "little"),
    };
    let header = serde_json::to_vec(&header)
        .map_err(|e| Error::Format(format!("cannot encode volume header: {}", e)))?;
    let header_len = u32::try_from(header.len())
        .map_err(|_| Error::Format("volume header too large".to_string()))?;

    let payload = lz4_flex::compress_prepend_size(bytemuck::cast_slice(grid.data()));

    let mut bytes = Vec::with_capacity(MAGIC.len() + 4 + header.len() + payload.len());
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&header_len.to_le_bytes());
    bytes.extend_from_slice(&header);
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Deserialize a grid from bytes
pub fn decode_volume<T: VolumeScalar>(bytes: &[u8]) -> Result<VoxelGrid<T>> {
    let rest = bytes
        .strip_prefix(MAGIC.as_slice())
        .ok_or_else(|| Error::Format("not a volume file (bad magic)".to_string()))?;
    if rest.len() < 4 {
        return Err(Error::Format("truncated volume header".to_string()));
    }
    let (len_bytes, rest) = rest.split_at(4);
    let header_len = u32::from_le_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]) as usize;
    if rest.len() < header_len {
        return Err(Error::Format("truncated volume header".to_string()));
    }
    let (header, payload) = rest.split_at(header_len);
    let header: VolumeHeader = serde_json::from_slice(header)
        .map_err(|e| Error::Format(format!("invalid volume header: {}", e)))?;

    if header.dtype != T::DTYPE {
        return Err(Error::Format(format!(
            "volume holds {} values, expected {}",
            header.dtype,
            T::DTYPE
        )));
    }
    if header.little_endian != cfg!(target_endian = "little") {
        return Err(Error::Format("volume byte order does not match this host".to_string()));
    }

    let [frames, rows, cols] = header.dims;
    let dims = GridDims::new(frames, rows, cols)?;
    let geometry = GridGeometry::new(
        dims,
        DVec3::from_array(header.origin),
        DVec3::from_array(header.spacing),
    )?;

    let raw = lz4_flex::decompress_size_prepended(payload)
        .map_err(|e| Error::Format(format!("corrupt volume payload: {}", e)))?;
    let width = std::mem::size_of::<T>();
    if raw.len() != dims.len() * width {
        return Err(Error::Format(format!(
            "payload holds {} bytes, dimensions {:?} need {}",
            raw.len(),
            dims.shape(),
            dims.len() * width
        )));
    }
    let data: Vec<T> = raw
        .chunks_exact(width)
        .map(bytemuck::pod_read_unaligned)
        .collect();

    VoxelGrid::from_vec(geometry, data)
}

/// Write a grid to `path`
pub fn write_volume<T: VolumeScalar>(path: impl AsRef<Path>, grid: &VoxelGrid<T>) -> Result<()> {
    let path = path.as_ref();
    let bytes = encode_volume(grid)?;
    std::fs::write(path, &bytes)?;
    log::info!(
        "Wrote {:?} {} volume to {} ({} bytes)",
        grid.dims().shape(),
        T::DTYPE,
        path.display(),
        bytes.len()
    );
    Ok(())
}

/// Read a grid from `path`
pub fn read_volume<T: VolumeScalar>(path: impl AsRef<Path>) -> Result<VoxelGrid<T>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let grid = decode_volume(&bytes)?;
    log::info!(
        "Read {:?} {} volume from {}",
        grid.dims().shape(),
        T::DTYPE,
        path.display()
    );
    Ok(grid)
}
