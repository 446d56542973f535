//! Volume serialization and disk I/O

pub mod volume_file;

pub use volume_file::{VolumeScalar, decode_volume, encode_volume, read_volume, write_volume};
