//! CT number to physical density conversion

pub mod converter;
pub mod table;

pub use converter::DensityConverter;
pub use table::{ControlPoint, ConversionTable, TOLERANCE_FRACTION};
