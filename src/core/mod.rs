//! Core types and utilities

pub mod types;
pub mod error;
pub mod logging;

pub use types::*;
pub use error::{Error, TraversalError};
