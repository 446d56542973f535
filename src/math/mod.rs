//! Geometric primitives for grid ray tracing

pub mod aabb;
pub mod ray;

pub use aabb::Aabb;
pub use ray::Ray;
