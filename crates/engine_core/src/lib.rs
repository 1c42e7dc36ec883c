//! Core geometry types shared by the building generator and collision queries.
//!
//! This crate provides the foundational types used across all engine systems:
//! - Axis-aligned boxes (`Aabb`), the building block of every building part
//! - The single XY rotation primitive used for rotated buildings
//! - RGBA colors and regular-polygon helpers
//!
//! World space is Z-up: placement happens in the XY plane.

pub mod aabb;
pub mod color;
pub mod polygon;
pub mod transform;

pub use aabb::*;
pub use color::*;
pub use polygon::*;
pub use transform::*;

// Re-export commonly used types
pub use glam::{Vec2, Vec3, Vec4};
