//! Collision queries against generated building fields.

pub mod collision;
pub mod collision_world;
pub mod intersect;
pub mod raycast;

#[cfg(test)]
mod test_util;

pub use collision::*;
pub use collision_world::*;
pub use intersect::*;
pub use raycast::*;
