//! Procedural building fields: materials, shape generation, placement and the placement grid.

pub mod building;
pub mod config;
pub mod draw;
pub mod grid;
pub mod material;
pub mod params;
pub mod placement;
pub mod shape;
pub mod terrain;

pub use building::*;
pub use config::*;
pub use draw::*;
pub use grid::*;
pub use material::*;
pub use params::*;
pub use placement::*;
pub use shape::*;
pub use terrain::*;
