pub mod config;
pub mod elevation;
mod error;
pub mod generation;
mod heightmap;
pub mod marker;
pub mod meshing;
pub mod motion;

pub use elevation::{Elevation, ElevationSource, Terrain};
pub use error::TerrainError;
pub use heightmap::HeightMap;
