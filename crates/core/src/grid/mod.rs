//! Terrain buffers and the read contracts the query engine consumes

pub mod dims;
pub mod error;
pub mod height_grid;
pub mod source;

// Re-export main types
pub use dims::MapDims;
pub use error::GridError;
pub use height_grid::{HeightGrid, HeightGridSet};
pub use source::{ConstantWaterLevel, Face, GridView, HeightSource, WaterLevel};
