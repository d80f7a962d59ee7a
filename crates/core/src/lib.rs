//! Height-Field Terrain Query Core
//!
//! Answers point and intersection queries against a regular grid of terrain
//! elevation samples, the way a real-time strategy simulation needs them every
//! tick.
//!
//! ## Queries
//!
//! - Interpolated height, cell normals, smoothed normals and slope at `(x, z)`
//! - Exact segment/terrain intersection over two planar triangles per cell
//! - Ballistic impact prediction (stepped and sampled)
//! - Combined terrain and water-plane raycasts
//!
//! Queries run through a [`Ground`] handle bound to one frozen [`HeightSource`]
//! snapshot and never fail: misses are reported as [`MISS`].

// Core types and utilities
pub mod core_types;

// Terrain storage and the read contracts the engine consumes
pub mod grid;

// Query engine
pub mod ground;

// Re-export core types
pub use core_types::Vec3;

// Re-export grid types
pub use grid::{ConstantWaterLevel, Face, GridError, GridView, HeightGrid, HeightGridSet, HeightSource, MapDims, WaterLevel};

// Re-export query types
pub use ground::{line_plane_distance, Ground, QueryConfig, TrajectoryHeightMode, MISS, NO_FINITE_CROSSING};
