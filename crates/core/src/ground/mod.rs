//! Terrain queries: point sampling, segment raycasts and trajectory probes
//!
//! Every query goes through a [`Ground`] handle bound to one frozen terrain
//! snapshot, one [`GridView`] and one water source. Queries never fail:
//! distances use the [`MISS`] and [`NO_FINITE_CROSSING`] sentinels and bad
//! coordinates are clamped into the map.
//!
//! ```
//! use groundcast_core::{ConstantWaterLevel, GridView, HeightGrid, HeightGridSet, MapDims, Vec3};
//!
//! let dims = MapDims::new(16, 16, 8.0).unwrap();
//! let grids = HeightGridSet::mirrored(HeightGrid::flat(dims, 0.0).unwrap());
//! let sea = ConstantWaterLevel(-5.0);
//! let ground = grids.ground(GridView::Synced, &sea);
//!
//! let dist = ground.intersect(Vec3::new(8.0, 10.0, 8.0), Vec3::new(8.0, -10.0, 8.0));
//! assert!((dist - 10.0).abs() < 1e-4);
//! ```

pub mod batch;
pub mod bounds;
pub mod config;
pub mod raycast;
pub mod sampler;
pub mod trajectory;
pub mod water;

pub use bounds::{clamp_segment_to_height, clamp_segment_to_map, map_boundary_intersection, BoundaryInterval};
pub use config::{QueryConfig, TrajectoryHeightMode};
pub use water::line_plane_distance;

use crate::grid::{GridView, HeightGrid, HeightGridSet, HeightSource, WaterLevel};

/// Distance reported when a query finds no intersection
pub const MISS: f32 = -1.0;

/// Distance reported by [`line_plane_distance`] when the ray runs parallel
/// to or away from the plane
pub const NO_FINITE_CROSSING: f32 = f32::MAX;

/// Query handle over one terrain snapshot.
///
/// Cheap to copy and `Sync`, so one handle can serve many threads for the
/// duration of a tick.
pub struct Ground<'a, S: HeightSource + ?Sized = HeightGrid> {
    source: &'a S,
    water: &'a dyn WaterLevel,
    view: GridView,
    config: QueryConfig,
}

impl<S: HeightSource + ?Sized> Clone for Ground<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: HeightSource + ?Sized> Copy for Ground<'_, S> {}

impl<'a, S: HeightSource + ?Sized> Ground<'a, S> {
    /// Bind a handle to an already resolved buffer set.
    ///
    /// `view` must describe `source`: it decides whether the underground-start
    /// shortcut applies.
    pub fn new(source: &'a S, water: &'a dyn WaterLevel, view: GridView) -> Self {
        Self {
            source,
            water,
            view,
            config: QueryConfig::default(),
        }
    }

    pub fn with_config(mut self, config: QueryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn source(&self) -> &'a S {
        self.source
    }

    pub fn view(&self) -> GridView {
        self.view
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    #[inline]
    fn checks_underground_start(&self) -> bool {
        self.view.is_synced() || self.config.unsynced_underground_check
    }
}

impl HeightGridSet {
    /// Query handle over one view of this set
    pub fn ground<'a>(&'a self, view: GridView, water: &'a dyn WaterLevel) -> Ground<'a, HeightGrid> {
        Ground::new(self.view(view), water, view)
    }
}
