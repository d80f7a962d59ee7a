//! C ABI over the groundcast terrain query engine.
//!
//! A host engine creates one [`GroundInstance`] per map with `groundcast_new`,
//! refreshes its height grids as the terrain deforms and issues point,
//! raycast and trajectory queries from any thread. Every fallible function
//! returns a [`GroundcastErrorCode`]; the message of the last failure on the
//! calling thread is available from `groundcast_get_last_error`.

mod error;
mod helpers;
mod instance;
mod queries;
mod terrain;

pub use error::{groundcast_get_last_error, groundcast_get_last_error_code, GroundcastErrorCode};
pub use instance::{
    groundcast_destroy, groundcast_get_dimensions, groundcast_new, groundcast_set_query_config,
    groundcast_set_water_level, groundcast_update_heights, FfiQueryConfig, GroundInstance,
};
pub use queries::{
    groundcast_approx_height_at, groundcast_height_above_water, groundcast_height_at, groundcast_intersect,
    groundcast_intersect_batch, groundcast_intersect_ray, groundcast_intersect_with_water,
    groundcast_line_plane_distance, groundcast_normal_at, groundcast_sampled_impact_distance,
    groundcast_simulated_impact_distance, groundcast_slope_at, groundcast_smooth_normal_at, FfiGridView, FfiSegment,
    FfiVec3,
};
pub use terrain::Terrain;
