use groundcast_core::{
    ConstantWaterLevel, Ground, GridView, HeightGrid, HeightGridSet, MapDims, QueryConfig, TrajectoryHeightMode,
};
use std::ptr;
use std::slice;
use std::sync::RwLock;
use tracing::{debug, info};

use crate::error::{DefaultGroundcastError, GroundcastErrorCode};
use crate::helpers::{
    handle_ffi_result_error, instance_from_ptr, track_error, track_result, with_ground_state, with_ground_state_mut,
};
use crate::queries::FfiGridView;
use crate::terrain::Terrain;

/// Terrain query context shared with the host engine.
///
/// Holds the synced and unsynced height grids, the water plane and the query
/// configuration.
///
/// # Thread Safety
/// The state sits behind an `RwLock`:
/// - **Multiple concurrent readers** (every query function): `.read()` lock
/// - **Exclusive writer** (height refreshes, water and config setters): `.write()` lock
///
/// Queries issued during a refresh see either the old or the new grid, never a
/// mix of both.
///
/// # Usage in Game Engines
///
/// ```cpp
/// GroundInstance* ground = nullptr;
///
/// void AMapActor::BeginPlay() {
///     Terrain terrain = make_flat_terrain(256, 256, 8.0f, 0.0f);
///     if (groundcast_new(terrain, &ground) != GroundcastErrorCode::Ok) {
///         UE_LOG(LogTemp, Error, TEXT("%s"), UTF8_TO_TCHAR(groundcast_get_last_error()));
///         return;
///     }
/// }
///
/// void AMapActor::EndPlay(const EEndPlayReason::Type Reason) {
///     groundcast_destroy(ground);
///     ground = nullptr;
/// }
/// ```
pub struct GroundInstance {
    pub(crate) state: RwLock<GroundState>,
}

pub(crate) struct GroundState {
    pub(crate) grids: HeightGridSet,
    pub(crate) water: ConstantWaterLevel,
    pub(crate) config: QueryConfig,
}

impl GroundState {
    /// Query handle over one view of the current grids
    pub(crate) fn ground(&self, view: GridView) -> Ground<'_> {
        self.grids.ground(view, &self.water).with_config(self.config)
    }
}

fn require_finite(param_name: &str, value: f32) -> Result<f32, DefaultGroundcastError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DefaultGroundcastError::invalid_terrain_parameter(param_name, value))
    }
}

impl GroundInstance {
    /// Creates a new instance with both views built from `terrain`.
    ///
    /// # Errors
    ///
    /// - `InvalidTerrainParameters` if the geometry is invalid or a shape parameter is not finite
    /// - `NullPointer` if a heightmap pointer is null
    /// - `InvalidParameter` if a heightmap sample is not finite
    ///
    /// # Safety
    ///
    /// For `Terrain::FromHeightmap`, `heightmap_ptr` must be null or valid for
    /// reads of `(map_x + 1) * (map_z + 1)` values.
    pub(crate) unsafe fn new(terrain: &Terrain) -> Result<Box<Self>, DefaultGroundcastError> {
        let (map_x, map_z, square_size) = terrain.geometry();
        let dims = MapDims::new(map_x, map_z, square_size)?;

        let grid = match *terrain {
            Terrain::Flat { base_elevation, .. } => {
                HeightGrid::flat(dims, require_finite("base_elevation", base_elevation)?)?
            }

            Terrain::SingleHill {
                base_elevation,
                hill_height,
                hill_radius,
                ..
            } => {
                if !hill_radius.is_finite() || hill_radius <= 0.0 {
                    return Err(DefaultGroundcastError::invalid_terrain_parameter_msg(
                        "hill_radius",
                        &format!("must be finite and positive, got {hill_radius}"),
                    ));
                }
                HeightGrid::single_hill(
                    dims,
                    require_finite("base_elevation", base_elevation)?,
                    require_finite("hill_height", hill_height)?,
                    hill_radius,
                )?
            }

            Terrain::ValleyBetweenHills {
                base_elevation,
                hill_height,
                ..
            } => HeightGrid::valley_between_hills(
                dims,
                require_finite("base_elevation", base_elevation)?,
                require_finite("hill_height", hill_height)?,
            )?,

            Terrain::FromHeightmap {
                heightmap_ptr,
                elevation_scale,
                base_elevation,
                ..
            } => {
                if heightmap_ptr.is_null() {
                    return Err(DefaultGroundcastError::null_pointer("heightmap_ptr"));
                }
                // SAFETY: non-null and sized by the caller for this geometry; copied before returning
                let heightmap = unsafe { slice::from_raw_parts(heightmap_ptr, dims.corner_count()) };
                HeightGrid::from_heightmap(dims, heightmap, elevation_scale, base_elevation)?
            }
        };

        info!(
            map_x,
            map_z,
            square_size,
            max_height = grid.max_height(),
            "created ground instance"
        );

        Ok(Box::new(Self {
            state: RwLock::new(GroundState {
                grids: HeightGridSet::mirrored(grid),
                water: ConstantWaterLevel(0.0),
                config: QueryConfig::default(),
            }),
        }))
    }
}

/// Create a new ground instance and return it via out-parameter.
///
/// Both the synced and unsynced views start out as the grid described by
/// `terrain`. The water plane starts at height 0 and the query configuration
/// at its defaults.
///
/// Parameters
/// - `terrain`: A `Terrain` value describing the grid to build.
///   - For `Terrain::FromHeightmap`, the samples are copied into Rust-owned
///     memory. After this call the caller may deallocate the original heightmap.
/// - `out_instance`: Pointer to receive the created instance. Must be non-null.
///   - On success: set to valid `GroundInstance` pointer
///   - On failure: set to null
///
/// Returns
/// - `GroundcastErrorCode::Ok` (0) on success, `out_instance` contains valid pointer
/// - `GroundcastErrorCode::NullPointer` if the heightmap pointer or `out_instance` is null
/// - `GroundcastErrorCode::InvalidTerrainParameters` for invalid geometry or shape parameters
/// - `GroundcastErrorCode::InvalidParameter` if a heightmap sample is not finite
///
/// # Safety
///
/// - `out_instance` must be a valid, non-null pointer to writable memory.
/// - For `Terrain::FromHeightmap`, `heightmap_ptr` must be valid for reads of
///   `(map_x + 1) * (map_z + 1)` values.
/// - The caller takes ownership of the returned instance and MUST call
///   `groundcast_destroy` exactly once.
#[no_mangle]
pub unsafe extern "C" fn groundcast_new(terrain: Terrain, out_instance: *mut *mut GroundInstance) -> GroundcastErrorCode {
    if out_instance.is_null() {
        return track_error(&DefaultGroundcastError::null_pointer("out_instance"));
    }

    // SAFETY: heightmap contract forwarded from the caller
    match track_result(unsafe { GroundInstance::new(&terrain) }) {
        Ok(instance) => {
            unsafe {
                *out_instance = Box::into_raw(instance);
            }
            GroundcastErrorCode::Ok
        }
        Err(code) => {
            unsafe {
                // Set to null on error (per documentation contract)
                *out_instance = ptr::null_mut();
            }

            code
        }
    }
}

/// Destroys an instance previously created by `groundcast_new`.
///
/// If `ptr` is null, this function is a no-op.
///
/// # Safety
/// - The pointer MUST have been created by `groundcast_new` and not destroyed already.
/// - No other thread may be using the instance during or after this call.
#[no_mangle]
pub unsafe extern "C" fn groundcast_destroy(ptr: *mut GroundInstance) {
    if ptr.is_null() {
        return;
    }

    // SAFETY: The pointer was created by `Box::into_raw` in `groundcast_new`
    // and has not been freed. Dropping the Box frees the grids.
    unsafe {
        drop(Box::from_raw(ptr));
    }
}

/// Replace one view's corner heights.
///
/// `heights_ptr` must hold `(map_x + 1) * (map_z + 1)` samples in row-major
/// order, matching the dimensions the instance was created with. Every buffer
/// derived from the corners (cell centers, normals, slopes, max height) is
/// rebuilt before the new grid becomes visible to queries.
///
/// Returns
/// - `GroundcastErrorCode::Ok` (0) on success
/// - `GroundcastErrorCode::NullPointer` if `ptr` or `heights_ptr` is null
/// - `GroundcastErrorCode::InvalidParameter` if `len` does not match or a sample is not finite
/// - `GroundcastErrorCode::LockPoisoned` if the internal lock is poisoned
///
/// # Safety
/// - `ptr` must be a valid pointer returned by `groundcast_new` or null.
/// - `heights_ptr` must be valid for reads of `len` values.
#[no_mangle]
pub unsafe extern "C" fn groundcast_update_heights(
    ptr: *const GroundInstance,
    view: FfiGridView,
    heights_ptr: *const f32,
    len: usize,
) -> GroundcastErrorCode {
    if heights_ptr.is_null() {
        return track_error(&DefaultGroundcastError::null_pointer("heights_ptr"));
    }

    handle_ffi_result_error(|| {
        let instance = unsafe { instance_from_ptr(ptr) }?;
        let dims = with_ground_state(instance, |state| *state.grids.dims())?;

        // SAFETY: caller guarantees `len` readable samples
        let heights = unsafe { slice::from_raw_parts(heights_ptr, len) };
        let grid = HeightGrid::from_corner_heights(dims, heights.to_vec())?;

        // Derived buffers are built outside the write lock
        with_ground_state_mut(instance, |state| state.grids.replace(view.into(), grid))??;
        debug!(?view, len, "updated corner heights");
        Ok(())
    })
}

/// Set the height of the water plane used by water-aware queries.
///
/// Returns
/// - `GroundcastErrorCode::Ok` (0) on success
/// - `GroundcastErrorCode::NullPointer` if `ptr` is null
/// - `GroundcastErrorCode::InvalidParameter` if `level` is NaN
/// - `GroundcastErrorCode::LockPoisoned` if the internal lock is poisoned
///
/// # Safety
/// `ptr` must be a valid pointer returned by `groundcast_new` or null.
#[no_mangle]
pub unsafe extern "C" fn groundcast_set_water_level(ptr: *const GroundInstance, level: f32) -> GroundcastErrorCode {
    handle_ffi_result_error(|| {
        if level.is_nan() {
            return Err(DefaultGroundcastError::invalid_parameter(
                "Water level cannot be NaN".to_string(),
            ));
        }

        let instance = unsafe { instance_from_ptr(ptr) }?;
        with_ground_state_mut(instance, |state| state.water = ConstantWaterLevel(level))
    })
}

/// C-compatible mirror of `QueryConfig`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FfiQueryConfig {
    /// Treat segments starting underground as an immediate hit in unsynced queries too.
    pub unsynced_underground_check: bool,
    /// Sample the interpolated surface instead of cell centers in sampled trajectories.
    pub exact_trajectory_height: bool,
    /// Maximum steps a trajectory probe may take. Must be positive.
    pub trajectory_step_limit: u32,
}

impl From<QueryConfig> for FfiQueryConfig {
    fn from(config: QueryConfig) -> Self {
        Self {
            unsynced_underground_check: config.unsynced_underground_check,
            exact_trajectory_height: config.trajectory_height == TrajectoryHeightMode::Exact,
            trajectory_step_limit: config.trajectory_step_limit,
        }
    }
}

impl From<FfiQueryConfig> for QueryConfig {
    fn from(config: FfiQueryConfig) -> Self {
        Self {
            unsynced_underground_check: config.unsynced_underground_check,
            trajectory_height: if config.exact_trajectory_height {
                TrajectoryHeightMode::Exact
            } else {
                TrajectoryHeightMode::Approximate
            },
            trajectory_step_limit: config.trajectory_step_limit,
        }
    }
}

/// Replace the query configuration.
///
/// Returns
/// - `GroundcastErrorCode::Ok` (0) on success
/// - `GroundcastErrorCode::NullPointer` if `ptr` is null
/// - `GroundcastErrorCode::InvalidParameter` if `trajectory_step_limit` is zero
/// - `GroundcastErrorCode::LockPoisoned` if the internal lock is poisoned
///
/// # Safety
/// `ptr` must be a valid pointer returned by `groundcast_new` or null.
#[no_mangle]
pub unsafe extern "C" fn groundcast_set_query_config(
    ptr: *const GroundInstance,
    config: FfiQueryConfig,
) -> GroundcastErrorCode {
    handle_ffi_result_error(|| {
        if config.trajectory_step_limit == 0 {
            return Err(DefaultGroundcastError::invalid_parameter(
                "trajectory_step_limit must be positive".to_string(),
            ));
        }

        let instance = unsafe { instance_from_ptr(ptr) }?;
        with_ground_state_mut(instance, |state| state.config = config.into())
    })
}

/// Read back the map geometry.
///
/// Returns
/// - `GroundcastErrorCode::Ok` (0) on success
/// - `GroundcastErrorCode::NullPointer` if any pointer is null
/// - `GroundcastErrorCode::LockPoisoned` if the internal lock is poisoned
///
/// # Safety
/// - `ptr` must be a valid pointer returned by `groundcast_new` or null.
/// - The out-pointers must be valid for writes.
#[no_mangle]
pub unsafe extern "C" fn groundcast_get_dimensions(
    ptr: *const GroundInstance,
    out_map_x: *mut usize,
    out_map_z: *mut usize,
    out_square_size: *mut f32,
) -> GroundcastErrorCode {
    if out_map_x.is_null() || out_map_z.is_null() || out_square_size.is_null() {
        return track_error(&DefaultGroundcastError::null_pointer(
            "out_map_x/out_map_z/out_square_size",
        ));
    }

    handle_ffi_result_error(|| {
        let instance = unsafe { instance_from_ptr(ptr) }?;
        let dims = with_ground_state(instance, |state| *state.grids.dims())?;

        unsafe {
            *out_map_x = dims.map_x();
            *out_map_z = dims.map_z();
            *out_square_size = dims.square_size();
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::groundcast_get_last_error_code;
    use crate::queries::groundcast_height_at;
    use std::ffi::CStr;

    fn flat_terrain(map: usize) -> Terrain {
        Terrain::Flat {
            map_x: map,
            map_z: map,
            square_size: 8.0,
            base_elevation: 0.0,
        }
    }

    fn create(terrain: Terrain) -> Result<*mut GroundInstance, GroundcastErrorCode> {
        let mut instance = ptr::null_mut();
        match unsafe { groundcast_new(terrain, &mut instance) } {
            GroundcastErrorCode::Ok => Ok(instance),
            code => {
                assert!(instance.is_null());
                Err(code)
            }
        }
    }

    fn last_error_message() -> String {
        let msg = crate::error::groundcast_get_last_error();
        assert!(!msg.is_null());
        unsafe { CStr::from_ptr(msg) }.to_string_lossy().into_owned()
    }

    fn height(instance: *const GroundInstance, view: FfiGridView, x: f32, z: f32) -> f32 {
        let mut h = f32::NAN;
        assert_eq!(
            unsafe { groundcast_height_at(instance, view, x, z, &mut h) },
            GroundcastErrorCode::Ok
        );
        h
    }

    #[test]
    fn test_create_query_destroy() {
        let instance = create(flat_terrain(16)).unwrap();

        let (mut map_x, mut map_z, mut square_size) = (0, 0, 0.0);
        let code = unsafe { groundcast_get_dimensions(instance, &mut map_x, &mut map_z, &mut square_size) };
        assert_eq!(code, GroundcastErrorCode::Ok);
        assert_eq!((map_x, map_z, square_size), (16, 16, 8.0));
        assert_eq!(groundcast_get_last_error_code(), GroundcastErrorCode::Ok);

        unsafe { groundcast_destroy(instance) };
        unsafe { groundcast_destroy(ptr::null_mut()) };
    }

    #[test]
    fn test_null_out_instance() {
        let code = unsafe { groundcast_new(flat_terrain(4), ptr::null_mut()) };

        assert_eq!(code, GroundcastErrorCode::NullPointer);
        assert_eq!(groundcast_get_last_error_code(), GroundcastErrorCode::NullPointer);
        assert!(last_error_message().contains("out_instance"));
    }

    #[test]
    fn test_invalid_terrain_is_rejected() {
        let bad_size = Terrain::Flat {
            map_x: 4,
            map_z: 4,
            square_size: -1.0,
            base_elevation: 0.0,
        };
        assert_eq!(create(bad_size), Err(GroundcastErrorCode::InvalidTerrainParameters));

        assert_eq!(create(flat_terrain(0)), Err(GroundcastErrorCode::InvalidTerrainParameters));

        let bad_hill = Terrain::SingleHill {
            map_x: 4,
            map_z: 4,
            square_size: 8.0,
            base_elevation: 0.0,
            hill_height: 10.0,
            hill_radius: 0.0,
        };
        assert_eq!(create(bad_hill), Err(GroundcastErrorCode::InvalidTerrainParameters));
        assert!(last_error_message().contains("hill_radius"));

        let bad_valley = Terrain::ValleyBetweenHills {
            map_x: 4,
            map_z: 4,
            square_size: 8.0,
            base_elevation: f32::INFINITY,
            hill_height: 10.0,
        };
        assert_eq!(create(bad_valley), Err(GroundcastErrorCode::InvalidTerrainParameters));
    }

    #[test]
    fn test_heightmap_terrain() {
        // 2x2 cells, corner (1, 1) raised
        let samples = [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0];
        let terrain = Terrain::FromHeightmap {
            map_x: 2,
            map_z: 2,
            square_size: 8.0,
            heightmap_ptr: samples.as_ptr(),
            elevation_scale: 20.0,
            base_elevation: 5.0,
        };
        let instance = create(terrain).unwrap();

        assert_eq!(height(instance, FfiGridView::Synced, 8.0, 8.0), 25.0);
        assert_eq!(height(instance, FfiGridView::Unsynced, 0.0, 0.0), 5.0);

        unsafe { groundcast_destroy(instance) };

        let null_map = Terrain::FromHeightmap {
            map_x: 2,
            map_z: 2,
            square_size: 8.0,
            heightmap_ptr: ptr::null(),
            elevation_scale: 1.0,
            base_elevation: 0.0,
        };
        assert_eq!(create(null_map), Err(GroundcastErrorCode::NullPointer));

        let nan_samples = [f32::NAN; 9];
        let nan_map = Terrain::FromHeightmap {
            map_x: 2,
            map_z: 2,
            square_size: 8.0,
            heightmap_ptr: nan_samples.as_ptr(),
            elevation_scale: 1.0,
            base_elevation: 0.0,
        };
        assert_eq!(create(nan_map), Err(GroundcastErrorCode::InvalidParameter));
    }

    #[test]
    fn test_update_heights_replaces_one_view() {
        let instance = create(flat_terrain(2)).unwrap();
        let raised = [10.0_f32; 9];

        let code = unsafe { groundcast_update_heights(instance, FfiGridView::Unsynced, raised.as_ptr(), raised.len()) };
        assert_eq!(code, GroundcastErrorCode::Ok);

        assert_eq!(height(instance, FfiGridView::Synced, 4.0, 4.0), 0.0);
        assert_eq!(height(instance, FfiGridView::Unsynced, 4.0, 4.0), 10.0);

        // Wrong sample count leaves the view untouched
        let code = unsafe { groundcast_update_heights(instance, FfiGridView::Synced, raised.as_ptr(), 4) };
        assert_eq!(code, GroundcastErrorCode::InvalidParameter);
        assert!(last_error_message().contains("expected 9"));
        assert_eq!(height(instance, FfiGridView::Synced, 4.0, 4.0), 0.0);

        let code = unsafe { groundcast_update_heights(instance, FfiGridView::Synced, ptr::null(), 9) };
        assert_eq!(code, GroundcastErrorCode::NullPointer);

        unsafe { groundcast_destroy(instance) };
    }

    #[test]
    fn test_setters_validate_input() {
        let instance = create(flat_terrain(4)).unwrap();

        assert_eq!(
            unsafe { groundcast_set_water_level(instance, f32::NAN) },
            GroundcastErrorCode::InvalidParameter
        );
        assert_eq!(
            unsafe { groundcast_set_water_level(instance, 3.0) },
            GroundcastErrorCode::Ok
        );
        assert_eq!(groundcast_get_last_error_code(), GroundcastErrorCode::Ok);

        let mut config = FfiQueryConfig::from(QueryConfig::default());
        assert!(!config.exact_trajectory_height);

        config.trajectory_step_limit = 0;
        assert_eq!(
            unsafe { groundcast_set_query_config(instance, config) },
            GroundcastErrorCode::InvalidParameter
        );

        config.trajectory_step_limit = 128;
        config.exact_trajectory_height = true;
        assert_eq!(
            unsafe { groundcast_set_query_config(instance, config) },
            GroundcastErrorCode::Ok
        );

        let state = unsafe { &*instance }.state.read().unwrap();
        assert_eq!(state.water, ConstantWaterLevel(3.0));
        assert_eq!(state.config.trajectory_height, TrajectoryHeightMode::Exact);
        assert_eq!(state.config.trajectory_step_limit, 128);
        drop(state);

        assert_eq!(
            unsafe { groundcast_set_water_level(ptr::null(), 1.0) },
            GroundcastErrorCode::NullPointer
        );

        unsafe { groundcast_destroy(instance) };
    }
}
