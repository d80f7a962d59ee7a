use groundcast_core::{line_plane_distance, Ground, GridView, Vec3};
use std::slice;

use crate::error::{DefaultGroundcastError, GroundcastErrorCode};
use crate::helpers::{handle_ffi_result_error, instance_from_ptr, track_error, with_ground_state};
use crate::instance::GroundInstance;

/// C-compatible 3D vector (x east, y up, z south).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FfiVec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<FfiVec3> for Vec3 {
    fn from(v: FfiVec3) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

impl From<Vec3> for FfiVec3 {
    fn from(v: Vec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

/// Segment passed to `groundcast_intersect_batch`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FfiSegment {
    pub from: FfiVec3,
    pub to: FfiVec3,
}

/// Which height grid a query reads from.
///
/// `Synced` must be used for anything that affects gameplay; `Unsynced` is
/// local-only (rendering, UI).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiGridView {
    Synced = 0,
    Unsynced = 1,
}

impl From<FfiGridView> for GridView {
    fn from(view: FfiGridView) -> Self {
        match view {
            FfiGridView::Synced => GridView::Synced,
            FfiGridView::Unsynced => GridView::Unsynced,
        }
    }
}

/// Run `query` against one view under the read lock and write its result to `out`.
///
/// # Safety
/// `ptr` must be null or a live instance, `out` must be null or valid for writes.
unsafe fn query_into<T, F>(
    ptr: *const GroundInstance,
    view: FfiGridView,
    out: *mut T,
    out_name: &str,
    query: F,
) -> GroundcastErrorCode
where
    F: FnOnce(&Ground<'_>) -> T,
{
    if out.is_null() {
        return track_error(&DefaultGroundcastError::null_pointer(out_name));
    }

    handle_ffi_result_error(|| {
        let instance = unsafe { instance_from_ptr(ptr) }?;
        let value = with_ground_state(instance, |state| query(&state.ground(view.into())))?;

        // SAFETY: checked non-null above, validity guaranteed by the caller
        unsafe {
            out.write(value);
        }
        Ok(())
    })
}

/// Interpolated terrain height at `(x, z)`, clamped into the map.
///
/// Returns
/// - `GroundcastErrorCode::Ok` (0) on success with `out_height` set
/// - `GroundcastErrorCode::NullPointer` if `ptr` or `out_height` is null
/// - `GroundcastErrorCode::LockPoisoned` if the internal lock is poisoned
///
/// # Safety
/// - `ptr` must be a valid pointer returned by `groundcast_new` or null.
/// - `out_height` must be valid for writes.
#[no_mangle]
pub unsafe extern "C" fn groundcast_height_at(
    ptr: *const GroundInstance,
    view: FfiGridView,
    x: f32,
    z: f32,
    out_height: *mut f32,
) -> GroundcastErrorCode {
    unsafe { query_into(ptr, view, out_height, "out_height", |ground| ground.height_at(x, z)) }
}

/// Center height of the cell containing `(x, z)`.
///
/// Cheaper than `groundcast_height_at` and only exact on flat cells.
///
/// # Safety
/// Same contract as `groundcast_height_at`.
#[no_mangle]
pub unsafe extern "C" fn groundcast_approx_height_at(
    ptr: *const GroundInstance,
    view: FfiGridView,
    x: f32,
    z: f32,
    out_height: *mut f32,
) -> GroundcastErrorCode {
    unsafe { query_into(ptr, view, out_height, "out_height", |ground| ground.approx_height_at(x, z)) }
}

/// Unit normal of the cell containing `(x, z)`.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by `groundcast_new` or null.
/// - `out_normal` must be valid for writes.
#[no_mangle]
pub unsafe extern "C" fn groundcast_normal_at(
    ptr: *const GroundInstance,
    view: FfiGridView,
    x: f32,
    z: f32,
    out_normal: *mut FfiVec3,
) -> GroundcastErrorCode {
    unsafe { query_into(ptr, view, out_normal, "out_normal", |ground| ground.normal_at(x, z).into()) }
}

/// Normal blended bilinearly from the four nearest cell normals.
///
/// # Safety
/// Same contract as `groundcast_normal_at`.
#[no_mangle]
pub unsafe extern "C" fn groundcast_smooth_normal_at(
    ptr: *const GroundInstance,
    view: FfiGridView,
    x: f32,
    z: f32,
    out_normal: *mut FfiVec3,
) -> GroundcastErrorCode {
    unsafe {
        query_into(ptr, view, out_normal, "out_normal", |ground| {
            ground.smooth_normal_at(x, z).into()
        })
    }
}

/// Slope at `(x, z)` from the half-resolution slope map: 0 is flat, 1 vertical.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by `groundcast_new` or null.
/// - `out_slope` must be valid for writes.
#[no_mangle]
pub unsafe extern "C" fn groundcast_slope_at(
    ptr: *const GroundInstance,
    view: FfiGridView,
    x: f32,
    z: f32,
    out_slope: *mut f32,
) -> GroundcastErrorCode {
    unsafe { query_into(ptr, view, out_slope, "out_slope", |ground| ground.slope_at(x, z)) }
}

/// Terrain height at `(x, z)`, floored at the water plane.
///
/// # Safety
/// Same contract as `groundcast_height_at`.
#[no_mangle]
pub unsafe extern "C" fn groundcast_height_above_water(
    ptr: *const GroundInstance,
    view: FfiGridView,
    x: f32,
    z: f32,
    out_height: *mut f32,
) -> GroundcastErrorCode {
    unsafe {
        query_into(ptr, view, out_height, "out_height", |ground| {
            ground.height_above_water(x, z)
        })
    }
}

/// Distance from `from` to the first terrain hit on the segment `from -> to`.
///
/// `out_distance` receives `-1` on a miss and `0` (plus any distance skipped
/// while clamping the segment into the map) when a synced query starts
/// underground.
///
/// Returns
/// - `GroundcastErrorCode::Ok` (0) on success, including misses
/// - `GroundcastErrorCode::NullPointer` if `ptr` or `out_distance` is null
/// - `GroundcastErrorCode::LockPoisoned` if the internal lock is poisoned
///
/// # Safety
/// - `ptr` must be a valid pointer returned by `groundcast_new` or null.
/// - `out_distance` must be valid for writes.
#[no_mangle]
pub unsafe extern "C" fn groundcast_intersect(
    ptr: *const GroundInstance,
    view: FfiGridView,
    from: FfiVec3,
    to: FfiVec3,
    out_distance: *mut f32,
) -> GroundcastErrorCode {
    unsafe {
        query_into(ptr, view, out_distance, "out_distance", |ground| {
            ground.intersect(from.into(), to.into())
        })
    }
}

/// `groundcast_intersect` over the segment `pos -> pos + dir * len`.
///
/// `dir` is expected to be normalized.
///
/// # Safety
/// Same contract as `groundcast_intersect`.
#[no_mangle]
pub unsafe extern "C" fn groundcast_intersect_ray(
    ptr: *const GroundInstance,
    view: FfiGridView,
    pos: FfiVec3,
    dir: FfiVec3,
    len: f32,
    out_distance: *mut f32,
) -> GroundcastErrorCode {
    unsafe {
        query_into(ptr, view, out_distance, "out_distance", |ground| {
            ground.intersect_ray(pos.into(), dir.into(), len)
        })
    }
}

/// Nearest of the terrain hit and, when `test_water` is set, the water plane
/// crossing along `pos -> pos + dir * len`.
///
/// # Safety
/// Same contract as `groundcast_intersect`.
#[no_mangle]
pub unsafe extern "C" fn groundcast_intersect_with_water(
    ptr: *const GroundInstance,
    view: FfiGridView,
    pos: FfiVec3,
    dir: FfiVec3,
    len: f32,
    test_water: bool,
    out_distance: *mut f32,
) -> GroundcastErrorCode {
    unsafe {
        query_into(ptr, view, out_distance, "out_distance", |ground| {
            ground.intersect_with_water(pos.into(), dir.into(), len, test_water)
        })
    }
}

/// `groundcast_intersect` for `len` segments, answered in parallel.
///
/// `out_distances[i]` receives the result for `segments[i]`. Both pointers may
/// be null when `len` is zero.
///
/// Returns
/// - `GroundcastErrorCode::Ok` (0) on success
/// - `GroundcastErrorCode::NullPointer` if `ptr` is null, or an array pointer is null with `len > 0`
/// - `GroundcastErrorCode::LockPoisoned` if the internal lock is poisoned
///
/// # Safety
/// - `ptr` must be a valid pointer returned by `groundcast_new` or null.
/// - `segments` must be valid for reads and `out_distances` for writes of `len` elements.
/// - The two arrays must not overlap.
#[no_mangle]
pub unsafe extern "C" fn groundcast_intersect_batch(
    ptr: *const GroundInstance,
    view: FfiGridView,
    segments: *const FfiSegment,
    len: usize,
    out_distances: *mut f32,
) -> GroundcastErrorCode {
    if len > 0 && segments.is_null() {
        return track_error(&DefaultGroundcastError::null_pointer("segments"));
    }
    if len > 0 && out_distances.is_null() {
        return track_error(&DefaultGroundcastError::null_pointer("out_distances"));
    }

    handle_ffi_result_error(|| {
        let instance = unsafe { instance_from_ptr(ptr) }?;
        if len == 0 {
            return Ok(());
        }

        // SAFETY: non-null and sized by the caller, checked above
        let segments = unsafe { slice::from_raw_parts(segments, len) };
        let out = unsafe { slice::from_raw_parts_mut(out_distances, len) };

        let segments: Vec<(Vec3, Vec3)> = segments
            .iter()
            .map(|segment| (segment.from.into(), segment.to.into()))
            .collect();
        let distances = with_ground_state(instance, |state| state.ground(view.into()).intersect_many(&segments))?;

        out.copy_from_slice(&distances);
        Ok(())
    })
}

/// Step a projectile from `start` and report the horizontal distance to its
/// first terrain contact, or `-1` if it leaves the map or flies further
/// than `length`.
///
/// The projectile starts with velocity `dir * speed` and gains `acc` per step.
///
/// # Safety
/// Same contract as `groundcast_intersect`.
#[no_mangle]
#[expect(clippy::too_many_arguments)]
pub unsafe extern "C" fn groundcast_simulated_impact_distance(
    ptr: *const GroundInstance,
    view: FfiGridView,
    start: FfiVec3,
    dir: FfiVec3,
    acc: FfiVec3,
    speed: f32,
    length: f32,
    out_distance: *mut f32,
) -> GroundcastErrorCode {
    unsafe {
        query_into(ptr, view, out_distance, "out_distance", |ground| {
            ground.simulated_impact_distance(start.into(), dir.into(), acc.into(), speed, length)
        })
    }
}

/// Sample the analytic trajectory `y(d) = start.y + lin * d + qdr * d^2`
/// every cell along `target_dir` and report the horizontal distance of the
/// first sample at or below the terrain, or `-1`.
///
/// Uses cell center heights unless the query configuration asks for the
/// exact surface.
///
/// # Safety
/// Same contract as `groundcast_intersect`.
#[no_mangle]
#[expect(clippy::too_many_arguments)]
pub unsafe extern "C" fn groundcast_sampled_impact_distance(
    ptr: *const GroundInstance,
    view: FfiGridView,
    start: FfiVec3,
    target_dir: FfiVec3,
    length: f32,
    lin: f32,
    qdr: f32,
    out_distance: *mut f32,
) -> GroundcastErrorCode {
    unsafe {
        query_into(ptr, view, out_distance, "out_distance", |ground| {
            ground.sampled_impact_distance(start.into(), target_dir.into(), length, lin, qdr)
        })
    }
}

/// Distance along `pos -> pos + dir * len` at which the ray passes down
/// through the horizontal plane at `plane_height`.
///
/// Returns `-1` if the ray starts below the plane or ends above it, and
/// `f32::MAX` when it runs parallel to or away from the plane.
/// Pure function, no instance required.
#[no_mangle]
pub extern "C" fn groundcast_line_plane_distance(pos: FfiVec3, dir: FfiVec3, len: f32, plane_height: f32) -> f32 {
    line_plane_distance(pos.into(), dir.into(), len, plane_height)
}
