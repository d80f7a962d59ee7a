//! Exact segment/terrain intersection
//!
//! The segment is clipped to the map volume, then the cells under its
//! horizontal projection are walked in order of travel. Each cell is tested
//! against the planes of its two triangles; the first accepted crossing wins.

use super::bounds::{clamp_segment_to_height, clamp_segment_to_map};
use super::{Ground, MISS};
use crate::core_types::{is_finite, Vec3};
use crate::grid::{Face, HeightSource};
use tracing::warn;

/// Triangle footprint margin, as a fraction of the cell size
const FOOTPRINT_SLACK: f32 = 1e-5;

/// Point where `from -> to` crosses a face plane going downwards.
///
/// Returns `None` if `to` lies above the plane, the segment runs parallel to
/// it, or the crossing falls outside the segment.
#[inline]
fn plane_crossing(from: &Vec3, to: &Vec3, vertex: &Vec3, normal: &Vec3) -> Option<Vec3> {
    let to_dist = (to - vertex).dot(normal);
    if to_dist > 0.0 {
        return None;
    }

    let from_dist = (from - vertex).dot(normal);
    if from_dist == to_dist {
        return None;
    }

    let alpha = from_dist / (from_dist - to_dist);
    if !(0.0..=1.0).contains(&alpha) {
        return None;
    }

    // Components the segment doesn't move along stay exact
    Some(from + (to - from) * alpha)
}

impl<S: HeightSource + ?Sized> Ground<'_, S> {
    /// Distance from `from` to the first terrain hit on the segment `from -> to`.
    ///
    /// Returns [`MISS`] when the segment never touches the terrain or either
    /// endpoint has a NaN or infinite component. A
    /// segment starting underground reports the distance to where it enters
    /// the map volume (0 for a start inside the map); this shortcut always
    /// applies to synced views and to unsynced ones only when
    /// [`QueryConfig::unsynced_underground_check`](super::QueryConfig::unsynced_underground_check)
    /// is set.
    pub fn intersect(&self, from: Vec3, to: Vec3) -> f32 {
        self.intersect_distance(from, to).unwrap_or(MISS)
    }

    /// [`intersect`](Self::intersect) for the ray `pos + dir * t`, `t` in `[0, len]`.
    ///
    /// Distances are in units of `dir`; pass a unit vector for world units.
    pub fn intersect_ray(&self, pos: Vec3, dir: Vec3, len: f32) -> f32 {
        self.intersect(pos, pos + dir * len.max(0.0))
    }

    fn intersect_distance(&self, origin: Vec3, to: Vec3) -> Option<f32> {
        if !is_finite(&origin) || !is_finite(&to) {
            return None;
        }

        // Nothing above the highest corner can be hit
        let from = clamp_segment_to_height(origin, to, self.source.current_max_height())?;
        let (from, to) = clamp_segment_to_map(self.dims(), from, to)?;

        // Clipping huge coordinates can overflow
        if from == to || !is_finite(&from) || !is_finite(&to) {
            return None;
        }

        let skipped = (from - origin).norm();

        // Finite endpoints far enough apart can still overflow the length
        let dist = if self.checks_underground_start() && from.y <= self.height_at(from.x, from.z) {
            Some(skipped)
        } else {
            self.trace_cells(&from, &to).map(|dist| dist + skipped)
        };

        dist.filter(|dist| dist.is_finite())
    }

    /// Walk the cells under `from -> to` and return the first hit distance.
    ///
    /// Both points must already be clipped to the map rectangle.
    fn trace_cells(&self, from: &Vec3, to: &Vec3) -> Option<f32> {
        let dims = self.dims();
        let size = dims.square_size();
        let last_x = dims.map_x() as i64 - 1;
        let last_z = dims.map_z() as i64 - 1;

        let dx = to.x - from.x;
        let dz = to.z - from.z;
        let dir_x: i64 = if dx > 0.0 { 1 } else { -1 };
        let dir_z: i64 = if dz > 0.0 { 1 } else { -1 };

        // Fractional grid coordinates; points on the far map edge belong to
        // the last cell
        let ffsx = (from.x / size).clamp(0.0, dims.map_x() as f32);
        let ffsz = (from.z / size).clamp(0.0, dims.map_z() as f32);
        let fsx = (ffsx as i64).min(last_x);
        let fsz = (ffsz as i64).min(last_z);
        let tsx = ((to.x / size).clamp(0.0, dims.map_x() as f32) as i64).min(last_x);
        let tsz = ((to.z / size).clamp(0.0, dims.map_z() as f32) as i64).min(last_z);

        let limit = dims.traversal_limit();

        if fsx == tsx && fsz == tsz {
            return self.test_cell(from, to, fsx, fsz);
        }

        if fsx == tsx {
            // Parallel to z
            let mut cz = fsz;
            for _ in 0..limit {
                if let Some(dist) = self.test_cell(from, to, fsx, cz) {
                    return Some(dist);
                }
                if cz == tsz {
                    return None;
                }
                cz += dir_z;
            }
            return self.traversal_exhausted(fsx, cz, tsx, tsz);
        }

        if fsz == tsz {
            // Parallel to x
            let mut cx = fsx;
            for _ in 0..limit {
                if let Some(dist) = self.test_cell(from, to, cx, fsz) {
                    return Some(dist);
                }
                if cx == tsx {
                    return None;
                }
                cx += dir_x;
            }
            return self.traversal_exhausted(cx, fsz, tsx, tsz);
        }

        // Parametric length of one cell along each axis
        let rdsx = size / dx;
        let rdsz = size / dz;

        // Walking backwards the next grid line is the near edge of the
        // current cell, not of the next one
        let test_x = if dx > 0.0 { 0.0 } else { 1.0 };
        let test_z = if dz > 0.0 { 0.0 } else { 1.0 };

        let mut cx = fsx;
        let mut cz = fsz;

        for _ in 0..limit {
            if let Some(dist) = self.test_cell(from, to, cx, cz) {
                return Some(dist);
            }

            if cx == tsx && cz == tsz {
                return None;
            }

            let beyond_end = (cx - tsx) * dir_x > 0 || (cz - tsz) * dir_z > 0;
            debug_assert!(!beyond_end, "raycast walked past target cell ({tsx}, {tsz}) to ({cx}, {cz})");
            if beyond_end {
                warn!(cx, cz, tsx, tsz, "raycast walked past its target cell");
                return None;
            }

            let mut next_x = cx + dir_x;
            let mut next_z = cz + dir_z;
            let mut xn = (next_x as f32 + test_x - ffsx) * rdsx;
            let mut zn = (next_z as f32 + test_z - ffsz) * rdsz;

            // Never step past the target, whatever rounding says
            if (next_x - tsx) * dir_x > 0 {
                xn = f32::INFINITY;
                next_x = tsx;
            }
            if (next_z - tsz) * dir_z > 0 {
                zn = f32::INFINITY;
                next_z = tsz;
            }

            if (xn >= 1.0 && zn >= 1.0) || xn == zn {
                cx = next_x;
                cz = next_z;
            } else if xn < zn {
                cx = next_x;
            } else {
                cz = next_z;
            }
        }

        self.traversal_exhausted(cx, cz, tsx, tsz)
    }

    #[cold]
    fn traversal_exhausted(&self, cx: i64, cz: i64, tsx: i64, tsz: i64) -> Option<f32> {
        debug_assert!(
            cx == tsx && cz == tsz,
            "raycast traversal limit reached at ({cx}, {cz}), target ({tsx}, {tsz})"
        );
        warn!(
            cx,
            cz,
            tsx,
            tsz,
            limit = self.dims().traversal_limit(),
            "raycast traversal limit reached"
        );
        None
    }

    /// Test both triangles of cell `(cx, cz)` against `from -> to`.
    ///
    /// Each face is tested against its own plane through one representative
    /// corner, then the crossing is checked against the triangle footprint.
    /// Footprints are widened by a rounding margin so a crossing on a shared
    /// edge is accepted by at least one of the cells next to it.
    fn test_cell(&self, from: &Vec3, to: &Vec3, cx: i64, cz: i64) -> Option<f32> {
        let dims = self.dims();
        if cx < 0 || cz < 0 || cx >= dims.map_x() as i64 || cz >= dims.map_z() as i64 {
            return None;
        }

        let (x, z) = (cx as usize, cz as usize);
        let size = dims.square_size();
        let slack = size * FOOTPRINT_SLACK;

        let top_left = Vec3::new(
            x as f32 * size,
            self.source.corner_height(x, z),
            z as f32 * size,
        );
        let normal = self.source.face_normal(x, z, Face::TopLeft);

        if let Some(hit) = plane_crossing(from, to, &top_left, &normal) {
            if hit.x >= top_left.x - slack
                && hit.z >= top_left.z - slack
                && hit.x + hit.z <= top_left.x + top_left.z + size + slack
            {
                return Some((hit - from).norm());
            }
        }

        let bottom_right = Vec3::new(
            (x + 1) as f32 * size,
            self.source.corner_height(x + 1, z + 1),
            (z + 1) as f32 * size,
        );
        let normal = self.source.face_normal(x, z, Face::BottomRight);

        if let Some(hit) = plane_crossing(from, to, &bottom_right, &normal) {
            if hit.x <= bottom_right.x + slack
                && hit.z <= bottom_right.z + slack
                && hit.x + hit.z >= bottom_right.x + bottom_right.z - size - slack
            {
                return Some((hit - from).norm());
            }
        }

        None
    }
}
