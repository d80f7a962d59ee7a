//! Clipping of query segments to the map volume
//!
//! Raycasts only walk cells that exist and only below the highest terrain
//! point, so segments are shortened before traversal. Callers add the length
//! cut off the front back onto any hit distance.

use crate::core_types::Vec3;
use crate::grid::MapDims;

/// Parametric range `[enter, exit]` of a line `pos + t * dir` inside the map
/// rectangle. Either end may be negative or beyond 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryInterval {
    pub enter: f32,
    pub exit: f32,
}

/// Range of `t` for which `p + t * d` lies in `[0, max]`.
#[inline]
fn slab(p: f32, d: f32, max: f32) -> Option<(f32, f32)> {
    if d == 0.0 {
        return if (0.0..=max).contains(&p) {
            Some((f32::NEG_INFINITY, f32::INFINITY))
        } else {
            None
        };
    }

    let t0 = -p / d;
    let t1 = (max - p) / d;
    Some((t0.min(t1), t0.max(t1)))
}

/// Intersect the horizontal projection of `pos + t * dir` with the map rectangle.
///
/// Returns `None` if the line misses the map or the map lies entirely behind
/// `pos` (`exit < 0`). The vertical components are ignored.
pub fn map_boundary_intersection(dims: &MapDims, pos: &Vec3, dir: &Vec3) -> Option<BoundaryInterval> {
    let (x_enter, x_exit) = slab(pos.x, dir.x, dims.max_x_pos())?;
    let (z_enter, z_exit) = slab(pos.z, dir.z, dims.max_z_pos())?;

    let enter = x_enter.max(z_enter);
    let exit = x_exit.min(z_exit);

    if enter > exit || exit < 0.0 {
        return None;
    }

    Some(BoundaryInterval { enter, exit })
}

/// Clip the segment `from -> to` to the map rectangle.
///
/// Returns `None` when no part of the segment lies over the map. Clipped
/// endpoints are clamped into the extent so rounding never leaves them a
/// hair outside.
pub fn clamp_segment_to_map(dims: &MapDims, from: Vec3, to: Vec3) -> Option<(Vec3, Vec3)> {
    let dir = to - from;
    let ips = map_boundary_intersection(dims, &from, &dir)?;

    if ips.enter > 1.0 {
        return None;
    }

    let clamp = |mut p: Vec3| {
        p.x = p.x.clamp(0.0, dims.max_x_pos());
        p.z = p.z.clamp(0.0, dims.max_z_pos());
        p
    };

    let start = if ips.enter > 0.0 { clamp(from + dir * ips.enter) } else { from };
    let end = if ips.exit < 1.0 { clamp(from + dir * ips.exit) } else { to };

    Some((start, end))
}

/// Advance `from` down to the `max_height` plane.
///
/// Terrain can't be hit above its highest point. Returns the (possibly
/// unchanged) start point, or `None` when the segment stays above the plane.
pub fn clamp_segment_to_height(from: Vec3, to: Vec3, max_height: f32) -> Option<Vec3> {
    let height_above_max = from.y - max_height;

    if height_above_max <= 0.0 {
        return Some(from);
    }

    let dir = to - from;

    if dir.y >= 0.0 || to.y > max_height {
        return None;
    }

    Some(from + dir * (-height_above_max / dir.y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn dims() -> MapDims {
        MapDims::new(4, 4, 8.0).unwrap()
    }

    #[test]
    fn test_interval_for_crossing_line() {
        let ips = map_boundary_intersection(&dims(), &Vec3::new(-16.0, 0.0, 16.0), &Vec3::new(64.0, 0.0, 0.0))
            .unwrap();
        assert_relative_eq!(ips.enter, 0.25);
        assert_relative_eq!(ips.exit, 0.75);
    }

    #[test]
    fn test_interval_inside_map_starts_behind() {
        let ips = map_boundary_intersection(&dims(), &Vec3::new(16.0, 0.0, 16.0), &Vec3::new(8.0, 0.0, 0.0))
            .unwrap();
        assert_relative_eq!(ips.enter, -2.0);
        assert_relative_eq!(ips.exit, 2.0);
    }

    #[test]
    fn test_interval_misses_map() {
        // Parallel to x outside the z range
        assert!(map_boundary_intersection(&dims(), &Vec3::new(0.0, 0.0, 40.0), &Vec3::new(1.0, 0.0, 0.0)).is_none());
        // Pointing away from the map
        assert!(map_boundary_intersection(&dims(), &Vec3::new(-8.0, 0.0, 8.0), &Vec3::new(-1.0, 0.0, 0.0)).is_none());
        // Vertical line outside
        assert!(map_boundary_intersection(&dims(), &Vec3::new(-1.0, 0.0, 8.0), &Vec3::new(0.0, -1.0, 0.0)).is_none());
    }

    #[test]
    fn test_vertical_line_inside_is_unbounded() {
        let ips = map_boundary_intersection(&dims(), &Vec3::new(4.0, 9.0, 4.0), &Vec3::new(0.0, -1.0, 0.0)).unwrap();
        assert_eq!(ips.enter, f32::NEG_INFINITY);
        assert_eq!(ips.exit, f32::INFINITY);
    }

    #[test]
    fn test_clamp_segment_keeps_inside_segment() {
        let from = Vec3::new(1.0, 5.0, 2.0);
        let to = Vec3::new(30.0, -5.0, 20.0);
        assert_eq!(clamp_segment_to_map(&dims(), from, to), Some((from, to)));
    }

    #[test]
    fn test_clamp_segment_clips_both_ends() {
        let (start, end) =
            clamp_segment_to_map(&dims(), Vec3::new(-8.0, 10.0, 16.0), Vec3::new(40.0, -14.0, 16.0)).unwrap();

        assert_relative_eq!(start, Vec3::new(0.0, 6.0, 16.0), epsilon = 1e-5);
        assert_relative_eq!(end, Vec3::new(32.0, -10.0, 16.0), epsilon = 1e-5);
    }

    #[test]
    fn test_clamp_segment_outside() {
        // Ends before reaching the map
        assert!(clamp_segment_to_map(&dims(), Vec3::new(-20.0, 0.0, 8.0), Vec3::new(-10.0, 0.0, 8.0)).is_none());
    }

    #[test]
    fn test_height_clamp() {
        let from = Vec3::new(0.0, 100.0, 0.0);

        // Below the max: untouched
        assert_eq!(clamp_segment_to_height(Vec3::new(0.0, 5.0, 0.0), from, 10.0), Some(Vec3::new(0.0, 5.0, 0.0)));

        // Descending through the plane
        let start = clamp_segment_to_height(from, Vec3::new(90.0, 10.0, 0.0), 55.0).unwrap();
        assert_relative_eq!(start, Vec3::new(45.0, 55.0, 0.0), epsilon = 1e-4);

        // Rising or level
        assert!(clamp_segment_to_height(from, Vec3::new(10.0, 100.0, 0.0), 50.0).is_none());
        // Descending but never reaching the plane
        assert!(clamp_segment_to_height(from, Vec3::new(10.0, 60.0, 0.0), 50.0).is_none());
    }
}
