//! Horizontal plane crossings and combined terrain/water raycasts

use super::{Ground, MISS, NO_FINITE_CROSSING};
use crate::core_types::Vec3;
use crate::grid::HeightSource;

/// Distance along `dir` at which the ray `pos + dir * t`, `t` in `[0, len]`,
/// passes down through the horizontal plane `y = plane_height`.
///
/// Returns [`MISS`] if the ray starts below the plane or ends above it, and
/// [`NO_FINITE_CROSSING`] if it runs parallel to the plane or away from it.
pub fn line_plane_distance(pos: Vec3, dir: Vec3, len: f32, plane_height: f32) -> f32 {
    let end = pos + dir * len.max(0.0);

    if pos.y < plane_height || end.y > plane_height {
        return MISS;
    }

    if dir.y >= 0.0 {
        return NO_FINITE_CROSSING;
    }

    (pos.y - plane_height) / -dir.y
}

impl<S: HeightSource + ?Sized> Ground<'_, S> {
    /// Distance to the nearer of the terrain and the water surface along a ray.
    ///
    /// The water plane is taken at the height reported for `pos` and only
    /// counts where the ray crosses it over the map. `dir` should be unit
    /// length so both distances share units. With `test_water` off this is
    /// [`intersect_ray`](Self::intersect_ray).
    pub fn intersect_with_water(&self, pos: Vec3, dir: Vec3, len: f32, test_water: bool) -> f32 {
        let terrain = self.intersect_ray(pos, dir, len);
        if !test_water {
            return terrain;
        }

        let water = line_plane_distance(pos, dir, len, self.water.water_level(pos.x, pos.z));
        if water < 0.0 || water == NO_FINITE_CROSSING {
            return terrain;
        }

        let crossing = pos + dir * water;
        if !self.dims().contains(crossing.x, crossing.z) {
            return terrain;
        }

        if terrain < 0.0 {
            return water;
        }

        terrain.min(water)
    }
}
