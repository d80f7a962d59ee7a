//! Point queries: height, normal, slope and water depth at `(x, z)`
//!
//! All lookups clamp the query position into the map rectangle first, so
//! positions off the map sample the nearest edge.

use super::Ground;
use crate::core_types::Vec3;
use crate::grid::{HeightSource, MapDims};

/// Height of the triangle surface at world `(x, z)`.
///
/// Each cell is two planar triangles meeting on the diagonal between
/// corners `(ix + 1, iz)` and `(ix, iz + 1)`. The result is continuous
/// everywhere but creased along that diagonal.
#[inline]
pub(crate) fn interpolate_corner_height<S: HeightSource + ?Sized>(source: &S, x: f32, z: f32) -> f32 {
    let dims = source.dims();
    let size = dims.square_size();

    let gx = x.clamp(0.0, dims.max_x_pos()) / size;
    let gz = z.clamp(0.0, dims.max_z_pos()) / size;

    let ix = (gx as usize).min(dims.map_x() - 1);
    let iz = (gz as usize).min(dims.map_z() - 1);

    let dx = gx - ix as f32;
    let dz = gz - iz as f32;

    let h10 = source.corner_height(ix + 1, iz);
    let h01 = source.corner_height(ix, iz + 1);

    if dx + dz < 1.0 {
        let h00 = source.corner_height(ix, iz);
        h00 + dx * (h10 - h00) + dz * (h01 - h00)
    } else {
        let h11 = source.corner_height(ix + 1, iz + 1);
        h11 + (1.0 - dx) * (h01 - h11) + (1.0 - dz) * (h10 - h11)
    }
}

/// Cell index around which [`Ground::smooth_normal_at`] blends.
///
/// Kept one cell away from the border where the map is wide enough, so the
/// neighbour on either side exists.
#[inline]
fn smooth_sample_index(grid_coord: f32, cells: usize) -> i64 {
    let last = cells as i64 - 1;
    (grid_coord.floor() as i64).min(last - 1).max(1).min(last)
}

impl<S: HeightSource + ?Sized> Ground<'_, S> {
    /// Interpolated terrain height at world `(x, z)`
    #[inline]
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        interpolate_corner_height(self.source, x, z)
    }

    /// Center height of the cell containing `(x, z)`; one lookup, no interpolation
    #[inline]
    pub fn approx_height_at(&self, x: f32, z: f32) -> f32 {
        let (cx, cz) = self.dims().cell_of(x, z);
        self.source.center_height(cx, cz)
    }

    /// Center normal of the cell containing `(x, z)`
    #[inline]
    pub fn normal_at(&self, x: f32, z: f32) -> Vec3 {
        let (cx, cz) = self.dims().cell_of(x, z);
        self.source.center_normal(cx, cz)
    }

    /// Like [`normal_at`](Self::normal_at), but straight up where the
    /// terrain is at or below the water surface.
    pub fn normal_above_water(&self, x: f32, z: f32) -> Vec3 {
        if self.height_at(x, z) <= self.water.water_level(x, z) {
            return Vec3::y();
        }

        self.normal_at(x, z)
    }

    /// Bilinear blend of the four cell-center normals nearest to `(x, z)`.
    ///
    /// Cell centers sit at half-cell offsets, so the neighbours are picked on
    /// whichever side of the center the query falls.
    pub fn smooth_normal_at(&self, x: f32, z: f32) -> Vec3 {
        let dims = self.dims();
        let size = dims.square_size();

        let gx = x.clamp(0.0, dims.max_x_pos()) / size;
        let gz = z.clamp(0.0, dims.max_z_pos()) / size;

        let sx = smooth_sample_index(gx, dims.map_x());
        let sz = smooth_sample_index(gz, dims.map_z());

        let dx = gx - sx as f32;
        let dz = gz - sz as f32;

        let (sx2, fx) = if dx > 0.5 { (sx + 1, dx - 0.5) } else { (sx - 1, 0.5 - dx) };
        let (sz2, fz) = if dz > 0.5 { (sz + 1, dz - 0.5) } else { (sz - 1, 0.5 - dz) };

        let fx = fx.clamp(0.0, 1.0);
        let fz = fz.clamp(0.0, 1.0);
        let ifx = 1.0 - fx;
        let ifz = 1.0 - fz;

        let sx2 = sx2.clamp(0, dims.map_x() as i64 - 1);
        let sz2 = sz2.clamp(0, dims.map_z() as i64 - 1);

        let normal = |cx: i64, cz: i64| self.source.center_normal(cx as usize, cz as usize);

        let blended = normal(sx, sz) * (ifx * ifz)
            + normal(sx2, sz) * (fx * ifz)
            + normal(sx, sz2) * (ifx * fz)
            + normal(sx2, sz2) * (fx * fz);

        blended.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::y)
    }

    /// Half-resolution slope at `(x, z)`: 0 on flat ground, approaching 1 on
    /// vertical faces
    #[inline]
    pub fn slope_at(&self, x: f32, z: f32) -> f32 {
        let (hx, hz) = self.dims().half_cell_of(x, z);
        self.source.slope(hx, hz)
    }

    /// How far the terrain rises above the water surface, 0 when submerged
    pub fn height_above_water(&self, x: f32, z: f32) -> f32 {
        (self.height_at(x, z) - self.water.water_level(x, z)).max(0.0)
    }

    /// Clamped cell coordinate containing `(x, z)`
    #[inline]
    pub fn cell_at(&self, x: f32, z: f32) -> (usize, usize) {
        self.dims().cell_of(x, z)
    }

    #[inline]
    pub(crate) fn dims(&self) -> &MapDims {
        self.source.dims()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{ConstantWaterLevel, GridView, HeightGrid};
    use approx::assert_relative_eq;

    const SEA: ConstantWaterLevel = ConstantWaterLevel(0.0);

    fn bumpy(map_x: usize, map_z: usize) -> HeightGrid {
        let dims = MapDims::new(map_x, map_z, 8.0).unwrap();
        HeightGrid::from_fn(dims, |x, z| {
            (x * 0.37).sin() * 6.0 + (z * 0.21).cos() * 4.0 + x * 0.1
        })
        .unwrap()
    }

    #[test]
    fn test_height_matches_corner_samples() {
        let grid = bumpy(6, 5);
        let ground = Ground::new(&grid, &SEA, GridView::Synced);

        for iz in 0..=5 {
            for ix in 0..=6 {
                let h = ground.height_at(ix as f32 * 8.0, iz as f32 * 8.0);
                assert_relative_eq!(h, grid.corner_height(ix, iz), epsilon = 1e-4);
            }
        }
    }

    #[test]
    fn test_height_is_planar_per_triangle() {
        let grid = bumpy(4, 4);
        let ground = Ground::new(&grid, &SEA, GridView::Synced);

        // Top-left triangle of cell (1, 2)
        let (h00, h10, h01) = (grid.corner_height(1, 2), grid.corner_height(2, 2), grid.corner_height(1, 3));
        let expected = h00 + 0.25 * (h10 - h00) + 0.5 * (h01 - h00);
        assert_relative_eq!(ground.height_at(10.0, 20.0), expected, epsilon = 1e-4);

        // Bottom-right triangle of the same cell
        let h11 = grid.corner_height(2, 3);
        let expected = h11 + 0.25 * (h01 - h11) + 0.125 * (h10 - h11);
        assert_relative_eq!(ground.height_at(14.0, 23.0), expected, epsilon = 1e-4);
    }

    #[test]
    fn test_height_continuous_across_edges() {
        let grid = bumpy(8, 8);
        let ground = Ground::new(&grid, &SEA, GridView::Synced);
        let eps = 1e-3;

        // Across the cell diagonal of cell (3, 3)
        let (x, z) = (24.0 + 5.0, 24.0 + 3.0);
        assert_relative_eq!(ground.height_at(x - eps, z), ground.height_at(x + eps, z), epsilon = 1e-2);

        // Across a vertical and a horizontal cell boundary
        assert_relative_eq!(ground.height_at(16.0 - eps, 11.0), ground.height_at(16.0 + eps, 11.0), epsilon = 1e-2);
        assert_relative_eq!(ground.height_at(37.0, 40.0 - eps), ground.height_at(37.0, 40.0 + eps), epsilon = 1e-2);
    }

    #[test]
    fn test_queries_clamp_outside_map() {
        let grid = bumpy(4, 4);
        let ground = Ground::new(&grid, &SEA, GridView::Synced);

        assert_eq!(ground.height_at(-100.0, -5.0), grid.corner_height(0, 0));
        assert_eq!(ground.height_at(1e6, 1e6), grid.corner_height(4, 4));
        assert_eq!(ground.cell_at(-1.0, 100.0), (0, 3));
        assert_eq!(ground.approx_height_at(500.0, 0.0), grid.center_height(3, 0));
        assert_eq!(ground.normal_at(500.0, 0.0), grid.center_normal(3, 0));
    }

    #[test]
    fn test_smooth_normal_flat_is_up_everywhere() {
        for (map_x, map_z) in [(1, 1), (2, 3), (16, 16)] {
            let dims = MapDims::new(map_x, map_z, 8.0).unwrap();
            let grid = HeightGrid::flat(dims, 12.0).unwrap();
            let ground = Ground::new(&grid, &SEA, GridView::Synced);

            for (x, z) in [(0.0, 0.0), (1.0, 2.0), (dims.max_x_pos(), dims.max_z_pos()), (-30.0, 999.0), (4.0, 4.0)] {
                assert_relative_eq!(ground.smooth_normal_at(x, z), Vec3::y(), epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_smooth_normal_blends_towards_neighbours() {
        let dims = MapDims::new(8, 8, 8.0).unwrap();
        // Steeper towards +x
        let grid = HeightGrid::from_fn(dims, |x, _| x * x * 0.02).unwrap();
        let ground = Ground::new(&grid, &SEA, GridView::Synced);

        // At a cell center the blend is that cell's normal alone
        assert_relative_eq!(ground.smooth_normal_at(28.0, 28.0), grid.center_normal(3, 3), epsilon = 1e-5);

        // Between two centers it tilts somewhere in between
        let n = ground.smooth_normal_at(32.0, 28.0);
        assert!(n.x < grid.center_normal(3, 3).x && n.x > grid.center_normal(4, 3).x);
        assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_slope() {
        let dims = MapDims::new(8, 8, 8.0).unwrap();
        let flat = HeightGrid::flat(dims, 3.0).unwrap();
        let ramp = HeightGrid::from_fn(dims, |x, _| x).unwrap();

        assert_relative_eq!(Ground::new(&flat, &SEA, GridView::Synced).slope_at(20.0, 20.0), 0.0, epsilon = 1e-6);

        // 45 degree ramp: 1 - cos(45)
        let slope = Ground::new(&ramp, &SEA, GridView::Synced).slope_at(20.0, 20.0);
        assert_relative_eq!(slope, 1.0 - std::f32::consts::FRAC_1_SQRT_2, epsilon = 1e-4);
    }

    #[test]
    fn test_water_relative_queries() {
        let dims = MapDims::new(4, 4, 8.0).unwrap();
        let ramp = HeightGrid::from_fn(dims, |x, _| x - 10.0).unwrap();
        let water = ConstantWaterLevel(2.0);
        let ground = Ground::new(&ramp, &water, GridView::Synced);

        assert_relative_eq!(ground.height_above_water(20.0, 5.0), 8.0, epsilon = 1e-4);
        assert_eq!(ground.height_above_water(4.0, 5.0), 0.0);

        assert_eq!(ground.normal_above_water(4.0, 5.0), Vec3::y());
        assert_eq!(ground.normal_above_water(28.0, 5.0), ground.normal_at(28.0, 5.0));
    }
}
