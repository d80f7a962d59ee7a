//! Reference terrain store with the corner/center/face/slope buffer layout
//!
//! A `HeightGrid` is built once from corner elevations and derives every
//! buffer the query engine reads. All buffers are row-major: corners use a
//! stride of `map_x + 1`, cell buffers a stride of `map_x`, the slope buffer a
//! stride of `half_x`.

use super::dims::MapDims;
use super::error::GridError;
use super::source::{Face, GridView, HeightSource};
use crate::core_types::Vec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Terrain snapshot holding corner heights and everything derived from them
///
/// Only the dimensions and corner heights are serialized; the derived buffers
/// are rebuilt through [`HeightGrid::from_corner_heights`] on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(into = "HeightGridRepr", try_from = "HeightGridRepr")]
pub struct HeightGrid {
    dims: MapDims,
    /// Corner elevations, `[z * (map_x + 1) + x]`
    corner_heights: Vec<f32>,
    /// Mean of each cell's four corners, `[z * map_x + x]`
    center_heights: Vec<f32>,
    /// Normalized sum of each cell's two face normals
    center_normals: Vec<Vec3>,
    /// Two triangle normals per cell, `[(z * map_x + x) * 2 + face]`
    face_normals: Vec<Vec3>,
    /// Half-resolution slope, `[hz * half_x + hx]`
    slopes: Vec<f32>,
    min_height: f32,
    max_height: f32,
}

#[derive(Serialize, Deserialize)]
struct HeightGridRepr {
    dims: MapDims,
    corner_heights: Vec<f32>,
}

impl From<HeightGrid> for HeightGridRepr {
    fn from(grid: HeightGrid) -> Self {
        Self {
            dims: grid.dims,
            corner_heights: grid.corner_heights,
        }
    }
}

impl TryFrom<HeightGridRepr> for HeightGrid {
    type Error = GridError;

    fn try_from(repr: HeightGridRepr) -> Result<Self, Self::Error> {
        Self::from_corner_heights(repr.dims, repr.corner_heights)
    }
}

impl HeightGrid {
    /// Build a grid from `(map_x + 1) * (map_z + 1)` corner elevations.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::SampleCountMismatch`] if the buffer has the wrong
    /// length and [`GridError::NonFiniteHeight`] if any sample is NaN or infinite.
    pub fn from_corner_heights(dims: MapDims, corner_heights: Vec<f32>) -> Result<Self, GridError> {
        if corner_heights.len() != dims.corner_count() {
            return Err(GridError::SampleCountMismatch {
                expected: dims.corner_count(),
                actual: corner_heights.len(),
            });
        }
        if let Some(index) = corner_heights.iter().position(|h| !h.is_finite()) {
            return Err(GridError::NonFiniteHeight { index });
        }

        Ok(Self::derive(dims, corner_heights))
    }

    /// Create flat terrain at given elevation
    ///
    /// # Errors
    ///
    /// Returns [`GridError::NonFiniteHeight`] if `elevation` is NaN or infinite.
    pub fn flat(dims: MapDims, elevation: f32) -> Result<Self, GridError> {
        Self::from_corner_heights(dims, vec![elevation; dims.corner_count()])
    }

    /// Create terrain with a single Gaussian hill in the middle of the map
    ///
    /// # Errors
    ///
    /// Returns [`GridError::NonFiniteHeight`] if the parameters produce a
    /// non-finite corner, e.g. a zero `hill_radius`.
    pub fn single_hill(
        dims: MapDims,
        base_elevation: f32,
        hill_height: f32,
        hill_radius: f32,
    ) -> Result<Self, GridError> {
        let center_x = dims.max_x_pos() / 2.0;
        let center_z = dims.max_z_pos() / 2.0;

        Self::from_fn(dims, |x, z| {
            let dx = x - center_x;
            let dz = z - center_z;
            let dist_sq = dx * dx + dz * dz;

            base_elevation + hill_height * (-dist_sq / (hill_radius * hill_radius)).exp()
        })
    }

    /// Create terrain with a valley between two hills along the x axis
    ///
    /// # Errors
    ///
    /// Returns [`GridError::NonFiniteHeight`] if either elevation is not finite.
    pub fn valley_between_hills(
        dims: MapDims,
        base_elevation: f32,
        hill_height: f32,
    ) -> Result<Self, GridError> {
        let width = dims.max_x_pos();
        let hill1_x = width * 0.25;
        let hill2_x = width * 0.75;
        let center_z = dims.max_z_pos() / 2.0;
        let hill_radius = width * 0.2;

        Self::from_fn(dims, |x, z| {
            let dz = z - center_z;

            let dx1 = x - hill1_x;
            let height1 = hill_height * (-(dx1 * dx1 + dz * dz) / (hill_radius * hill_radius)).exp();

            let dx2 = x - hill2_x;
            let height2 = hill_height * (-(dx2 * dx2 + dz * dz) / (hill_radius * hill_radius)).exp();

            // Valley effect (negative between hills)
            let valley_x = (x - width / 2.0) / (width * 0.25);
            let valley_depth = -10.0 * (-(valley_x * valley_x)).exp();

            base_elevation + height1 + height2 + valley_depth
        })
    }

    /// Create terrain from a heightmap of corner samples
    ///
    /// # Arguments
    /// * `dims` - Map geometry; `heightmap` must hold `dims.corner_count()` values
    /// * `heightmap` - Row-major corner samples `[z * (map_x + 1) + x]`, usually in `[0, 1]`
    /// * `elevation_scale` - Multiplier for heightmap values
    /// * `base_elevation` - Base elevation to add to all heights
    ///
    /// # Errors
    ///
    /// Same as [`HeightGrid::from_corner_heights`].
    pub fn from_heightmap(
        dims: MapDims,
        heightmap: &[f32],
        elevation_scale: f32,
        base_elevation: f32,
    ) -> Result<Self, GridError> {
        let elevations = heightmap
            .iter()
            .map(|&h| base_elevation + h * elevation_scale)
            .collect();

        Self::from_corner_heights(dims, elevations)
    }

    /// Sample `height(x, z)` at every corner's world position.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::NonFiniteHeight`] for the first corner where
    /// `height` yields NaN or infinity.
    pub fn from_fn(dims: MapDims, height: impl Fn(f32, f32) -> f32) -> Result<Self, GridError> {
        let mut corners = Vec::with_capacity(dims.corner_count());
        for iz in 0..dims.corners_z() {
            for ix in 0..dims.corners_x() {
                let x = ix as f32 * dims.square_size;
                let z = iz as f32 * dims.square_size;
                corners.push(height(x, z));
            }
        }

        Self::from_corner_heights(dims, corners)
    }

    fn derive(dims: MapDims, corner_heights: Vec<f32>) -> Self {
        let size = dims.square_size;
        let stride = dims.corners_x();
        let corner = |x: usize, z: usize| corner_heights[z * stride + x];

        let mut center_heights = Vec::with_capacity(dims.cell_count());
        let mut center_normals = Vec::with_capacity(dims.cell_count());
        let mut face_normals = Vec::with_capacity(dims.cell_count() * 2);

        for z in 0..dims.map_z {
            for x in 0..dims.map_x {
                let h00 = corner(x, z);
                let h10 = corner(x + 1, z);
                let h01 = corner(x, z + 1);
                let h11 = corner(x + 1, z + 1);

                // Upward normals of the planes through each triangle
                let top_left = Vec3::new(-(h10 - h00), size, -(h01 - h00)).normalize();
                let bottom_right = Vec3::new(-(h11 - h01), size, -(h11 - h10)).normalize();

                center_heights.push((h00 + h10 + h01 + h11) * 0.25);
                center_normals.push((top_left + bottom_right).normalize());
                face_normals.push(top_left);
                face_normals.push(bottom_right);
            }
        }

        let mut slopes = Vec::with_capacity(dims.half_x() * dims.half_z());
        for hz in 0..dims.half_z() {
            for hx in 0..dims.half_x() {
                let mut sum = Vec3::zeros();
                for z in (hz * 2)..(hz * 2 + 2).min(dims.map_z) {
                    for x in (hx * 2)..(hx * 2 + 2).min(dims.map_x) {
                        let cell = (z * dims.map_x + x) * 2;
                        sum += face_normals[cell] + face_normals[cell + 1];
                    }
                }
                slopes.push(1.0 - sum.normalize().y);
            }
        }

        let (min_height, max_height) = corner_heights
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), &h| (lo.min(h), hi.max(h)));

        debug!(
            map_x = dims.map_x,
            map_z = dims.map_z,
            square_size = dims.square_size,
            min_height,
            max_height,
            "built height grid"
        );

        Self {
            dims,
            corner_heights,
            center_heights,
            center_normals,
            face_normals,
            slopes,
            min_height,
            max_height,
        }
    }

    #[inline]
    fn corner_index(&self, x: usize, z: usize) -> usize {
        debug_assert!(x <= self.dims.map_x && z <= self.dims.map_z, "corner ({x}, {z}) out of range");
        z * self.dims.corners_x() + x
    }

    #[inline]
    fn cell_index(&self, x: usize, z: usize) -> usize {
        debug_assert!(x < self.dims.map_x && z < self.dims.map_z, "cell ({x}, {z}) out of range");
        z * self.dims.map_x + x
    }

    /// Corner elevations in row-major order
    pub fn corner_heights(&self) -> &[f32] {
        &self.corner_heights
    }

    /// Get minimum corner elevation
    pub fn min_height(&self) -> f32 {
        self.min_height
    }

    /// Get maximum corner elevation
    pub fn max_height(&self) -> f32 {
        self.max_height
    }
}

impl HeightSource for HeightGrid {
    #[inline]
    fn dims(&self) -> &MapDims {
        &self.dims
    }

    #[inline]
    fn corner_height(&self, x: usize, z: usize) -> f32 {
        self.corner_heights[self.corner_index(x, z)]
    }

    #[inline]
    fn center_height(&self, x: usize, z: usize) -> f32 {
        self.center_heights[self.cell_index(x, z)]
    }

    #[inline]
    fn center_normal(&self, x: usize, z: usize) -> Vec3 {
        self.center_normals[self.cell_index(x, z)]
    }

    #[inline]
    fn face_normal(&self, x: usize, z: usize, face: Face) -> Vec3 {
        self.face_normals[self.cell_index(x, z) * 2 + face as usize]
    }

    #[inline]
    fn slope(&self, hx: usize, hz: usize) -> f32 {
        debug_assert!(hx < self.dims.half_x() && hz < self.dims.half_z());
        self.slopes[hz * self.dims.half_x() + hx]
    }

    #[inline]
    fn current_max_height(&self) -> f32 {
        self.max_height
    }
}

/// Synced and unsynced snapshots of the same map.
///
/// Queries pick one view up front; the two are never mixed within a query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "HeightGridSetRepr")]
pub struct HeightGridSet {
    synced: HeightGrid,
    unsynced: HeightGrid,
}

#[derive(Deserialize)]
struct HeightGridSetRepr {
    synced: HeightGrid,
    unsynced: HeightGrid,
}

impl TryFrom<HeightGridSetRepr> for HeightGridSet {
    type Error = GridError;

    fn try_from(repr: HeightGridSetRepr) -> Result<Self, Self::Error> {
        Self::new(repr.synced, repr.unsynced)
    }
}

impl HeightGridSet {
    /// Pair two snapshots of the same map.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::DimensionMismatch`] if the grids differ in size.
    pub fn new(synced: HeightGrid, unsynced: HeightGrid) -> Result<Self, GridError> {
        if synced.dims != unsynced.dims {
            return Err(GridError::DimensionMismatch);
        }

        Ok(Self { synced, unsynced })
    }

    /// Use the same snapshot for both views.
    pub fn mirrored(grid: HeightGrid) -> Self {
        Self {
            unsynced: grid.clone(),
            synced: grid,
        }
    }

    pub fn dims(&self) -> &MapDims {
        &self.synced.dims
    }

    /// Resolve a view to its buffer set
    #[inline]
    pub fn view(&self, view: GridView) -> &HeightGrid {
        match view {
            GridView::Synced => &self.synced,
            GridView::Unsynced => &self.unsynced,
        }
    }

    /// Swap in a refreshed snapshot for one view.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::DimensionMismatch`] if `grid` has different dimensions.
    pub fn replace(&mut self, view: GridView, grid: HeightGrid) -> Result<(), GridError> {
        if grid.dims != self.synced.dims {
            return Err(GridError::DimensionMismatch);
        }

        debug!(?view, max_height = grid.max_height, "replacing height grid view");
        match view {
            GridView::Synced => self.synced = grid,
            GridView::Unsynced => self.unsynced = grid,
        }
        Ok(())
    }
}
