//! Map geometry shared by every grid buffer and query.

use super::error::GridError;
use serde::{Deserialize, Serialize};

/// Map size in cells plus the world size of one cell.
///
/// Corner buffers are `(map_x + 1) * (map_z + 1)` samples, cell buffers are
/// `map_x * map_z`, and the slope buffer runs at half resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MapDimsRepr")]
pub struct MapDims {
    pub(crate) map_x: usize,
    pub(crate) map_z: usize,
    pub(crate) square_size: f32,
}

/// Unchecked wire form of [`MapDims`]; deserialization goes through [`MapDims::new`].
#[derive(Deserialize)]
struct MapDimsRepr {
    map_x: usize,
    map_z: usize,
    square_size: f32,
}

impl TryFrom<MapDimsRepr> for MapDims {
    type Error = GridError;

    fn try_from(repr: MapDimsRepr) -> Result<Self, Self::Error> {
        Self::new(repr.map_x, repr.map_z, repr.square_size)
    }
}

impl Default for MapDims {
    fn default() -> Self {
        Self {
            map_x: 64,
            map_z: 64,
            square_size: 8.0,
        }
    }
}

impl MapDims {
    /// Validate and create map dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidDimensions`] if either cell count is zero or
    /// the corner buffer size overflows `usize`, and
    /// [`GridError::InvalidSquareSize`] if `square_size` is not finite and positive.
    pub fn new(map_x: usize, map_z: usize, square_size: f32) -> Result<Self, GridError> {
        let corner_count = map_x
            .checked_add(1)
            .zip(map_z.checked_add(1))
            .and_then(|(cx, cz)| cx.checked_mul(cz));
        if map_x == 0 || map_z == 0 || corner_count.is_none() {
            return Err(GridError::InvalidDimensions { map_x, map_z });
        }
        if !square_size.is_finite() || square_size <= 0.0 {
            return Err(GridError::InvalidSquareSize(square_size));
        }

        Ok(Self {
            map_x,
            map_z,
            square_size,
        })
    }

    /// Number of cells along x
    #[inline]
    pub fn map_x(&self) -> usize {
        self.map_x
    }

    /// Number of cells along z
    #[inline]
    pub fn map_z(&self) -> usize {
        self.map_z
    }

    /// World size of one cell edge
    #[inline]
    pub fn square_size(&self) -> f32 {
        self.square_size
    }

    /// Corner samples per row (row stride of the corner buffer)
    #[inline]
    pub fn corners_x(&self) -> usize {
        self.map_x + 1
    }

    /// Corner rows
    #[inline]
    pub fn corners_z(&self) -> usize {
        self.map_z + 1
    }

    /// Slope samples per row; the slope grid covers 2x2 cells per sample.
    #[inline]
    pub fn half_x(&self) -> usize {
        (self.map_x / 2).max(1)
    }

    /// Slope rows
    #[inline]
    pub fn half_z(&self) -> usize {
        (self.map_z / 2).max(1)
    }

    /// Number of cells in the map
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.map_x * self.map_z
    }

    /// Number of corner samples in the map
    #[inline]
    pub fn corner_count(&self) -> usize {
        self.corners_x() * self.corners_z()
    }

    /// World extent along x (the map spans `[0, max_x_pos]`)
    #[inline]
    pub fn max_x_pos(&self) -> f32 {
        self.map_x as f32 * self.square_size
    }

    /// World extent along z (the map spans `[0, max_z_pos]`)
    #[inline]
    pub fn max_z_pos(&self) -> f32 {
        self.map_z as f32 * self.square_size
    }

    /// Whether a world position lies inside the horizontal map rectangle (inclusive).
    #[inline]
    pub fn contains(&self, x: f32, z: f32) -> bool {
        (0.0..=self.max_x_pos()).contains(&x) && (0.0..=self.max_z_pos()).contains(&z)
    }

    /// Upper bound on the cells a monotone walk across the map can visit.
    ///
    /// Each traversal step advances at least one axis by one cell towards the
    /// target, so no segment needs more than `map_x + map_z + 1` cell tests.
    #[inline]
    pub fn traversal_limit(&self) -> usize {
        self.map_x + self.map_z + 2
    }

    /// Clamped cell coordinate containing world position `(x, z)`.
    #[inline]
    pub fn cell_of(&self, x: f32, z: f32) -> (usize, usize) {
        let cx = (x.clamp(0.0, self.max_x_pos()) / self.square_size) as usize;
        let cz = (z.clamp(0.0, self.max_z_pos()) / self.square_size) as usize;
        (cx.min(self.map_x - 1), cz.min(self.map_z - 1))
    }

    /// Clamped slope-grid coordinate containing world position `(x, z)`.
    #[inline]
    pub fn half_cell_of(&self, x: f32, z: f32) -> (usize, usize) {
        let size = 2.0 * self.square_size;
        let hx = (x.clamp(0.0, self.max_x_pos()) / size) as usize;
        let hz = (z.clamp(0.0, self.max_z_pos()) / size) as usize;
        (hx.min(self.half_x() - 1), hz.min(self.half_z() - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_map() {
        assert_eq!(
            MapDims::new(0, 4, 8.0),
            Err(GridError::InvalidDimensions { map_x: 0, map_z: 4 })
        );
        assert!(matches!(
            MapDims::new(4, 4, 0.0),
            Err(GridError::InvalidSquareSize(_))
        ));
        assert!(MapDims::new(4, 4, f32::NAN).is_err());
        assert!(matches!(
            MapDims::new(usize::MAX, 4, 8.0),
            Err(GridError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_deserialize_validates() {
        let dims: MapDims =
            serde_json::from_str(r#"{"map_x":6,"map_z":4,"square_size":8.0}"#).unwrap();
        assert_eq!(dims, MapDims::new(6, 4, 8.0).unwrap());

        assert!(serde_json::from_str::<MapDims>(r#"{"map_x":0,"map_z":4,"square_size":8.0}"#).is_err());
        assert!(
            serde_json::from_str::<MapDims>(r#"{"map_x":4,"map_z":4,"square_size":-2.0}"#).is_err()
        );
    }

    #[test]
    fn test_derived_sizes() {
        let dims = MapDims::new(6, 4, 8.0).unwrap();
        assert_eq!(dims.corners_x(), 7);
        assert_eq!(dims.corner_count(), 35);
        assert_eq!(dims.half_x(), 3);
        assert_eq!(dims.half_z(), 2);
        assert_eq!(dims.max_x_pos(), 48.0);
        assert_eq!(dims.max_z_pos(), 32.0);
    }

    #[test]
    fn test_cell_of_clamps() {
        let dims = MapDims::new(4, 4, 8.0).unwrap();
        assert_eq!(dims.cell_of(-50.0, 9.0), (0, 1));
        assert_eq!(dims.cell_of(32.0, 32.0), (3, 3));
        assert_eq!(dims.cell_of(1000.0, 15.9), (3, 1));
        assert_eq!(dims.half_cell_of(31.0, 0.0), (1, 0));
    }

    #[test]
    fn test_single_cell_map_has_one_slope_sample() {
        let dims = MapDims::new(1, 1, 2.0).unwrap();
        assert_eq!((dims.half_x(), dims.half_z()), (1, 1));
        assert_eq!(dims.half_cell_of(2.0, 2.0), (0, 0));
    }
}
