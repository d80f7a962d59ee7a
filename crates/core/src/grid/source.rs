//! Read-only collaborator contracts consumed by the query engine.
//!
//! The engine never owns terrain storage. It reads through [`HeightSource`]
//! (any buffer set with the corner/center/face/slope layout) and asks a
//! [`WaterLevel`] for the water plane height.

use super::dims::MapDims;
use crate::core_types::Vec3;
use serde::{Deserialize, Serialize};

/// One of the two right triangles a grid cell is split into.
///
/// The split runs along the diagonal shared by corners `(x + 1, z)` and
/// `(x, z + 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    /// Triangle {(x, z), (x + 1, z), (x, z + 1)}
    TopLeft = 0,
    /// Triangle {(x + 1, z), (x, z + 1), (x + 1, z + 1)}
    BottomRight = 1,
}

/// Which buffer set a query reads from.
///
/// Synced buffers are identical on every simulation participant and must be
/// used for anything that affects gameplay. Unsynced buffers are local-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GridView {
    #[default]
    Synced,
    Unsynced,
}

impl GridView {
    #[inline]
    pub fn is_synced(self) -> bool {
        matches!(self, GridView::Synced)
    }
}

/// Read accessors over one frozen terrain snapshot.
///
/// Indices are grid coordinates, never raw offsets. Implementors may assume
/// callers keep them in range: cells in `[0, map - 1]`, corners in
/// `[0, map]`, slope samples in `[0, half - 1]`.
pub trait HeightSource: Send + Sync {
    /// Map geometry of this snapshot
    fn dims(&self) -> &MapDims;

    /// Elevation at grid vertex `(x, z)`
    fn corner_height(&self, x: usize, z: usize) -> f32;

    /// Aggregate elevation of cell `(x, z)`
    fn center_height(&self, x: usize, z: usize) -> f32;

    /// Aggregate unit normal of cell `(x, z)`
    fn center_normal(&self, x: usize, z: usize) -> Vec3;

    /// Unit normal of one triangle of cell `(x, z)`
    fn face_normal(&self, x: usize, z: usize, face: Face) -> Vec3;

    /// Half-resolution slope sample (0 = flat, 1 = vertical)
    fn slope(&self, hx: usize, hz: usize) -> f32;

    /// Highest corner elevation currently present in the snapshot
    fn current_max_height(&self) -> f32;
}

/// Water plane height lookup.
pub trait WaterLevel: Send + Sync {
    fn water_level(&self, x: f32, z: f32) -> f32;
}

/// A single water plane covering the whole map.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConstantWaterLevel(pub f32);

impl WaterLevel for ConstantWaterLevel {
    #[inline]
    fn water_level(&self, _x: f32, _z: f32) -> f32 {
        self.0
    }
}

impl<F> WaterLevel for F
where
    F: Fn(f32, f32) -> f32 + Send + Sync,
{
    #[inline]
    fn water_level(&self, x: f32, z: f32) -> f32 {
        self(x, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_water_level_sources() {
        let sea = ConstantWaterLevel(-3.0);
        assert_eq!(sea.water_level(10.0, 20.0), -3.0);

        let tide = |x: f32, _z: f32| x * 0.5;
        assert_eq!(tide.water_level(4.0, 0.0), 2.0);
    }

    #[test]
    fn test_default_view_is_synced() {
        assert!(GridView::default().is_synced());
        assert!(!GridView::Unsynced.is_synced());
    }
}
