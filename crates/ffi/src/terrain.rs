//! FFI-exposed terrain configuration types.
//!
//! Defines the `Terrain` enum game engines pass to `groundcast_new` to
//! describe the height grid to build. Both the synced and unsynced views
//! start out as copies of this grid.

/// Terrain configuration for a ground instance.
///
/// Every variant carries the map geometry: `map_x` by `map_z` cells of
/// `square_size` world units, i.e. `(map_x + 1) * (map_z + 1)` corner samples.
/// FFI-safe with a stable C-compatible memory layout (`#[repr(C)]`).
///
/// # Example (Conceptual)
///
/// ```c
/// Terrain terrain;
/// terrain.tag = Flat;
/// terrain.flat.map_x = 256;
/// terrain.flat.map_z = 256;
/// terrain.flat.square_size = 8.0;
/// terrain.flat.base_elevation = 0.0;
/// ```
///
/// The exact syntax depends on your FFI binding generator (e.g., cbindgen, bindgen).
#[repr(C)]
pub enum Terrain {
    /// Flat terrain at a fixed elevation.
    Flat {
        /// Number of cells along x.
        map_x: usize,
        /// Number of cells along z.
        map_z: usize,
        /// Edge length of one cell in world units.
        square_size: f32,
        /// Elevation of every corner.
        base_elevation: f32,
    },

    /// Single Gaussian hill in the middle of the map.
    SingleHill {
        /// Number of cells along x.
        map_x: usize,
        /// Number of cells along z.
        map_z: usize,
        /// Edge length of one cell in world units.
        square_size: f32,
        /// Elevation far from the hill.
        base_elevation: f32,
        /// Height of the peak above base elevation.
        hill_height: f32,
        /// Gaussian radius of the hill in world units.
        hill_radius: f32,
    },

    /// Valley between two hills along the x axis.
    ValleyBetweenHills {
        /// Number of cells along x.
        map_x: usize,
        /// Number of cells along z.
        map_z: usize,
        /// Edge length of one cell in world units.
        square_size: f32,
        /// Base elevation of the valley floor.
        base_elevation: f32,
        /// Height of the hills above base elevation.
        hill_height: f32,
    },

    /// Terrain from caller-provided corner samples.
    ///
    /// The heightmap pointer should point to `(map_x + 1) * (map_z + 1)` f32
    /// values in row-major order (`[z * (map_x + 1) + x]`).
    FromHeightmap {
        /// Number of cells along x.
        map_x: usize,
        /// Number of cells along z.
        map_z: usize,
        /// Edge length of one cell in world units.
        square_size: f32,
        /// Pointer to the corner samples.
        heightmap_ptr: *const f32,
        /// Scale factor applied to each sample.
        elevation_scale: f32,
        /// Elevation added to every scaled sample.
        base_elevation: f32,
    },
}

impl Terrain {
    /// Map geometry shared by every variant: `(map_x, map_z, square_size)`.
    pub(crate) fn geometry(&self) -> (usize, usize, f32) {
        match *self {
            Terrain::Flat {
                map_x,
                map_z,
                square_size,
                ..
            }
            | Terrain::SingleHill {
                map_x,
                map_z,
                square_size,
                ..
            }
            | Terrain::ValleyBetweenHills {
                map_x,
                map_z,
                square_size,
                ..
            }
            | Terrain::FromHeightmap {
                map_x,
                map_z,
                square_size,
                ..
            } => (map_x, map_z, square_size),
        }
    }
}
