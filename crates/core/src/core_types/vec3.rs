//! Vector type alias for 3D positions and directions.

use nalgebra::Vector3;

/// 3D vector type for positions, velocities, and directions.
///
/// This is a simple alias for `nalgebra::Vector3<f32>`. The `y` component is
/// up; `x` and `z` span the map plane.
pub type Vec3 = Vector3<f32>;

/// Squared distance between two points projected onto the map (xz) plane.
#[inline]
pub fn distance_sq_2d(a: &Vec3, b: &Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    dx * dx + dz * dz
}

/// Whether every component of `v` is finite.
#[inline]
pub fn is_finite(v: &Vec3) -> bool {
    v.iter().all(|c| c.is_finite())
}

/// Copy of `v` with the vertical component dropped.
#[inline]
pub fn horizontal(v: &Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}
