//! Data-parallel fan-out of independent queries
//!
//! Every element is answered by the same read-only handle, so the batch is
//! split over rayon's pool without any synchronization. Output order always
//! matches input order.

use super::Ground;
use crate::core_types::Vec3;
use crate::grid::HeightSource;
use rayon::prelude::*;

impl<S: HeightSource + ?Sized> Ground<'_, S> {
    /// [`intersect`](Self::intersect) for each `(from, to)` segment
    pub fn intersect_many(&self, segments: &[(Vec3, Vec3)]) -> Vec<f32> {
        segments
            .par_iter()
            .map(|(from, to)| self.intersect(*from, *to))
            .collect()
    }

    /// [`height_at`](Self::height_at) for each `(x, z)` point
    pub fn heights_at(&self, points: &[(f32, f32)]) -> Vec<f32> {
        points.par_iter().map(|&(x, z)| self.height_at(x, z)).collect()
    }
}
