//! Ballistic impact prediction
//!
//! Two predictors: a step integrator for projectiles under constant
//! acceleration, and a closed-form parabola sampled once per cell length.
//! Both only look at the part of the path that lies over the map and report
//! [`MISS`] when nothing is hit inside it.

use super::bounds::map_boundary_intersection;
use super::config::TrajectoryHeightMode;
use super::{Ground, MISS};
use crate::core_types::{distance_sq_2d, horizontal, Vec3};
use crate::grid::HeightSource;

impl<S: HeightSource + ?Sized> Ground<'_, S> {
    /// Horizontal distance at which a simulated projectile first touches the terrain.
    ///
    /// The projectile starts at `start` with velocity `dir * speed` and each
    /// step applies `vel += acc; pos += vel`. Only the first `length` units of
    /// the horizontal heading are considered; a hit at or beyond that range,
    /// or one needing more than
    /// [`trajectory_step_limit`](super::QueryConfig::trajectory_step_limit)
    /// steps, is a miss.
    pub fn simulated_impact_distance(&self, start: Vec3, dir: Vec3, acc: Vec3, speed: f32, length: f32) -> f32 {
        self.simulate_impact(start, dir, acc, speed, length).unwrap_or(MISS)
    }

    fn simulate_impact(&self, start: Vec3, dir: Vec3, acc: Vec3, speed: f32, length: f32) -> Option<f32> {
        let heading = horizontal(&dir) * length;
        let ips = map_boundary_intersection(self.dims(), &start, &heading)?;

        let reach = heading.norm();
        let min_dist = reach * ips.enter.max(0.0);
        let max_dist = reach * ips.exit.min(1.0);

        let mut pos = start;
        let mut vel = dir * speed;
        let mut steps = 0;
        let mut advance = |pos: &mut Vec3| {
            if steps >= self.config.trajectory_step_limit {
                return false;
            }
            vel += acc;
            *pos += vel;
            steps += 1;
            true
        };

        // Fly over the off-map part of the path without sampling terrain
        while distance_sq_2d(&pos, &start) < min_dist * min_dist {
            if !advance(&mut pos) {
                return None;
            }
        }

        while pos.y > self.height_at(pos.x, pos.z) {
            if !advance(&mut pos) {
                return None;
            }
        }

        let dist_sq = distance_sq_2d(&pos, &start);
        if dist_sq >= max_dist * max_dist {
            return None;
        }

        Some(dist_sq.sqrt())
    }

    /// Distance along a parabolic path at which it first reaches the terrain.
    ///
    /// The path is `start + dir * d + up * qdr * d^2` with
    /// `dir = (target_dir.x, lin, target_dir.z)`; `target_dir` should be the
    /// unit horizontal heading. Samples are taken every `square_size` units of
    /// `d` over the in-map part of `[0, length]`. The terrain is sampled per
    /// [`QueryConfig::trajectory_height`](super::QueryConfig::trajectory_height).
    pub fn sampled_impact_distance(&self, start: Vec3, target_dir: Vec3, length: f32, lin: f32, qdr: f32) -> f32 {
        self.sample_impact(start, target_dir, length, lin, qdr).unwrap_or(MISS)
    }

    fn sample_impact(&self, start: Vec3, target_dir: Vec3, length: f32, lin: f32, qdr: f32) -> Option<f32> {
        let dir = Vec3::new(target_dir.x, lin, target_dir.z);
        let ips = map_boundary_intersection(self.dims(), &start, &(dir * length))?;

        let min_dist = length * ips.enter.max(0.0);
        let max_dist = length * ips.exit.min(1.0);
        let step = self.dims().square_size();

        for i in 0..self.config.trajectory_step_limit {
            let dist = min_dist + i as f32 * step;
            if dist >= max_dist {
                break;
            }

            let pos = start + dir * dist + Vec3::y() * (qdr * dist * dist);
            let ground = match self.config.trajectory_height {
                TrajectoryHeightMode::Approximate => self.approx_height_at(pos.x, pos.z),
                TrajectoryHeightMode::Exact => self.height_at(pos.x, pos.z),
            };

            if pos.y <= ground {
                return Some(dist);
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{ConstantWaterLevel, GridView, HeightGrid, MapDims};
    use crate::ground::QueryConfig;
    use approx::assert_relative_eq;

    const SEA: ConstantWaterLevel = ConstantWaterLevel(-100.0);

    fn gravity() -> Vec3 {
        Vec3::new(0.0, -1.0, 0.0)
    }

    fn flat_map() -> HeightGrid {
        HeightGrid::flat(MapDims::new(64, 64, 8.0).unwrap(), 0.0).unwrap()
    }

    #[test]
    fn test_simulated_drop_on_flat_ground() {
        let grid = flat_map();
        let ground = Ground::new(&grid, &SEA, GridView::Synced);

        // Falls 55 units in 10 steps while moving 10 per step
        let start = Vec3::new(100.0, 50.0, 100.0);
        let dist = ground.simulated_impact_distance(start, Vec3::x(), gravity(), 10.0, 400.0);
        assert_relative_eq!(dist, 100.0, epsilon = 1e-3);

        // Same impact, but beyond the considered range
        assert_eq!(ground.simulated_impact_distance(start, Vec3::x(), gravity(), 10.0, 50.0), MISS);
    }

    #[test]
    fn test_simulated_start_off_map() {
        let grid = flat_map();
        let ground = Ground::new(&grid, &SEA, GridView::Synced);

        let start = Vec3::new(-50.0, 50.0, 100.0);
        let dist = ground.simulated_impact_distance(start, Vec3::x(), gravity(), 10.0, 400.0);
        assert_relative_eq!(dist, 100.0, epsilon = 1e-3);

        // Heading away from the map
        assert_eq!(ground.simulated_impact_distance(start, -Vec3::x(), gravity(), 10.0, 400.0), MISS);
    }

    #[test]
    fn test_simulated_respects_step_limit() {
        let grid = flat_map();
        let config = QueryConfig {
            trajectory_step_limit: 5,
            ..QueryConfig::default()
        };
        let ground = Ground::new(&grid, &SEA, GridView::Synced).with_config(config);

        let start = Vec3::new(100.0, 50.0, 100.0);
        assert_eq!(ground.simulated_impact_distance(start, Vec3::x(), gravity(), 10.0, 400.0), MISS);

        // Without gravity it would fly forever
        let ground = Ground::new(&grid, &SEA, GridView::Synced);
        assert_eq!(ground.simulated_impact_distance(start, Vec3::x(), Vec3::zeros(), 10.0, 400.0), MISS);
    }

    #[test]
    fn test_sampled_parabola_on_flat_ground() {
        let dims = MapDims::new(16, 16, 8.0).unwrap();
        let grid = HeightGrid::flat(dims, 0.0).unwrap();
        let ground = Ground::new(&grid, &SEA, GridView::Synced);

        // 40 - 0.01 d^2 reaches 0 at d = 63.2, first sample below is d = 64
        let dist = ground.sampled_impact_distance(Vec3::new(0.0, 40.0, 64.0), Vec3::x(), 120.0, 0.0, -0.01);
        assert_eq!(dist, 64.0);

        // Level flight above flat ground never lands
        assert_eq!(ground.sampled_impact_distance(Vec3::new(0.0, 10.0, 64.0), Vec3::x(), 120.0, 0.0, 0.0), MISS);
    }

    #[test]
    fn test_sampled_height_modes() {
        let dims = MapDims::new(16, 16, 8.0).unwrap();
        let grid = HeightGrid::from_fn(dims, |x, _| x * 0.5).unwrap();
        let start = Vec3::new(0.0, 30.0, 4.0);

        // Cell centers sit half a cell ahead of the exact surface
        let approx = Ground::new(&grid, &SEA, GridView::Synced);
        assert_eq!(approx.sampled_impact_distance(start, Vec3::x(), 120.0, 0.0, 0.0), 56.0);

        let config = QueryConfig {
            trajectory_height: TrajectoryHeightMode::Exact,
            ..QueryConfig::default()
        };
        let exact = approx.with_config(config);
        assert_eq!(exact.sampled_impact_distance(start, Vec3::x(), 120.0, 0.0, 0.0), 64.0);
    }

    #[test]
    fn test_sampled_outside_map() {
        let grid = flat_map();
        let ground = Ground::new(&grid, &SEA, GridView::Synced);

        let dist = ground.sampled_impact_distance(Vec3::new(-10.0, 5.0, -10.0), -Vec3::x(), 100.0, -1.0, 0.0);
        assert_eq!(dist, MISS);
    }
}
