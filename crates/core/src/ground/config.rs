//! Tunables for the query engine

use serde::{Deserialize, Serialize};

/// Terrain height used when sampling analytic trajectories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrajectoryHeightMode {
    /// Per-cell center height, one lookup per sample
    #[default]
    Approximate,
    /// Interpolated triangle surface
    Exact,
}

/// Query behaviour shared by every operation on a [`Ground`](super::Ground) handle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Treat segments that start underground as an immediate hit in unsynced
    /// queries too. Synced queries always do.
    pub unsynced_underground_check: bool,

    /// Height lookup used by [`Ground::sampled_impact_distance`](super::Ground::sampled_impact_distance)
    pub trajectory_height: TrajectoryHeightMode,

    /// Maximum integration or sampling steps a trajectory probe may take
    /// before it reports a miss
    pub trajectory_step_limit: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            unsynced_underground_check: false,
            trajectory_height: TrajectoryHeightMode::Approximate,
            trajectory_step_limit: 1 << 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let cfg: QueryConfig = serde_json::from_str(r#"{ "trajectory_height": "Exact" }"#).unwrap();

        assert_eq!(cfg.trajectory_height, TrajectoryHeightMode::Exact);
        assert!(!cfg.unsynced_underground_check);
        assert_eq!(cfg.trajectory_step_limit, QueryConfig::default().trajectory_step_limit);
    }
}
