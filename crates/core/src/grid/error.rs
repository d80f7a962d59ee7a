//! Errors raised while building height grids.

use std::fmt;

/// Reasons a height grid (or its dimensions) could not be built.
///
/// Only construction is fallible. Queries over a built grid degrade to
/// sentinel distances instead of returning errors.
#[derive(Debug, Clone, PartialEq)]
pub enum GridError {
    /// The map must be at least one cell wide in each direction and its
    /// corner buffer must be addressable.
    InvalidDimensions { map_x: usize, map_z: usize },
    /// Square size must be finite and positive.
    InvalidSquareSize(f32),
    /// Sample buffer length does not match the expected corner count.
    SampleCountMismatch { expected: usize, actual: usize },
    /// A height sample was NaN or infinite.
    NonFiniteHeight { index: usize },
    /// Synced and unsynced grids must share the same dimensions.
    DimensionMismatch,
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::InvalidDimensions { map_x, map_z } => {
                write!(f, "map must be at least 1x1 cells with an addressable corner buffer, got {map_x}x{map_z}")
            }
            GridError::InvalidSquareSize(size) => {
                write!(f, "square size must be finite and positive, got {size}")
            }
            GridError::SampleCountMismatch { expected, actual } => {
                write!(f, "expected {expected} corner samples, got {actual}")
            }
            GridError::NonFiniteHeight { index } => {
                write!(f, "height sample {index} is not finite")
            }
            GridError::DimensionMismatch => {
                write!(f, "synced and unsynced grids have different dimensions")
            }
        }
    }
}

impl std::error::Error for GridError {}
