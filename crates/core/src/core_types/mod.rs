//! Core types and utilities

pub mod vec3;

pub use vec3::{distance_sq_2d, horizontal, is_finite, Vec3};
