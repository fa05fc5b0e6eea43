//! Errors surfaced while building a [`crate::config::SimulationConfig`].
//!
//! The solver's step loop is compute-only and never returns a `Result`;
//! everything that can go wrong is rejected up front, at configuration time.

use thiserror::Error;

/// Reasons a [`crate::config::SimulationConfigBuilder`] can fail to produce
/// a usable [`crate::config::SimulationConfig`].
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("grid dimensions {x_grid}x{y_grid} are too small for a wall inset of {cub} cells plus the interpolation half-support of {half_support}")]
    GridTooSmall {
        x_grid: u32,
        y_grid: u32,
        cub: f32,
        half_support: f32,
    },

    #[error("time step dt must be positive, got {dt}")]
    NonPositiveTimeStep { dt: f32 },

    #[error("inverse cell size h_inv must be positive, got {h_inv}")]
    NonPositiveCellSize { h_inv: f32 },

    #[error("wall inset cub ({cub}) must be at least the interpolation half-support ({half_support})")]
    InsetTooSmall { cub: f32, half_support: f32 },

    #[error("builder is missing required field: {0}")]
    MissingField(String),
}

impl From<derive_builder::UninitializedFieldError> for ConfigError {
    fn from(err: derive_builder::UninitializedFieldError) -> Self {
        ConfigError::MissingField(err.field_name().to_string())
    }
}
