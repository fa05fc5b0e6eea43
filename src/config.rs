//! Simulation configuration: grid sizing, time stepping, interpolation
//! variant, and per-material physical constants.
//!
//! Replaces the reference implementation's compile-time constants
//! (`constants.h`) with an explicit, validated value passed into the
//! solver, per the Design Notes' "no global state" guidance.

use bevy_math::Vec2;
use derive_builder::Builder;

use crate::error::ConfigError;

/// Which B-spline kernel the grid transfer stencils use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    #[default]
    Cubic,
    Quadratic,
}

impl Interpolation {
    /// Kernel half-support, in cells.
    pub fn support(self) -> f32 {
        match self {
            Interpolation::Cubic => 2.0,
            Interpolation::Quadratic => 1.5,
        }
    }

    /// Lower corner of the stencil offset relative to the base node.
    pub fn stencil_lo(self) -> i32 {
        match self {
            Interpolation::Cubic => -1,
            Interpolation::Quadratic => 0,
        }
    }

    /// Upper (exclusive) bound of the stencil offset.
    pub fn stencil_hi(self) -> i32 {
        3
    }

    /// APIC inverse-D scalar such that `D^-1 = d_scal * h_inv^2`.
    pub fn d_scal(self) -> f32 {
        match self {
            Interpolation::Cubic => 3.0,
            Interpolation::Quadratic => 4.0,
        }
    }

    /// Offset applied to particle coordinates before locating the base node.
    pub fn translation(self) -> Vec2 {
        match self {
            Interpolation::Cubic => Vec2::ZERO,
            Interpolation::Quadratic => Vec2::new(0.5, 0.5),
        }
    }
}

/// Which constitutive model a [`crate::solver::Solver`] is instantiated
/// over. The solver itself is generic over a single
/// [`crate::particle::ConstitutiveModel`] impl chosen at construction time,
/// matching the reference's single-material-per-build design (Design
/// Notes); this enum exists only so configuration/setup code can name that
/// choice before picking the concrete type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaterialKind {
    #[default]
    Water,
    DrySand,
    Snow,
    Elastic,
}

/// Physical constants for the weakly-compressible fluid model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterParams {
    pub rest_density: f32,
    pub eos_stiffness: f32,
    pub eos_power: f32,
}

impl Default for WaterParams {
    fn default() -> Self {
        WaterParams {
            rest_density: 1.0,
            eos_stiffness: 50.0,
            eos_power: 3.0,
        }
    }
}

/// Physical constants for the dry granular (Drucker-Prager) model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrySandParams {
    pub rest_density: f32,
    pub youngs_modulus: f32,
    pub poisson_ratio: f32,
    /// Hardening friction-angle parameters (radians), see `h0..h3`.
    pub h0: f32,
    pub h1: f32,
    pub h2: f32,
    pub h3: f32,
}

impl DrySandParams {
    pub fn lambda(&self) -> f32 {
        self.youngs_modulus * self.poisson_ratio
            / ((1.0 + self.poisson_ratio) * (1.0 - 2.0 * self.poisson_ratio))
    }

    pub fn mu(&self) -> f32 {
        self.youngs_modulus / (2.0 * (1.0 + self.poisson_ratio))
    }
}

impl Default for DrySandParams {
    fn default() -> Self {
        DrySandParams {
            rest_density: 1600.0,
            youngs_modulus: 3.537e5,
            poisson_ratio: 0.3,
            h0: 35.0_f32.to_radians(),
            h1: 9.0_f32.to_radians(),
            h2: 0.2,
            h3: 10.0_f32.to_radians(),
        }
    }
}

/// Physical constants for the snow model (fixed-threshold plasticity with
/// exponential Lame-parameter hardening).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnowParams {
    pub rest_density: f32,
    pub youngs_modulus: f32,
    pub poisson_ratio: f32,
    pub theta_c: f32,
    pub theta_s: f32,
    pub hardening: f32,
}

impl SnowParams {
    pub fn lambda(&self) -> f32 {
        self.youngs_modulus * self.poisson_ratio
            / ((1.0 + self.poisson_ratio) * (1.0 - 2.0 * self.poisson_ratio))
    }

    pub fn mu(&self) -> f32 {
        self.youngs_modulus / (2.0 * (1.0 + self.poisson_ratio))
    }
}

impl Default for SnowParams {
    fn default() -> Self {
        SnowParams {
            rest_density: 4e2,
            youngs_modulus: 1.4e5,
            poisson_ratio: 0.2,
            theta_c: 2e-2,
            theta_s: 6e-3,
            hardening: 10.0,
        }
    }
}

/// Physical constants for the purely elastic (neo-Hookean-flavored,
/// corotated) model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElasticParams {
    pub rest_density: f32,
    pub youngs_modulus: f32,
    pub poisson_ratio: f32,
}

impl ElasticParams {
    pub fn lambda(&self) -> f32 {
        self.youngs_modulus * self.poisson_ratio
            / ((1.0 + self.poisson_ratio) * (1.0 - 2.0 * self.poisson_ratio))
    }

    pub fn mu(&self) -> f32 {
        self.youngs_modulus / (2.0 * (1.0 + self.poisson_ratio))
    }
}

impl Default for ElasticParams {
    fn default() -> Self {
        ElasticParams {
            rest_density: 1000.0,
            youngs_modulus: 5e4,
            poisson_ratio: 0.3,
        }
    }
}

/// Validated simulation configuration. Build via [`SimulationConfigBuilder`].
#[derive(Debug, Clone, Builder, PartialEq)]
#[builder(build_fn(validate = "Self::validate", error = "ConfigError"))]
pub struct SimulationConfig {
    #[builder(default = "128")]
    pub x_grid: u32,
    #[builder(default = "32")]
    pub y_grid: u32,
    #[builder(default = "1.0")]
    pub h_inv: f32,
    #[builder(default = "0.001")]
    pub dt: f32,
    #[builder(default)]
    pub interpolation: Interpolation,
    #[builder(default)]
    pub material: MaterialKind,
    #[builder(default = "false")]
    pub friction: bool,
    #[builder(default = "0.3")]
    pub friction_coefficient: f32,
    #[builder(default = "Vec2::new(0.0, -9.81)")]
    pub gravity: Vec2,
    /// Inset, in cells, of the four domain walls from the grid edges.
    #[builder(default = "3.0")]
    pub cub: f32,
    /// Ticks between particle-injection batches (material-dependent; see
    /// `Solver::inject`).
    #[builder(default = "30")]
    pub injection_period: u32,
    #[builder(default)]
    pub water: WaterParams,
    #[builder(default)]
    pub dry_sand: DrySandParams,
    #[builder(default)]
    pub snow: SnowParams,
    #[builder(default)]
    pub elastic: ElasticParams,
}

impl SimulationConfigBuilder {
    fn validate(&self) -> Result<(), ConfigError> {
        let dt = self.dt.unwrap_or(0.001);
        if dt <= 0.0 {
            return Err(ConfigError::NonPositiveTimeStep { dt });
        }

        let h_inv = self.h_inv.unwrap_or(1.0);
        if h_inv <= 0.0 {
            return Err(ConfigError::NonPositiveCellSize { h_inv });
        }

        let interpolation = self.interpolation.unwrap_or_default();
        let half_support = interpolation.support();
        let cub = self.cub.unwrap_or(3.0);
        if cub < half_support {
            return Err(ConfigError::InsetTooSmall { cub, half_support });
        }

        let x_grid = self.x_grid.unwrap_or(128);
        let y_grid = self.y_grid.unwrap_or(32);
        let min_extent = (2.0 * cub + half_support).ceil() as u32;
        if x_grid < min_extent || y_grid < min_extent {
            return Err(ConfigError::GridTooSmall {
                x_grid,
                y_grid,
                cub,
                half_support,
            });
        }

        Ok(())
    }
}

impl SimulationConfig {
    /// Number of nodes along one grid axis, including both endpoints.
    pub fn nodes_per_row(&self) -> u32 {
        self.x_grid + 1
    }

    pub fn node_count(&self) -> usize {
        (self.x_grid as usize + 1) * (self.y_grid as usize + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build_successfully() {
        let cfg = SimulationConfigBuilder::default().build().unwrap();
        assert_eq!(cfg.x_grid, 128);
        assert_eq!(cfg.material, MaterialKind::Water);
    }

    #[test]
    fn rejects_non_positive_dt() {
        let err = SimulationConfigBuilder::default()
            .dt(0.0)
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::NonPositiveTimeStep { dt: 0.0 });
    }

    #[test]
    fn rejects_inset_smaller_than_support() {
        let err = SimulationConfigBuilder::default()
            .cub(1.0)
            .interpolation(Interpolation::Cubic)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InsetTooSmall {
                cub: 1.0,
                half_support: 2.0
            }
        );
    }

    #[test]
    fn rejects_grid_too_small_for_inset() {
        let err = SimulationConfigBuilder::default()
            .x_grid(4)
            .y_grid(4)
            .cub(3.0)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::GridTooSmall { .. }));
    }
}
