//! Numerical core of a 2D Material Point Method simulator.
//!
//! Advances a population of Lagrangian material particles through an
//! Eulerian background grid using the Affine Particle-in-Cell (APIC)
//! transfer scheme with cubic/quadratic B-spline interpolation, supporting
//! four constitutive models: weakly-compressible [`particle::Water`], dry
//! granular [`particle::DrySand`] (Drucker-Prager), [`particle::Snow`], and
//! corotated [`particle::Elastic`].
//!
//! Rendering, video encoding, PLY export, windowing, and initial-particle
//! sampling are deliberately out of scope; a collaborator drives the time
//! loop and reads [`solver::Solver::particles`] between steps. See
//! `SPEC_FULL.md` and `DESIGN.md` at the repository root for the full
//! functional design and component grounding.

pub mod algebra;
pub mod config;
pub mod error;
pub mod grid;
pub mod interpolation;
pub mod particle;
pub mod solver;

pub use config::{SimulationConfig, SimulationConfigBuilder};
pub use error::ConfigError;
pub use solver::{DiagnosticsReport, Solver};
