//! Material particles and the constitutive models they carry.

pub mod dry_sand;
pub mod elastic;
pub mod snow;
pub mod water;

pub use dry_sand::DrySand;
pub use elastic::Elastic;
pub use snow::Snow;
pub use water::Water;

use bevy_math::{Mat2, Vec2};

/// Behavior a constitutive model must provide so a generic
/// [`crate::solver::Solver`] can transfer stress to the grid and advance
/// deformation each step.
///
/// The reference implementation picks one material at compile time via a
/// preprocessor macro; this trait plus `Solver<M>` is the same
/// "homogeneous population, statically chosen material" shape expressed as
/// a Rust generic (see Design Notes).
pub trait ConstitutiveModel: Clone {
    /// Per-simulation physical constants this model needs (shared across
    /// all particles of this material).
    type Params;

    /// Computes `Ap`, the matrix such that a particle's force contribution
    /// to a node is `Ap * grad_w`. Returned as a full `Mat2` even for
    /// isotropic stresses (an `Ap * I` diagonal) so `Solver::p2g` can treat
    /// every material uniformly.
    fn stress_contribution(&self, volume0: f32, params: &Self::Params) -> Mat2;

    /// Advances this particle's deformation state given the accumulated
    /// nodal velocity gradient `t = sum(v_i_col * grad_w_ip^T)`.
    fn update_deformation(&mut self, t: Mat2, dt: f32, params: &Self::Params);
}

/// State shared by every material: kinematics plus the APIC affine field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle<M> {
    pub volume0: f32,
    pub mass: f32,
    pub position: Vec2,
    pub velocity: Vec2,
    /// APIC affine velocity field about `position`.
    pub affine: Mat2,
    pub model: M,
}

impl<M: ConstitutiveModel> Particle<M> {
    pub fn new(volume0: f32, mass: f32, position: Vec2, velocity: Vec2, model: M) -> Self {
        Particle {
            volume0,
            mass,
            position,
            velocity,
            affine: Mat2::ZERO,
            model,
        }
    }

    pub fn stress_contribution(&self, params: &M::Params) -> Mat2 {
        self.model.stress_contribution(self.volume0, params)
    }

    pub fn update_deformation(&mut self, t: Mat2, dt: f32, params: &M::Params) {
        self.model.update_deformation(t, dt, params);
    }
}
