//! Snow: fixed-threshold clamp plasticity over corotated elasticity, with
//! Lame-parameter hardening driven by accumulated plastic compression.

use std::ops::{Add, Mul};

use bevy_math::{Mat2, Vec2};

use crate::algebra::{vec_clamp, Mat2Ext};
use crate::config::SnowParams;

use super::ConstitutiveModel;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snow {
    pub fe: Mat2,
    pub fp: Mat2,
    pub je: f32,
    pub jp: f32,
    /// Current (hardened) Lame parameters; start at `params.lambda()/mu()`
    /// and decay/grow as `jp` moves away from 1.
    pub lambda: f32,
    pub mu: f32,
}

impl Snow {
    pub fn new(params: &SnowParams) -> Self {
        Snow {
            fe: Mat2::IDENTITY,
            fp: Mat2::IDENTITY,
            je: 1.0,
            jp: 1.0,
            lambda: params.lambda(),
            mu: params.mu(),
        }
    }
}

impl Default for Snow {
    fn default() -> Self {
        Snow::new(&SnowParams::default())
    }
}

impl ConstitutiveModel for Snow {
    type Params = SnowParams;

    fn stress_contribution(&self, volume0: f32, _params: &SnowParams) -> Mat2 {
        let polar = self.fe.polar_decompose();
        let je = self.fe.determinant();
        let corotated = (self.fe - polar.r).mul_mat2(&self.fe.transpose()) * (2.0 * self.mu);
        let dilational = Mat2::IDENTITY * (self.lambda * (je - 1.0) * je);
        corotated.add(dilational) * volume0
    }

    fn update_deformation(&mut self, t: Mat2, dt: f32, params: &SnowParams) {
        let fe_tr = Mat2::IDENTITY.add(t.mul(dt)).mul_mat2(&self.fe);
        let fp_tr = self.fp;

        let svd = fe_tr.svd();
        let t_proj = vec_clamp(svd.sigma, 1.0 - params.theta_c, 1.0 + params.theta_s);

        self.fe = svd.u.mul_mat2(&Mat2Ext::diag(t_proj)).mul_mat2(&svd.v.transpose());
        let ratio = Vec2::new(svd.sigma.x / t_proj.x, svd.sigma.y / t_proj.y);
        self.fp = svd
            .v
            .mul_mat2(&Mat2Ext::diag(ratio))
            .mul_mat2(&svd.v.transpose())
            .mul_mat2(&fp_tr);

        self.je = self.fe.determinant();
        self.jp = self.fp.determinant();

        let hardening = (params.hardening * (1.0 - self.jp)).exp();
        self.lambda = params.lambda() * hardening;
        self.mu = params.mu() * hardening;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rest_state_has_no_stress() {
        let snow = Snow::new(&SnowParams::default());
        let ap = snow.stress_contribution(1.0, &SnowParams::default());
        assert_relative_eq!(ap.x_axis.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(ap.y_axis.y, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn update_deformation_clamps_singular_values() {
        let params = SnowParams::default();
        let mut snow = Snow::new(&params);
        snow.fe = Mat2::from_cols(Vec2::new(1.1, 0.0), Vec2::new(0.0, 0.9));
        snow.update_deformation(Mat2::ZERO, 0.001, &params);
        let svd = snow.fe.svd();
        assert_relative_eq!(svd.sigma.x, 1.0 + params.theta_s, epsilon = 1e-4);
        assert_relative_eq!(svd.sigma.y, 1.0 - params.theta_c, epsilon = 1e-4);
    }

    #[test]
    fn hardening_increases_stiffness_under_compaction() {
        let params = SnowParams::default();
        let mut snow = Snow::new(&params);
        snow.jp = 0.9; // compacted: jp < 1
        let hardening = (params.hardening * (1.0 - snow.jp)).exp();
        assert!(hardening > 1.0);
    }
}
