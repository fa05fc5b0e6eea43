//! Dry granular material: Drucker-Prager plasticity with friction-angle
//! hardening over a StVK-Hencky elastic response.

use std::ops::{Add, Mul};

use bevy_math::{Mat2, Vec2};

use crate::algebra::{vec_ln, Mat2Ext};
use crate::config::DrySandParams;

use super::ConstitutiveModel;

/// Singular values whose deviatoric log-strain norm falls below this are
/// treated as already at the cone tip.
const DEVIATORIC_EPSILON: f32 = 1e-8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrySand {
    pub fe: Mat2,
    pub fp: Mat2,
    /// Accumulated hardening parameter.
    pub q: f32,
    /// Friction-angle-derived cone slope, carried from the previous step's
    /// hardening update and consumed by this step's plastic projection.
    pub alpha: f32,
}

impl DrySand {
    /// Builds the rest state for a given hardening law, computing the
    /// initial `alpha` from `q = 0` the same way `UpdateDeformation` would.
    pub fn new(params: &DrySandParams) -> Self {
        let mut sand = DrySand {
            fe: Mat2::IDENTITY,
            fp: Mat2::IDENTITY,
            q: 0.0,
            alpha: 0.0,
        };
        sand.alpha = sand.harden(params);
        sand
    }

    fn harden(&self, params: &DrySandParams) -> f32 {
        let phi = params.h0 + (params.h1 * self.q - params.h3) * (-params.h2 * self.q).exp();
        (2.0 / 3.0_f32).sqrt() * 2.0 * phi.sin() / (3.0 - phi.sin())
    }
}

impl Default for DrySand {
    fn default() -> Self {
        DrySand::new(&DrySandParams::default())
    }
}

impl ConstitutiveModel for DrySand {
    type Params = DrySandParams;

    fn stress_contribution(&self, volume0: f32, params: &DrySandParams) -> Mat2 {
        let svd = self.fe.svd();
        let ln_sigma = vec_ln(svd.sigma);
        let sigma_inv = Vec2::new(1.0 / svd.sigma.x, 1.0 / svd.sigma.y);
        let lambda = params.lambda();
        let mu = params.mu();
        let sum_ln = ln_sigma.x + ln_sigma.y;
        let d_fe = (sigma_inv * ln_sigma) * (2.0 * mu) + sigma_inv * (lambda * sum_ln);

        let scaled = svd.u.mul_mat2(&Mat2Ext::diag(d_fe)).mul_mat2(&svd.v.transpose());
        scaled.mul_mat2(&self.fe.transpose()) * volume0
    }

    fn update_deformation(&mut self, t: Mat2, dt: f32, params: &DrySandParams) {
        let fe_tr = Mat2::IDENTITY.add(t.mul(dt)).mul_mat2(&self.fe);
        let fp_tr = self.fp;

        let svd = fe_tr.svd();
        let e = vec_ln(svd.sigma);
        let sum_e = e.x + e.y;
        let e_c = e - Vec2::ONE * (0.5 * sum_e);
        let ec_norm = e_c.length();

        let lambda = params.lambda();
        let mu = params.mu();

        let (t_proj, delta_q) = if ec_norm < DEVIATORIC_EPSILON || sum_e > 0.0 {
            (Vec2::ONE, e.length())
        } else {
            let delta_gamma = ec_norm + ((lambda + mu) / mu) * sum_e * self.alpha;
            if delta_gamma <= 0.0 {
                (svd.sigma, 0.0)
            } else {
                let h = e - (e_c / ec_norm) * delta_gamma;
                (crate::algebra::vec_exp(h), delta_gamma)
            }
        };

        self.fe = svd.u.mul_mat2(&Mat2Ext::diag(t_proj)).mul_mat2(&svd.v.transpose());
        let ratio = Vec2::new(svd.sigma.x / t_proj.x, svd.sigma.y / t_proj.y);
        self.fp = svd
            .v
            .mul_mat2(&Mat2Ext::diag(ratio))
            .mul_mat2(&svd.v.transpose())
            .mul_mat2(&fp_tr);

        self.q += delta_q;
        self.alpha = self.harden(params);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rest_state_has_no_stress() {
        let sand = DrySand::default();
        let params = DrySandParams::default();
        let ap = sand.stress_contribution(1.0, &params);
        assert_relative_eq!(ap.x_axis.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(ap.y_axis.y, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn heavy_isotropic_compression_projects_to_cone_tip() {
        // Fe with both singular values 0.5: deviatoric part is zero, so the
        // cone-tip branch must fire regardless of the sum(e) sign.
        let params = DrySandParams::default();
        let mut sand = DrySand::new(&params);
        sand.fe = Mat2::from_cols(Vec2::new(0.5, 0.0), Vec2::new(0.0, 0.5));
        let t = Mat2::ZERO;
        sand.update_deformation(t, 0.001, &params);

        let svd = sand.fe.svd();
        assert_relative_eq!(svd.sigma.x, 1.0, epsilon = 1e-3);
        assert_relative_eq!(svd.sigma.y, 1.0, epsilon = 1e-3);
        let expected_delta_q = 2.0_f32.sqrt() * 0.5_f32.ln().abs();
        assert_relative_eq!(sand.q, expected_delta_q, epsilon = 1e-3);
    }
}
