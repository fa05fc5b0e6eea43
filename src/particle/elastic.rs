//! Neo-Hookean-flavored corotated elasticity with no plastic projection.
//!
//! Shares the stress form with [`super::snow::Snow`] but keeps `lambda`/`mu`
//! fixed per particle and never clamps singular values, so `fp`/`q`-style
//! plastic state has nothing to track.

use std::ops::{Add, Mul};

use bevy_math::Mat2;

use crate::config::ElasticParams;

use super::ConstitutiveModel;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Elastic {
    pub fe: Mat2,
    pub lambda: f32,
    pub mu: f32,
}

impl Elastic {
    pub fn new(params: &ElasticParams) -> Self {
        Elastic {
            fe: Mat2::IDENTITY,
            lambda: params.lambda(),
            mu: params.mu(),
        }
    }
}

impl Default for Elastic {
    fn default() -> Self {
        Elastic::new(&ElasticParams::default())
    }
}

impl ConstitutiveModel for Elastic {
    type Params = ElasticParams;

    fn stress_contribution(&self, volume0: f32, _params: &ElasticParams) -> Mat2 {
        let polar = self.fe.polar_decompose();
        let je = self.fe.determinant();
        let corotated = (self.fe - polar.r).mul_mat2(&self.fe.transpose()) * (2.0 * self.mu);
        let dilational = Mat2::IDENTITY * (self.lambda * (je - 1.0) * je);
        corotated.add(dilational) * volume0
    }

    fn update_deformation(&mut self, t: Mat2, dt: f32, _params: &ElasticParams) {
        self.fe = Mat2::IDENTITY.add(t.mul(dt)).mul_mat2(&self.fe);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use bevy_math::Vec2;

    #[test]
    fn rest_state_has_no_stress() {
        let elastic = Elastic::default();
        let ap = elastic.stress_contribution(1.0, &ElasticParams::default());
        assert_relative_eq!(ap.x_axis.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(ap.y_axis.y, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn update_deformation_has_no_plastic_clamp() {
        let params = ElasticParams::default();
        let mut elastic = Elastic::new(&params);
        // A velocity gradient large enough that Snow's clamp would fire is
        // applied unclamped here: fe tracks it exactly.
        let t = Mat2::from_cols(Vec2::new(5.0, 0.0), Vec2::new(0.0, 0.0));
        elastic.update_deformation(t, 0.1, &params);
        assert_relative_eq!(elastic.fe.x_axis.x, 1.5, epsilon = 1e-5);
    }

    #[test]
    fn stress_scales_with_volume() {
        let params = ElasticParams::default();
        let mut elastic = Elastic::new(&params);
        elastic.fe = Mat2::from_cols(Vec2::new(1.2, 0.0), Vec2::new(0.0, 1.0));
        let ap_small = elastic.stress_contribution(1.0, &params);
        let ap_big = elastic.stress_contribution(2.0, &params);
        assert_relative_eq!(ap_big.x_axis.x, ap_small.x_axis.x * 2.0, epsilon = 1e-4);
    }
}
