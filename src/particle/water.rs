//! Weakly compressible fluid: a Tait-like isotropic equation of state.

use bevy_math::{Mat2, Vec2};

use crate::algebra::Mat2Ext;
use crate::config::WaterParams;

use super::ConstitutiveModel;

/// Deformation state for the water model: a scalar pressure-like stress
/// coefficient and the (scalar) determinant of the deformation gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Water {
    pub ap: f32,
    pub jp: f32,
}

impl Default for Water {
    fn default() -> Self {
        Water { ap: 0.0, jp: 1.0 }
    }
}

impl ConstitutiveModel for Water {
    type Params = WaterParams;

    fn stress_contribution(&self, volume0: f32, params: &WaterParams) -> Mat2 {
        let ap = -params.eos_stiffness * (self.jp.powf(-params.eos_power) - 1.0) * volume0 * self.jp;
        Mat2Ext::diag(Vec2::new(ap, ap))
    }

    fn update_deformation(&mut self, t: Mat2, dt: f32, _params: &WaterParams) {
        self.jp *= 1.0 + dt * t.trace();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rest_state_has_zero_stress() {
        let water = Water::default();
        let params = WaterParams::default();
        let ap = water.stress_contribution(1.0, &params);
        assert_relative_eq!(ap.x_axis.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(ap.y_axis.y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn compression_increases_pressure() {
        let water = Water { ap: 0.0, jp: 0.9 };
        let params = WaterParams::default();
        let ap = water.stress_contribution(1.0, &params);
        // Jp < 1 means the fluid is compressed: Jp^-gamma - 1 > 0, so the
        // leading minus sign makes Ap negative.
        assert!(ap.x_axis.x < 0.0);
    }

    #[test]
    fn update_deformation_tracks_volumetric_strain_rate() {
        let mut water = Water::default();
        let params = WaterParams::default();
        let t = Mat2Ext::diag(Vec2::new(1.0, 1.0));
        water.update_deformation(t, 0.1, &params);
        assert_relative_eq!(water.jp, 1.2, epsilon = 1e-6);
    }
}
