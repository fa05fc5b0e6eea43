//! B-spline interpolation kernels shared by the P2G/G2P transfer stencils.
//!
//! Both cubic (support 2) and quadratic (support 1.5) variants are kept
//! around because `constants.h`'s `INTERPOLATION` switch historically
//! selected either; [`crate::config::Interpolation`] is the runtime
//! equivalent of that compile-time switch.

use bevy_math::Vec2;

/// Cubic B-spline, support `[-2, 2]`.
pub fn cubic_bspline(x: f32) -> f32 {
    let x = x.abs();
    if x < 1.0 {
        x * x * x / 2.0 - x * x + 2.0 / 3.0
    } else if x < 2.0 {
        let t = 2.0 - x;
        t * t * t / 6.0
    } else {
        0.0
    }
}

/// Derivative of [`cubic_bspline`].
pub fn cubic_dbspline(x: f32) -> f32 {
    let abs_x = x.abs();
    if abs_x < 1.0 {
        1.5 * x * abs_x - 2.0 * x
    } else if abs_x < 2.0 {
        -x * abs_x / 2.0 + 2.0 * x - 2.0 * x / abs_x
    } else {
        0.0
    }
}

/// Quadratic B-spline, support `[-1.5, 1.5]`.
pub fn quadratic_bspline(x: f32) -> f32 {
    let x = x.abs();
    if x < 0.5 {
        0.75 - x * x
    } else if x < 1.5 {
        let t = 1.5 - x;
        0.5 * t * t
    } else {
        0.0
    }
}

/// Derivative of [`quadratic_bspline`].
pub fn quadratic_dbspline(x: f32) -> f32 {
    let abs_x = x.abs();
    if abs_x < 0.5 {
        -2.0 * x
    } else if abs_x < 1.5 {
        let t = 1.5 - abs_x;
        -t * x.signum()
    } else {
        0.0
    }
}

/// A pair of scalar kernel functions (weight, derivative) selected for one
/// axis at runtime, matching [`crate::config::Interpolation`].
#[derive(Debug, Clone, Copy)]
pub struct Kernel {
    weight: fn(f32) -> f32,
    derivative: fn(f32) -> f32,
}

impl Kernel {
    pub fn cubic() -> Self {
        Kernel {
            weight: cubic_bspline,
            derivative: cubic_dbspline,
        }
    }

    pub fn quadratic() -> Self {
        Kernel {
            weight: quadratic_bspline,
            derivative: quadratic_dbspline,
        }
    }

    pub fn from_interpolation(interpolation: crate::config::Interpolation) -> Self {
        match interpolation {
            crate::config::Interpolation::Cubic => Self::cubic(),
            crate::config::Interpolation::Quadratic => Self::quadratic(),
        }
    }

    /// Tensor-product 2D weight `W(dist) = B(dist.x) * B(dist.y)`.
    pub fn weight(&self, dist: Vec2) -> f32 {
        (self.weight)(dist.x) * (self.weight)(dist.y)
    }

    /// Gradient of the tensor-product weight with respect to `dist`.
    pub fn gradient(&self, dist: Vec2) -> Vec2 {
        Vec2::new(
            (self.derivative)(dist.x) * (self.weight)(dist.y),
            (self.weight)(dist.x) * (self.derivative)(dist.y),
        )
    }
}
