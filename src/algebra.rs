//! 2x2 linear algebra helpers layered on top of `bevy_math`'s `Vec2`/`Mat2`.
//!
//! `glam` (which backs `bevy_math`) has no SVD or polar decomposition, so
//! both are implemented here directly from the closed-form 2x2 case used by
//! the reference solver's hand-rolled `Matrix2f`.

use bevy_math::{Mat2, Vec2};

/// Matrix entries closer than this are treated as equal when deciding
/// whether a 2x2 matrix is already (near-)diagonal.
const MATRIX_EPSILON: f32 = 1e-6;

/// Singular value decomposition `M = U * diag(sigma) * V^T`.
///
/// `U` and `V` are orthogonal, `sigma` is sorted descending and
/// non-negative. Mirrors the closed-form 2x2 case: a fast path for
/// near-diagonal input, and the general eigen-based construction otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Svd2 {
    pub u: Mat2,
    pub sigma: Vec2,
    pub v: Mat2,
}

/// Polar decomposition `M = R * S` with `R` a rotation and `S` symmetric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Polar2 {
    pub r: Mat2,
    pub s: Mat2,
}

/// Extension methods for 2x2 matrices that `glam::Mat2` doesn't provide.
pub trait Mat2Ext {
    fn svd(&self) -> Svd2;
    fn polar_decompose(&self) -> Polar2;
    /// Builds a diagonal matrix from a 2-vector.
    fn diag(v: Vec2) -> Mat2;
    /// Sum of the diagonal entries.
    fn trace(&self) -> f32;
}

impl Mat2Ext for Mat2 {
    fn svd(&self) -> Svd2 {
        let m = self.to_cols_array_2d();
        // bevy_math::Mat2 stores columns, so m[col][row].
        let (m00, m10, m01, m11) = (m[0][0], m[0][1], m[1][0], m[1][1]);

        if m01.abs() < MATRIX_EPSILON && m10.abs() < MATRIX_EPSILON {
            // Already diagonal (up to sign/ordering): read off singular
            // values directly instead of going through the general
            // eigendecomposition, matching the reference fast path.
            let mut sigma = Vec2::new(m00.abs(), m11.abs());
            let mut u = Mat2::from_cols(
                Vec2::new(if m00 < 0.0 { -1.0 } else { 1.0 }, 0.0),
                Vec2::new(0.0, if m11 < 0.0 { -1.0 } else { 1.0 }),
            );
            let mut v = Mat2::IDENTITY;

            if sigma.x < sigma.y {
                sigma = Vec2::new(sigma.y, sigma.x);
                u = Mat2::from_cols(
                    Vec2::new(u.col(1).x, u.col(1).y),
                    Vec2::new(u.col(0).x, u.col(0).y),
                );
                v = Mat2::from_cols(v.col(1), v.col(0));
            }

            return Svd2 { u, sigma, v };
        }

        // General case: eigendecompose M^T * M to get V and sigma^2, then
        // recover U = M * V * diag(1/sigma).
        let mtm = self.transpose().mul_mat2(self);
        let (a, b, c) = (mtm.col(0).x, mtm.col(0).y, mtm.col(1).y);
        // Eigenvalues of the symmetric 2x2 [[a,b],[b,c]].
        let trace = a + c;
        let diff = a - c;
        let disc = (diff * diff + 4.0 * b * b).max(0.0).sqrt();
        let lambda1 = (trace + disc) * 0.5;
        let lambda2 = (trace - disc) * 0.5;

        let eig_vec = |lambda: f32| -> Vec2 {
            if b.abs() > MATRIX_EPSILON {
                Vec2::new(lambda - c, b).normalize_or_zero()
            } else if (a - lambda).abs() < MATRIX_EPSILON {
                Vec2::X
            } else {
                Vec2::Y
            }
        };

        let mut v1 = eig_vec(lambda1);
        let mut v2 = Vec2::new(-v1.y, v1.x);

        let mut sigma1 = lambda1.max(0.0).sqrt();
        let mut sigma2 = lambda2.max(0.0).sqrt();

        if sigma1 < sigma2 {
            std::mem::swap(&mut sigma1, &mut sigma2);
            std::mem::swap(&mut v1, &mut v2);
            v2 = Vec2::new(-v1.y, v1.x);
        }

        let v = Mat2::from_cols(v1, v2);
        let mut u1 = if sigma1 > MATRIX_EPSILON {
            (*self * v1) / sigma1
        } else {
            Vec2::X
        };
        u1 = u1.normalize_or_zero();
        let mut u2 = if sigma2 > MATRIX_EPSILON {
            (*self * v2) / sigma2
        } else {
            Vec2::new(-u1.y, u1.x)
        };
        u2 = u2.normalize_or_zero();

        let u = Mat2::from_cols(u1, u2);

        Svd2 {
            u,
            sigma: Vec2::new(sigma1, sigma2),
            v,
        }
    }

    fn polar_decompose(&self) -> Polar2 {
        let m = self.to_cols_array_2d();
        let (m00, m10, m01, m11) = (m[0][0], m[0][1], m[1][0], m[1][1]);
        let theta = (m10 - m01).atan2(m00 + m11);
        let (sin, cos) = theta.sin_cos();
        let r = Mat2::from_cols(Vec2::new(cos, sin), Vec2::new(-sin, cos));
        let s = r.transpose().mul_mat2(self);
        Polar2 { r, s }
    }

    fn diag(v: Vec2) -> Mat2 {
        Mat2::from_cols(Vec2::new(v.x, 0.0), Vec2::new(0.0, v.y))
    }

    fn trace(&self) -> f32 {
        self.col(0).x + self.col(1).y
    }
}

/// Element-wise natural log of a vector's components.
pub fn vec_ln(v: Vec2) -> Vec2 {
    Vec2::new(v.x.ln(), v.y.ln())
}

/// Element-wise exponential of a vector's components.
pub fn vec_exp(v: Vec2) -> Vec2 {
    Vec2::new(v.x.exp(), v.y.exp())
}

/// Clamps each component of `v` into `[lo, hi]`.
pub fn vec_clamp(v: Vec2, lo: f32, hi: f32) -> Vec2 {
    Vec2::new(v.x.clamp(lo, hi), v.y.clamp(lo, hi))
}
