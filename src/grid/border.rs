//! Domain boundaries: wall type, collision response, and Coulomb friction.

use bevy_math::Vec2;

/// Tangential-velocity magnitude below which friction is not applied,
/// matching the reference's `1e-7` threshold.
const FRICTION_EPSILON: f32 = 1e-7;

/// How a wall reacts when a node crosses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderKind {
    /// Velocity is zeroed whenever the node is on the wrong side.
    Sticky,
    /// Velocity is corrected only enough to prevent crossing the wall
    /// within the next tick; a node already behind the wall is left alone.
    Separating,
    /// Like `Separating`, but velocity is corrected whenever the node is
    /// behind the wall, not just when it's about to cross it.
    Sliding,
}

/// A straight boundary segment of the simulation domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Border {
    pub kind: BorderKind,
    /// Unit, outward-facing normal.
    pub normal: Vec2,
    /// A point on the boundary line.
    pub corner: Vec2,
}

impl Border {
    pub fn new(kind: BorderKind, normal: Vec2, corner: Vec2) -> Self {
        debug_assert!(
            (normal.length() - 1.0).abs() < 1e-4,
            "border normal must be unit length"
        );
        Border {
            kind,
            normal,
            corner,
        }
    }

    /// The four domain walls, inset by `cub` cells from the grid edges,
    /// with inward-facing normals. Mirrors `Border::InitializeBorders()`.
    pub fn domain_walls(x_grid: f32, y_grid: f32, cub: f32, kind: BorderKind) -> Vec<Border> {
        vec![
            Border::new(kind, Vec2::new(1.0, 0.0), Vec2::new(cub, 0.0)),
            Border::new(kind, Vec2::new(-1.0, 0.0), Vec2::new(x_grid - cub, 0.0)),
            Border::new(kind, Vec2::new(0.0, 1.0), Vec2::new(0.0, cub)),
            Border::new(kind, Vec2::new(0.0, -1.0), Vec2::new(0.0, y_grid - cub)),
        ]
    }

    fn signed_distance(&self, position: Vec2) -> f32 {
        self.normal.dot(position - self.corner)
    }

    /// Applies this wall's collision rule to a node's velocity in place.
    /// Returns `true` if the node should be recorded as colliding with this
    /// wall (required before [`Border::apply_friction`] acts on it).
    pub fn resolve_collision(&self, position: Vec2, velocity: &mut Vec2, dt: f32) -> bool {
        let distance = self.signed_distance(position);

        match self.kind {
            BorderKind::Sticky => {
                if distance < 0.0 {
                    *velocity = Vec2::ZERO;
                }
                false
            }
            BorderKind::Separating => {
                let predicted = position + dt * *velocity;
                let predicted_distance = self.signed_distance(predicted);
                let delta = predicted_distance - distance.min(0.0);
                if delta < 0.0 {
                    *velocity -= (delta / dt) * self.normal;
                    true
                } else {
                    false
                }
            }
            BorderKind::Sliding => {
                if distance < 0.0 {
                    let predicted = position + dt * *velocity;
                    let predicted_distance = self.signed_distance(predicted);
                    let delta = predicted_distance - distance.min(0.0);
                    *velocity -= (delta / dt) * self.normal;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Applies Coulomb friction to `v_fri` in place, given the velocity
    /// right after collision resolution (`v_col`) and the velocity before
    /// collision resolution (`v_pre_collision`).
    pub fn apply_friction(
        &self,
        v_fri: &mut Vec2,
        v_col: Vec2,
        v_pre_collision: Vec2,
        friction_coefficient: f32,
    ) {
        let normal_component = self.normal.dot(*v_fri);
        let tangential = v_col - self.normal * normal_component;
        let tangential_speed = tangential.length();

        if tangential_speed > FRICTION_EPSILON {
            let tangent = tangential / tangential_speed;
            let max_reduction = friction_coefficient * (v_col - v_pre_collision).length();
            let reduction = tangential_speed.min(max_reduction);
            *v_fri -= reduction * tangent;
        }
    }
}
