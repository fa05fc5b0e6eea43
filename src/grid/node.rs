//! Background grid nodes: mass/momentum accumulation and boundary response.

use bevy_math::Vec2;

use super::border::Border;

/// One node of the regular `(x_grid+1) x (y_grid+1)` background lattice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    /// Fixed lattice position; never mutated after construction.
    pub position: Vec2,
    pub mass: f32,
    /// Momentum during P2G accumulation, velocity after `integrate()`.
    pub velocity: Vec2,
    /// Force accumulator; holds `sum(Ap * grad_w)` during P2G.
    pub force: Vec2,
    pub velocity_after_collision: Vec2,
    pub velocity_after_friction: Vec2,
    /// Indices into the solver's border list this node collided with this
    /// step.
    pub collisions: Vec<usize>,
}

impl Node {
    pub fn new(position: Vec2) -> Self {
        Node {
            position,
            mass: 0.0,
            velocity: Vec2::ZERO,
            force: Vec2::ZERO,
            velocity_after_collision: Vec2::ZERO,
            velocity_after_friction: Vec2::ZERO,
            collisions: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.mass > 0.0
    }

    /// Converts accumulated momentum/force into velocity, applies gravity,
    /// then resolves collisions and (optionally) friction against `borders`.
    pub fn integrate(
        &mut self,
        borders: &[Border],
        dt: f32,
        gravity: Vec2,
        friction_enabled: bool,
        friction_coefficient: f32,
    ) {
        debug_assert!(self.is_active());

        let pre_collision_velocity = self.velocity / self.mass;
        self.force = dt * (-self.force / self.mass + gravity);
        self.velocity = pre_collision_velocity + self.force;

        self.collisions.clear();
        self.velocity_after_collision = self.velocity;
        for (index, border) in borders.iter().enumerate() {
            if border.resolve_collision(self.position, &mut self.velocity_after_collision, dt) {
                self.collisions.push(index);
            }
        }

        if friction_enabled {
            self.velocity_after_friction = self.velocity_after_collision;
            for &index in &self.collisions {
                borders[index].apply_friction(
                    &mut self.velocity_after_friction,
                    self.velocity_after_collision,
                    self.velocity,
                    friction_coefficient,
                );
            }
        } else {
            self.velocity_after_friction = self.velocity_after_collision;
        }
    }

    /// Clears all per-step accumulators. Called only on active nodes.
    pub fn reset(&mut self) {
        self.mass = 0.0;
        self.velocity = Vec2::ZERO;
        self.force = Vec2::ZERO;
        self.collisions.clear();
    }
}
