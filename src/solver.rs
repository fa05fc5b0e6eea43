//! Orchestrates the per-step transfer pipeline
//! `P2G -> UpdateNodes -> G2P -> UpdateParticles -> ResetGrid` and owns the
//! borders, nodes, and particle population for one material.
//!
//! `Solver<M>` is generic over a single [`ConstitutiveModel`] impl, the same
//! "homogeneous population, statically chosen material" shape the reference
//! implementation gets from picking one material at compile time via a
//! preprocessor macro (see Design Notes).

use bevy_math::{Mat2, Vec2};
use tracing::{debug, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::SimulationConfig;
use crate::grid::{build_grid, node_index, Border, Node};
use crate::interpolation::Kernel;
use crate::particle::{ConstitutiveModel, Particle, Water};

/// Per-node accumulator filled during P2G, either directly (sequential path)
/// or per-thread then reduced (parallel path; see [`Solver::p2g`]).
#[derive(Debug, Clone, Copy, Default)]
struct NodeDelta {
    mass: f32,
    velocity: Vec2,
    force: Vec2,
}

impl std::ops::AddAssign for NodeDelta {
    fn add_assign(&mut self, other: Self) {
        self.mass += other.mass;
        self.velocity += other.velocity;
        self.force += other.force;
    }
}

/// A single particle's stencil contribution to one node: its flat node
/// index plus the interpolation weight, gradient, and signed distance used
/// by every phase that touches that node.
struct StencilPoint {
    node: usize,
    dist: Vec2,
    weight: f32,
    grad: Vec2,
}

/// Report produced by [`Solver::diagnose`]: indices of particles whose
/// position, velocity, or affine field contains a non-finite component.
/// Never consulted automatically by `step()` (see spec §7); purely an
/// opt-in diagnostic a collaborator may call between steps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticsReport {
    pub non_finite_particles: Vec<usize>,
}

impl DiagnosticsReport {
    pub fn is_clean(&self) -> bool {
        self.non_finite_particles.is_empty()
    }
}

pub struct Solver<M: ConstitutiveModel> {
    config: SimulationConfig,
    params: M::Params,
    kernel: Kernel,
    nodes: Vec<Node>,
    borders: Vec<Border>,
    particles: Vec<Particle<M>>,
}

impl<M: ConstitutiveModel + Send + Sync> Solver<M>
where
    M::Params: Sync,
{
    pub fn new(config: SimulationConfig, params: M::Params) -> Self {
        let (nodes, borders) = build_grid(&config);
        let kernel = Kernel::from_interpolation(config.interpolation);
        Solver {
            config,
            params,
            kernel,
            nodes,
            borders,
            particles: Vec::new(),
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn particles(&self) -> &[Particle<M>] {
        &self.particles
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn add_particle(&mut self, particle: Particle<M>) {
        self.particles.push(particle);
    }

    /// Particle-to-grid transfer: deposits mass, APIC-reconstructed
    /// momentum, and stress-divergence force onto the nodes in each
    /// particle's stencil.
    pub fn p2g(&mut self) {
        let d_inv = self.config.interpolation.d_scal() * self.config.h_inv * self.config.h_inv;
        let node_count = self.nodes.len();
        let config = &self.config;
        let kernel = &self.kernel;
        let params = &self.params;

        #[cfg(feature = "parallel")]
        let deltas: Vec<NodeDelta> = {
            self.particles
                .par_iter()
                .fold(
                    || vec![NodeDelta::default(); node_count],
                    |mut shadow, particle| {
                        accumulate_p2g(config, kernel, params, particle, d_inv, &mut shadow);
                        shadow
                    },
                )
                .reduce(
                    || vec![NodeDelta::default(); node_count],
                    |mut a, b| {
                        for (slot, delta) in a.iter_mut().zip(b) {
                            *slot += delta;
                        }
                        a
                    },
                )
        };

        #[cfg(not(feature = "parallel"))]
        let deltas: Vec<NodeDelta> = {
            let mut shadow = vec![NodeDelta::default(); node_count];
            for particle in &self.particles {
                accumulate_p2g(config, kernel, params, particle, d_inv, &mut shadow);
            }
            shadow
        };

        for (node, delta) in self.nodes.iter_mut().zip(deltas) {
            node.mass += delta.mass;
            node.velocity += delta.velocity;
            node.force += delta.force;
        }

        debug!(particles = self.particles.len(), "p2g");
    }

    /// Converts accumulated node mass/momentum/force into velocity, applies
    /// gravity, then resolves wall collisions and (optionally) friction.
    pub fn update_nodes(&mut self) {
        let borders = &self.borders;
        let dt = self.config.dt;
        let gravity = self.config.gravity;
        let friction = self.config.friction;
        let friction_coefficient = self.config.friction_coefficient;

        #[cfg(feature = "parallel")]
        self.nodes.par_iter_mut().for_each(|node| {
            if node.is_active() {
                node.integrate(borders, dt, gravity, friction, friction_coefficient);
            }
        });

        #[cfg(not(feature = "parallel"))]
        for node in self.nodes.iter_mut() {
            if node.is_active() {
                node.integrate(borders, dt, gravity, friction, friction_coefficient);
            }
        }

        let active = self.nodes.iter().filter(|n| n.is_active()).count();
        debug!(active_nodes = active, "update_nodes");
    }

    /// Grid-to-particle transfer: recovers each particle's velocity and
    /// APIC affine field from the post-friction nodal velocities.
    pub fn g2p(&mut self) {
        let nodes = &self.nodes;
        let config = &self.config;
        let kernel = &self.kernel;
        let do_particle = |particle: &mut Particle<M>| {
            let mut velocity = Vec2::ZERO;
            let mut affine = Mat2::ZERO;
            let points = stencil_points(config, kernel, particle.position);
            if points.is_empty() {
                // Stencil would read outside the node lattice (spec §7):
                // leave this particle's velocity/affine untouched rather
                // than silently zeroing them.
                warn!(position = ?particle.position, "particle stencil outside grid during g2p");
                return;
            }
            for point in points {
                let v_fri = nodes[point.node].velocity_after_friction;
                velocity += point.weight * v_fri;
                let neg_dist = -point.dist;
                affine += point.weight
                    * Mat2::from_cols(v_fri * neg_dist.x, v_fri * neg_dist.y);
            }
            particle.velocity = velocity;
            particle.affine = affine;
        };

        #[cfg(feature = "parallel")]
        self.particles.par_iter_mut().for_each(do_particle);

        #[cfg(not(feature = "parallel"))]
        self.particles.iter_mut().for_each(do_particle);

        debug!(particles = self.particles.len(), "g2p");
    }

    /// Advects particles from post-collision nodal velocities and advances
    /// each particle's deformation state. Position advection deliberately
    /// uses `v_col` rather than `v_fri`; this asymmetry is load-bearing
    /// (see spec §4.5 note).
    pub fn update_particles(&mut self) {
        let nodes = &self.nodes;
        let config = &self.config;
        let kernel = &self.kernel;
        let dt = self.config.dt;
        let params = &self.params;
        let do_particle = |particle: &mut Particle<M>| {
            let buffered_position = particle.position;
            let points = stencil_points(config, kernel, buffered_position);
            if points.is_empty() {
                // Stencil would read outside the node lattice (spec §7):
                // leave this particle in place rather than teleporting it
                // to the origin, and skip its deformation update too since
                // there is no valid velocity-gradient sample to advance it
                // with this step.
                warn!(position = ?buffered_position, "particle stencil outside grid during update_particles");
                return;
            }
            let mut new_position = Vec2::ZERO;
            let mut t = Mat2::ZERO;
            for point in points {
                let node = &nodes[point.node];
                new_position += point.weight * (node.position + dt * node.velocity_after_collision);
                t += Mat2::from_cols(
                    node.velocity_after_collision * point.grad.x,
                    node.velocity_after_collision * point.grad.y,
                );
            }
            particle.position = new_position;
            particle.update_deformation(t, dt, params);
        };

        #[cfg(feature = "parallel")]
        self.particles.par_iter_mut().for_each(do_particle);

        #[cfg(not(feature = "parallel"))]
        self.particles.iter_mut().for_each(do_particle);

        debug!(particles = self.particles.len(), "update_particles");
    }

    /// Clears every node touched this step.
    pub fn reset_grid(&mut self) {
        #[cfg(feature = "parallel")]
        self.nodes.par_iter_mut().for_each(|node| {
            if node.is_active() {
                node.reset();
            }
        });

        #[cfg(not(feature = "parallel"))]
        for node in self.nodes.iter_mut() {
            if node.is_active() {
                node.reset();
            }
        }

        debug!("reset_grid");
    }

    /// Runs exactly the step-loop contract of spec §6:
    /// `p2g -> update_nodes -> g2p -> update_particles -> reset_grid`.
    /// Does not call any material-specific particle injection; that is the
    /// collaborator's responsibility (see `Solver<Water>::inject`).
    pub fn step(&mut self) {
        let span = tracing::debug_span!("step", particles = self.particles.len());
        let _guard = span.enter();
        self.p2g();
        self.update_nodes();
        self.g2p();
        self.update_particles();
        self.reset_grid();
    }

    /// Opt-in sweep for non-finite particle state (spec §7: "a valuable
    /// optional diagnostic"). Never called automatically from `step()`.
    pub fn diagnose(&self) -> DiagnosticsReport {
        let mut report = DiagnosticsReport::default();
        for (index, particle) in self.particles.iter().enumerate() {
            let finite = particle.position.is_finite()
                && particle.velocity.is_finite()
                && particle.affine.is_finite();
            if !finite {
                warn!(particle = index, "non-finite particle state detected");
                report.non_finite_particles.push(index);
            }
        }
        report
    }
}

/// Material-specific particle seeding (spec §6 `add_particles()`; §9 Open
/// Question (a)). Only `Water` defines a non-empty injection batch in the
/// reference source, so this lives as an inherent impl on `Solver<Water>`
/// rather than a trait method every material would have to no-op.
impl Solver<Water> {
    /// Number of particles above which [`Solver::inject`] stops seeding,
    /// matching the water-jet scenario's population cap.
    pub const INJECTION_CAP: usize = 3000;
    const INJECTION_BATCH: usize = 8;

    /// Injects one batch of `Water` particles at the domain's jet nozzle
    /// (`x = cub`, stacked down from just below the top wall) if `tick`
    /// lands on an injection boundary and the population cap hasn't been
    /// reached. A no-op on every other tick. Mirrors the reference's
    /// `AddParticles`, but constructs `Particle<Water>` directly with
    /// `Ap = 0, Jp = 1` rather than routing through the base constructor
    /// (§9 Open Question (a): the reference's version of this left
    /// `Ap`/`Jp` uninitialized until the next constitutive update, which
    /// this implementation does not reproduce).
    pub fn inject(&mut self, tick: u32, rng: &mut impl rand::Rng) {
        if tick == 0 || tick % self.config.injection_period != 0 {
            return;
        }
        if self.particles.len() >= Self::INJECTION_CAP {
            return;
        }

        let volume0 = 1.0 / (self.config.h_inv * self.config.h_inv);
        let mass = self.config.water.rest_density * volume0;
        let cub = self.config.cub;
        let top = self.config.y_grid as f32 - 2.0 * cub;
        let budget = (Self::INJECTION_CAP - self.particles.len()).min(Self::INJECTION_BATCH);

        for p in 0..budget {
            let jitter: f32 = rng.gen_range(-0.25..0.25);
            let position = Vec2::new(cub, top - 0.5 * p as f32 - jitter);
            self.add_particle(Particle::new(
                volume0,
                mass,
                position,
                Vec2::new(30.0, 0.0),
                Water::default(),
            ));
        }
    }
}

/// Shared stencil helper usable from a `&self`-free context (needed because
/// `g2p`/`update_particles` want to borrow `self.nodes` mutably alongside
/// `self.config`/`self.kernel` immutably).
fn stencil_points(config: &SimulationConfig, kernel: &Kernel, position: Vec2) -> Vec<StencilPoint> {
    let shifted = position - config.interpolation.translation();
    let base_x = shifted.x.floor() as i64;
    let base_y = shifted.y.floor() as i64;
    let lo = config.interpolation.stencil_lo() as i64;
    let hi = config.interpolation.stencil_hi() as i64;
    let nodes_per_row = config.nodes_per_row() as i64;
    let rows = (config.y_grid + 1) as i64;
    if base_x + lo < 0 || base_x + hi - 1 >= nodes_per_row || base_y + lo < 0 || base_y + hi - 1 >= rows {
        return Vec::new();
    }

    let mut points = Vec::with_capacity(((hi - lo) * (hi - lo)) as usize);
    for dy in lo..hi {
        for dx in lo..hi {
            let node_x = base_x + dx;
            let node_y = base_y + dy;
            let node_pos = Vec2::new(node_x as f32, node_y as f32);
            let dist = position - node_pos;
            points.push(StencilPoint {
                node: node_index(node_x, node_y, config.nodes_per_row()),
                dist,
                weight: kernel.weight(dist),
                grad: kernel.gradient(dist),
            });
        }
    }
    points
}

fn accumulate_p2g<M: ConstitutiveModel>(
    config: &SimulationConfig,
    kernel: &Kernel,
    params: &M::Params,
    particle: &Particle<M>,
    d_inv: f32,
    shadow: &mut [NodeDelta],
) {
    let ap = particle.stress_contribution(params);
    for point in stencil_points(config, kernel, particle.position) {
        if point.weight == 0.0 && point.grad == Vec2::ZERO {
            continue;
        }
        let delta = &mut shadow[point.node];
        delta.mass += point.weight * particle.mass;
        delta.velocity += point.weight
            * particle.mass
            * (particle.velocity + d_inv * particle.affine.mul_vec2(-point.dist));
        delta.force += ap.mul_vec2(point.grad);
    }
}
