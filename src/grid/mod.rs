//! The background Eulerian grid: nodes and domain boundaries.

pub mod border;
pub mod node;

pub use border::{Border, BorderKind};
pub use node::Node;

use bevy_math::Vec2;

use crate::config::SimulationConfig;

/// Builds the dense node lattice and the four domain walls for a given
/// configuration. Mirrors `Node::InitializeNodes()` / `Border::InitializeBorders()`.
pub fn build_grid(config: &SimulationConfig) -> (Vec<Node>, Vec<Border>) {
    let rows = config.y_grid + 1;
    let cols = config.x_grid + 1;
    let mut nodes = Vec::with_capacity((rows * cols) as usize);
    for y in 0..rows {
        for x in 0..cols {
            nodes.push(Node::new(Vec2::new(x as f32, y as f32)));
        }
    }

    let borders = Border::domain_walls(
        config.x_grid as f32,
        config.y_grid as f32,
        config.cub,
        BorderKind::Separating,
    );

    (nodes, borders)
}

/// Flat index of the node at lattice coordinates `(x, y)`.
pub fn node_index(x: i64, y: i64, nodes_per_row: u32) -> usize {
    (y * nodes_per_row as i64 + x) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfigBuilder;

    #[test]
    fn build_grid_produces_expected_counts() {
        let config = SimulationConfigBuilder::default()
            .x_grid(16)
            .y_grid(8)
            .build()
            .unwrap();
        let (nodes, borders) = build_grid(&config);
        assert_eq!(nodes.len(), 17 * 9);
        assert_eq!(borders.len(), 4);
    }
}
