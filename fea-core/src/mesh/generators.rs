//! Mesh generators for line-element models

use super::{Mesh, Point};

/// Uniform 1D mesh of two-node elements on [0, length]
pub fn line_1d(n_elements: usize, length: f64) -> Mesh {
    line_3d(n_elements, Point::new_1d(0.0), Point::new_1d(length))
}

/// Uniform mesh of two-node elements on the segment from `from` to `to`
///
/// # Panics
///
/// Panics if `n_elements` is zero.
pub fn line_3d(n_elements: usize, from: Point, to: Point) -> Mesh {
    assert!(n_elements > 0, "A line mesh needs at least one element");
    let mut mesh = Mesh::new();

    for i in 0..=n_elements {
        mesh.add_node(from.lerp(&to, i as f64 / n_elements as f64));
    }
    for i in 0..n_elements {
        mesh.add_element(vec![i, i + 1]);
    }

    mesh
}
