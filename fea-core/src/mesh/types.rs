//! Mesh types for line-element models
//!
//! Nodes live in 3-D space so the same element can be used for 1-D models and
//! for bars oriented arbitrarily in space.

use serde::{Deserialize, Serialize};

/// A point in 3D space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    /// Create a point on the x axis
    pub fn new_1d(x: f64) -> Self {
        Self { x, y: 0.0, z: 0.0 }
    }

    /// Create a 3D point
    pub fn new_3d(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f64 {
        let [dx, dy, dz] = self.vector_to(other);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Components of `other - self`
    pub fn vector_to(&self, other: &Point) -> [f64; 3] {
        [other.x - self.x, other.y - self.y, other.z - self.z]
    }

    /// Point at parameter `t` on the segment from `self` to `other`
    pub fn lerp(&self, other: &Point, t: f64) -> Point {
        Point {
            x: self.x + t * (other.x - self.x),
            y: self.y + t * (other.y - self.y),
            z: self.z + t * (other.z - self.z),
        }
    }
}

impl From<(f64, f64, f64)> for Point {
    fn from(p: (f64, f64, f64)) -> Self {
        Point::new_3d(p.0, p.1, p.2)
    }
}

/// A mesh element: its node ids and a copy of their coordinates
///
/// This is what an element kernel binds to in `init`.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Element index in the mesh
    pub id: usize,
    /// Global node indices
    pub nodes: Vec<usize>,
    /// Node coordinates, same order as `nodes`
    pub points: Vec<Point>,
}

impl Element {
    /// Number of nodes
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Distance between the first and last node
    pub fn length(&self) -> f64 {
        match (self.points.first(), self.points.last()) {
            (Some(a), Some(b)) => a.distance(b),
            _ => 0.0,
        }
    }
}

/// A mesh of line elements
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Node coordinates
    pub nodes: Vec<Point>,
    /// Element connectivity (node indices)
    pub connectivity: Vec<Vec<usize>>,
}

impl Mesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and return its index
    pub fn add_node(&mut self, point: Point) -> usize {
        self.nodes.push(point);
        self.nodes.len() - 1
    }

    /// Add an element and return its index
    ///
    /// # Panics
    ///
    /// Panics if a node index is out of range.
    pub fn add_element(&mut self, nodes: Vec<usize>) -> usize {
        assert!(
            nodes.iter().all(|&n| n < self.nodes.len()),
            "Element references a node outside the mesh"
        );
        self.connectivity.push(nodes);
        self.connectivity.len() - 1
    }

    /// Number of nodes
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of elements
    pub fn num_elements(&self) -> usize {
        self.connectivity.len()
    }

    /// Element `id` with its coordinates resolved
    pub fn element(&self, id: usize) -> Element {
        let nodes = self.connectivity[id].clone();
        let points = nodes.iter().map(|&n| self.nodes[n]).collect();
        Element { id, nodes, points }
    }

    /// Iterate over all elements
    pub fn elements(&self) -> impl Iterator<Item = Element> + '_ {
        (0..self.num_elements()).map(|id| self.element(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_point_distance() {
        let a = Point::new_3d(0.0, 0.0, 0.0);
        let b = Point::new_3d(3.0, 4.0, 0.0);
        assert_relative_eq!(a.distance(&b), 5.0);
        assert_eq!(a.lerp(&b, 0.5), Point::new_3d(1.5, 2.0, 0.0));
    }

    #[test]
    fn test_mesh_element_resolution() {
        let mut mesh = Mesh::new();
        let a = mesh.add_node(Point::new_1d(0.0));
        let b = mesh.add_node(Point::new_1d(2.0));
        let e = mesh.add_element(vec![a, b]);

        let element = mesh.element(e);
        assert_eq!(element.num_nodes(), 2);
        assert_relative_eq!(element.length(), 2.0);
        assert_eq!(mesh.elements().count(), 1);
    }

    #[test]
    #[should_panic(expected = "outside the mesh")]
    fn test_mesh_rejects_dangling_node() {
        let mut mesh = Mesh::new();
        mesh.add_node(Point::new_1d(0.0));
        mesh.add_element(vec![0, 1]);
    }
}
