//! Local (rotated) coordinate frame for line elements

use crate::mesh::Point;
use ndarray::{Array1, Array2, array};

/// Orthonormal frame whose first axis runs along a line element
///
/// Rows of `rotation` are the local axes expressed in global coordinates, so
/// `local = rotation * global`.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalFrame {
    pub rotation: Array2<f64>,
    pub origin: Point,
}

impl Default for LocalFrame {
    fn default() -> Self {
        Self {
            rotation: Array2::eye(3),
            origin: Point::default(),
        }
    }
}

impl LocalFrame {
    /// Frame with x along `from -> to`
    ///
    /// The second axis is taken perpendicular to x in the plane of the global
    /// axis least aligned with the element.
    ///
    /// # Panics
    ///
    /// Panics if the two points coincide.
    pub fn from_line(from: &Point, to: &Point) -> Self {
        let length = from.distance(to);
        assert!(length > 0.0, "Cannot build a frame on a zero-length element");
        let d = from.vector_to(to);
        let e1 = [d[0] / length, d[1] / length, d[2] / length];

        let mut reference = [0.0; 3];
        let weakest = (0..3)
            .min_by(|&a, &b| e1[a].abs().total_cmp(&e1[b].abs()))
            .unwrap_or(2);
        reference[weakest] = 1.0;

        let e3 = normalize(cross(e1, reference));
        let e2 = cross(e3, e1);

        Self {
            rotation: array![
                [e1[0], e1[1], e1[2]],
                [e2[0], e2[1], e2[2]],
                [e3[0], e3[1], e3[2]],
            ],
            origin: *from,
        }
    }

    /// Element axis direction in global coordinates
    pub fn axis(&self) -> Array1<f64> {
        self.rotation.row(0).to_owned()
    }

    /// Rotate a global vector into the local frame
    pub fn to_local(&self, v: &Array1<f64>) -> Array1<f64> {
        self.rotation.dot(v)
    }

    /// Rotate a local vector back to global coordinates
    pub fn to_global(&self, v: &Array1<f64>) -> Array1<f64> {
        self.rotation.t().dot(v)
    }
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn normalize(v: [f64; 3]) -> [f64; 3] {
    let n = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    [v[0] / n, v[1] / n, v[2] / n]
}
