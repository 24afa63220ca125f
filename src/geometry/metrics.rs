//! Geometric quantities used by feature-angle partitioning.

use crate::topology::entity::{Edge, Face, Node};
use nalgebra::{Point3, Vector3};

/// Threshold slack for comparing normal dot products against `cos(angle)`.
/// Coplanar faces can land a few ulps below 1.0.
pub const ANGLE_TOL: f64 = 1e-9;

/// Cosine of a feature angle given in degrees. Angles are clamped to
/// `[0, 180]`, so any threshold of 180 or more accepts every pair.
pub fn cos_deg(angle: f64) -> f64 {
    angle.clamp(0.0, 180.0).to_radians().cos()
}

/// True if unit vectors `a` and `b` are within the threshold `cos_w`.
pub fn within_angle(a: &Vector3<f64>, b: &Vector3<f64>, cos_w: f64) -> bool {
    a.dot(b) >= cos_w - ANGLE_TOL
}

/// Unit normal of a face. Quads use the diagonal cross product so that
/// warped quads get an averaged normal. Degenerate faces give zero.
pub fn face_normal(nodes: &[Node], face: &Face) -> Vector3<f64> {
    let r = |i: usize| nodes[face.n[i]].pos;
    let n = if face.kind.is_quad() {
        (r(2) - r(0)).cross(&(r(3) - r(1)))
    } else {
        (r(1) - r(0)).cross(&(r(2) - r(0)))
    };
    n.try_normalize(0.0).unwrap_or_else(Vector3::zeros)
}

/// Unit tangent from the first to the second end node.
pub fn edge_tangent(nodes: &[Node], edge: &Edge) -> Vector3<f64> {
    let t = nodes[edge.n[1]].pos - nodes[edge.n[0]].pos;
    t.try_normalize(0.0).unwrap_or_else(Vector3::zeros)
}

/// Axis-aligned bounds of a set of nodes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl BoundingBox {
    pub fn from_nodes(nodes: &[Node]) -> Option<Self> {
        let first = nodes.first()?.pos;
        let mut bb = BoundingBox {
            min: first,
            max: first,
        };
        for n in &nodes[1..] {
            bb.min = bb.min.inf(&n.pos);
            bb.max = bb.max.sup(&n.pos);
        }
        Some(bb)
    }

    pub fn diagonal(&self) -> f64 {
        (self.max - self.min).norm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::cell_type::{EdgeType, FaceType};

    fn nodes(pts: &[[f64; 3]]) -> Vec<Node> {
        pts.iter()
            .map(|p| Node::new(Point3::new(p[0], p[1], p[2])))
            .collect()
    }

    #[test]
    fn unit_square_normal_points_up() {
        let ns = nodes(&[[0., 0., 0.], [1., 0., 0.], [1., 1., 0.], [0., 1., 0.]]);
        let f = Face::new(FaceType::Quad4, &[0, 1, 2, 3]);
        let n = face_normal(&ns, &f);
        assert!((n - Vector3::z()).norm() < 1e-14);
        let t = face_normal(&ns, &Face::new(FaceType::Tri3, &[0, 2, 1]));
        assert!((t + Vector3::z()).norm() < 1e-14);
    }

    #[test]
    fn degenerate_face_has_zero_normal() {
        let ns = nodes(&[[0., 0., 0.], [1., 0., 0.], [2., 0., 0.]]);
        let f = Face::new(FaceType::Tri3, &[0, 1, 2]);
        assert_eq!(face_normal(&ns, &f), Vector3::zeros());
    }

    #[test]
    fn right_angle_is_on_the_threshold() {
        let x = Vector3::x();
        let y = Vector3::y();
        assert!(!within_angle(&x, &y, cos_deg(89.0)));
        assert!(within_angle(&x, &y, cos_deg(90.0)));
        assert!(within_angle(&x, &x, cos_deg(0.0)));
        assert!(within_angle(&x, &-x, cos_deg(180.0)));
        assert!(within_angle(&x, &-x, cos_deg(360.0)));
        let ns = nodes(&[[0., 0., 0.], [0., 3., 0.]]);
        let t = edge_tangent(&ns, &Edge::new(EdgeType::Line2, &[0, 1]));
        assert!((t - y).norm() < 1e-14);
    }

    #[test]
    fn bounding_box_spans_nodes() {
        let ns = nodes(&[[0., 2., 0.], [1., -1., 3.]]);
        let bb = BoundingBox::from_nodes(&ns).unwrap();
        assert_eq!(bb.min, Point3::new(0., -1., 0.));
        assert_eq!(bb.max, Point3::new(1., 2., 3.));
        assert!(BoundingBox::from_nodes(&[]).is_none());
    }
}
