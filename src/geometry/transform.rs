//! Local ↔ global placement of a mesh's owning object.

use nalgebra::{Point3, UnitQuaternion, Vector3};

/// Scale, then rotate, then translate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vector3<f64>,
    pub rotation: UnitQuaternion<f64>,
    pub scale: Vector3<f64>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn from_translation(position: Vector3<f64>) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn with_rotation(mut self, rotation: UnitQuaternion<f64>) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vector3<f64>) -> Self {
        self.scale = scale;
        self
    }

    pub fn local_to_global(&self, r: &Point3<f64>) -> Point3<f64> {
        let s = r.coords.component_mul(&self.scale);
        Point3::from(self.rotation * s + self.position)
    }

    /// Inverse of [`local_to_global`](Self::local_to_global). Zero scale
    /// components map to zero.
    pub fn global_to_local(&self, r: &Point3<f64>) -> Point3<f64> {
        let q = self.rotation.inverse() * (r.coords - self.position);
        let inv = self
            .scale
            .map(|s| if s.abs() > f64::EPSILON { 1.0 / s } else { 0.0 });
        Point3::from(q.component_mul(&inv))
    }
}
