use serde::{Deserialize, Serialize};

use super::math::{Float3, Matrix3, Quaternion};

/// Rigid placement of a track element: world position plus Euler rotation (radians).
///
/// Composition is fixed crate-wide as `world = T · Rz · Ry · Rx · local`.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    pub position: Float3,
    pub rotation: Float3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Float3::ZERO,
        rotation: Float3::ZERO,
    };

    pub const fn new(position: Float3, rotation: Float3) -> Self {
        Self { position, rotation }
    }

    pub fn matrix(&self) -> Matrix3 {
        Matrix3::from_euler(self.rotation)
    }

    pub fn transform_point(&self, local: Float3) -> Float3 {
        self.matrix().multiply_vector(local) + self.position
    }

    /// Rotates a direction (normal, up, forward) and renormalizes it.
    /// Degenerate directions come back as ZERO rather than NaN.
    pub fn transform_direction(&self, local: Float3) -> Float3 {
        self.matrix().multiply_vector(local).normalize()
    }

    /// Pre-multiplies the rotation by `q` (applied in world space after the current rotation).
    pub fn rotated_by(&self, q: Quaternion) -> Self {
        let rotated = Matrix3::from_quaternion(q).multiply(&self.matrix());
        Self::new(self.position, rotated.to_euler())
    }

    /// Translation that puts `local` exactly on `world` under the current rotation.
    pub fn with_point_at(&self, local: Float3, world: Float3) -> Self {
        let offset = self.matrix().multiply_vector(local);
        Self::new(world - offset, self.rotation)
    }
}
