use super::math::Float3;

/// Orthonormal coordinate frame along the road centerline.
///
/// Right-handed with three orthogonal unit vectors:
/// - `forward`: direction of travel (tangent)
/// - `up`: road surface normal
/// - `right`: `forward × up`
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    pub forward: Float3,
    pub up: Float3,
    pub right: Float3,
}

impl Frame {
    pub const fn new(forward: Float3, up: Float3, right: Float3) -> Self {
        Self { forward, up, right }
    }

    /// Builds an orthonormal frame from a tangent and an approximate up vector.
    ///
    /// right = tangent × up, then up is rebuilt as right × tangent so the frame
    /// cannot shear. When tangent and up are parallel the cross product vanishes
    /// and `fallback_right` is used instead.
    pub fn from_tangent_up(tangent: Float3, up: Float3, fallback_right: Float3) -> Self {
        let forward = tangent.try_normalize().unwrap_or(Float3::FORWARD);
        let right = forward
            .cross(up)
            .try_normalize()
            .or_else(|| {
                (fallback_right - forward * forward.dot(fallback_right)).try_normalize()
            })
            .unwrap_or_else(|| forward.any_orthogonal());
        let up = right.cross(forward).normalize();
        Self::new(forward, up, right)
    }

    /// Re-orthonormalizes the frame, keeping `forward` exact.
    pub fn reorthonormalize(self) -> Self {
        Self::from_tangent_up(self.forward, self.up, self.right)
    }

    pub const DEFAULT: Self = Self::new(Float3::FORWARD, Float3::UP, Float3::LEFT);
}

impl Default for Frame {
    fn default() -> Self {
        Self::DEFAULT
    }
}
