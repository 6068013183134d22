use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// Directions shorter than this are treated as degenerate and never normalized.
pub const MIN_DIRECTION_LENGTH: f32 = 1e-6;

/// 3D vector with f32 components.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Float3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Float3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const UP: Self = Self::new(0.0, 1.0, 0.0);
    pub const DOWN: Self = Self::new(0.0, -1.0, 0.0);
    pub const RIGHT: Self = Self::new(1.0, 0.0, 0.0);
    pub const LEFT: Self = Self::new(-1.0, 0.0, 0.0);
    pub const FORWARD: Self = Self::new(0.0, 0.0, 1.0);
    pub const BACK: Self = Self::new(0.0, 0.0, -1.0);

    pub fn magnitude(self) -> f32 {
        self.magnitude_squared().sqrt()
    }

    pub fn magnitude_squared(self) -> f32 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Unit vector in the same direction, or ZERO for a degenerate input (never NaN).
    pub fn normalize(self) -> Self {
        let mag = self.magnitude();
        if mag < f32::EPSILON {
            return Self::ZERO;
        }
        self * (1.0 / mag)
    }

    /// Unit vector, or `None` when shorter than [`MIN_DIRECTION_LENGTH`].
    pub fn try_normalize(self) -> Option<Self> {
        let mag = self.magnitude();
        if !mag.is_finite() || mag < MIN_DIRECTION_LENGTH {
            return None;
        }
        Some(self * (1.0 / mag))
    }

    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn distance(self, other: Self) -> f32 {
        (self - other).magnitude()
    }

    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
            self.z + (other.z - self.z) * t,
        )
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Any unit vector perpendicular to `self`.
    pub fn any_orthogonal(self) -> Self {
        let axis = if self.x.abs() < 0.9 {
            Self::RIGHT
        } else {
            Self::UP
        };
        self.cross(axis).normalize()
    }
}

impl Add for Float3 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl AddAssign for Float3 {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Float3 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl SubAssign for Float3 {
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl Mul<f32> for Float3 {
    type Output = Self;
    fn mul(self, scalar: f32) -> Self {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl Neg for Float3 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Default for Float3 {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Unit quaternion for 3D rotations.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quaternion {
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    pub fn from_axis_angle(axis: Float3, angle: f32) -> Self {
        let half_angle = angle * 0.5;
        let s = half_angle.sin();
        let c = half_angle.cos();
        let normalized = axis.normalize();

        Self::new(normalized.x * s, normalized.y * s, normalized.z * s, c)
    }

    /// Shortest-arc rotation taking unit vector `from` onto unit vector `to`.
    ///
    /// Antiparallel inputs rotate half a turn about an arbitrary perpendicular axis.
    pub fn from_rotation_arc(from: Float3, to: Float3) -> Self {
        let d = from.dot(to);
        if d < -1.0 + 1e-6 {
            return Self::from_axis_angle(from.any_orthogonal(), std::f32::consts::PI);
        }
        let c = from.cross(to);
        Self::new(c.x, c.y, c.z, 1.0 + d).normalize()
    }

    pub fn conjugate(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    pub fn normalize(self) -> Self {
        let mag = self.dot(self).sqrt();
        if mag < f32::EPSILON {
            return Self::IDENTITY;
        }
        let inv = 1.0 / mag;
        Self::new(self.x * inv, self.y * inv, self.z * inv, self.w * inv)
    }

    /// Normalized linear interpolation along the shorter path.
    pub fn nlerp(self, other: Self, t: f32) -> Self {
        let other = if self.dot(other) < 0.0 {
            Self::new(-other.x, -other.y, -other.z, -other.w)
        } else {
            other
        };
        Self::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
            self.z + (other.z - self.z) * t,
            self.w + (other.w - self.w) * t,
        )
        .normalize()
    }

    pub fn mul_vec(self, v: Float3) -> Float3 {
        let qv = Float3::new(self.x, self.y, self.z);
        let uv = qv.cross(v);
        let uuv = qv.cross(uv);
        v + (uv * (2.0 * self.w)) + (uuv * 2.0)
    }
}

impl Mul for Quaternion {
    type Output = Self;
    fn mul(self, other: Self) -> Self {
        Self::new(
            self.w * other.x + self.x * other.w + self.y * other.z - self.z * other.y,
            self.w * other.y - self.x * other.z + self.y * other.w + self.z * other.x,
            self.w * other.z + self.x * other.y - self.y * other.x + self.z * other.w,
            self.w * other.w - self.x * other.x - self.y * other.y - self.z * other.z,
        )
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// 3x3 matrix stored as three column vectors.
/// Used for rotation transformations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix3 {
    pub c0: Float3,
    pub c1: Float3,
    pub c2: Float3,
}

impl Matrix3 {
    pub const IDENTITY: Self = Self {
        c0: Float3::RIGHT,
        c1: Float3::UP,
        c2: Float3::FORWARD,
    };

    pub fn from_columns(c0: Float3, c1: Float3, c2: Float3) -> Self {
        Self { c0, c1, c2 }
    }

    /// Rotation matrix `Rz · Ry · Rx` for Euler angles in radians (X applied first).
    pub fn from_euler(euler: Float3) -> Self {
        let (sx, cx) = euler.x.sin_cos();
        let (sy, cy) = euler.y.sin_cos();
        let (sz, cz) = euler.z.sin_cos();

        Self::from_columns(
            Float3::new(cz * cy, sz * cy, -sy),
            Float3::new(cz * sy * sx - sz * cx, sz * sy * sx + cz * cx, cy * sx),
            Float3::new(cz * sy * cx + sz * sx, sz * sy * cx - cz * sx, cy * cx),
        )
    }

    pub fn from_quaternion(q: Quaternion) -> Self {
        let q = q.normalize();
        let (x, y, z, w) = (q.x, q.y, q.z, q.w);
        Self::from_columns(
            Float3::new(
                1.0 - 2.0 * (y * y + z * z),
                2.0 * (x * y + w * z),
                2.0 * (x * z - w * y),
            ),
            Float3::new(
                2.0 * (x * y - w * z),
                1.0 - 2.0 * (x * x + z * z),
                2.0 * (y * z + w * x),
            ),
            Float3::new(
                2.0 * (x * z + w * y),
                2.0 * (y * z - w * x),
                1.0 - 2.0 * (x * x + y * y),
            ),
        )
    }

    /// Euler angles (radians) such that `from_euler(to_euler(m)) == m` for a rotation `m`.
    pub fn to_euler(&self) -> Float3 {
        // Row 2, column 0 of Rz·Ry·Rx is -sin(y).
        let r20 = self.c0.z.clamp(-1.0, 1.0);
        let y = (-r20).asin();
        if r20.abs() < 0.999_999 {
            let x = self.c1.z.atan2(self.c2.z);
            let z = self.c0.y.atan2(self.c0.x);
            Float3::new(x, y, z)
        } else {
            // Gimbal lock: fold the whole roll into X.
            let x = (-self.c2.y).atan2(self.c1.y);
            Float3::new(x, y, 0.0)
        }
    }

    pub fn transpose(&self) -> Self {
        Self {
            c0: Float3::new(self.c0.x, self.c1.x, self.c2.x),
            c1: Float3::new(self.c0.y, self.c1.y, self.c2.y),
            c2: Float3::new(self.c0.z, self.c1.z, self.c2.z),
        }
    }

    pub fn multiply(&self, other: &Matrix3) -> Self {
        Self {
            c0: self.multiply_vector(other.c0),
            c1: self.multiply_vector(other.c1),
            c2: self.multiply_vector(other.c2),
        }
    }

    pub fn multiply_vector(&self, v: Float3) -> Float3 {
        Float3::new(
            self.c0.x * v.x + self.c1.x * v.y + self.c2.x * v.z,
            self.c0.y * v.x + self.c1.y * v.y + self.c2.y * v.z,
            self.c0.z * v.x + self.c1.z * v.y + self.c2.z * v.z,
        )
    }
}

impl Default for Matrix3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}
