use crate::geometry::Float3;

pub const G: f32 = 9.81;
pub const HZ: f32 = 60.0;
pub const DT: f32 = 1.0 / HZ;
pub const EPSILON: f32 = 1.192_093e-7;

/// Omni-directional surface probe: the six cardinal axes.
pub const PROBE_DIRECTIONS: [Float3; 6] = [
    Float3::RIGHT,
    Float3::LEFT,
    Float3::UP,
    Float3::DOWN,
    Float3::FORWARD,
    Float3::BACK,
];

/// Scales `velocity` down to `max_speed` if it is faster. Never scales up.
///
/// Returns None for non-finite input so callers can skip the write-back.
pub fn clamp_speed(velocity: Float3, max_speed: f32) -> Option<Float3> {
    if !velocity.is_finite() {
        return None;
    }
    let speed = velocity.magnitude();
    if speed <= max_speed || speed < EPSILON {
        return Some(velocity);
    }
    Some(velocity * (max_speed / speed))
}
