//! Vector, rotation and rigid-transform math.
//!
//! Zero-dependency core types shared by every other layer.

mod frame;
mod math;
mod transform;

pub use frame::Frame;
pub use math::{Float3, Matrix3, Quaternion, MIN_DIRECTION_LENGTH};
pub use transform::Transform;
