//! Physics boundary, surface-follow gravity and the vehicle controller.
//!
//! The crate talks to any backend through [`PhysicsEngine`]; [`HeadlessWorld`]
//! is the in-crate implementation used by tests and headless tools.

mod constants;
mod engine;
mod gravity;
mod vehicle;
mod world;

pub use constants::{clamp_speed, DT, EPSILON, G, HZ, PROBE_DIRECTIONS};
pub use engine::{BodyHandle, MeshHandle, PhysicsEngine, RaycastHit};
pub use gravity::{find_nearest_surface, SurfaceFollow};
pub use vehicle::{DriveIntent, Steering, Throttle, Vehicle};
pub use world::HeadlessWorld;
