use std::fmt;

use crate::geometry::{Float3, Quaternion};
use crate::track::MeshData;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct MeshHandle(pub u32);

impl fmt::Display for MeshHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MeshHandle({})", self.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub u32);

impl fmt::Display for BodyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BodyHandle({})", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RaycastHit {
    pub point: Float3,
    /// Unit surface normal, facing the ray origin.
    pub normal: Float3,
    pub distance: f32,
}

/// Rendering/physics backend consumed by the editor and the race simulation.
///
/// Queries on unknown handles return None and commands on them are ignored,
/// so the per-tick callers never have to handle errors.
pub trait PhysicsEngine {
    fn create_mesh(&mut self, mesh: MeshData) -> MeshHandle;

    /// Static, zero-mass body that takes part in raycasts and contacts.
    fn create_static_collision_body(
        &mut self,
        mesh: MeshHandle,
        friction: f32,
        restitution: f32,
    ) -> Option<BodyHandle>;

    fn create_dynamic_body(
        &mut self,
        mesh: MeshHandle,
        mass: f32,
        friction: f32,
        restitution: f32,
        position: Float3,
    ) -> Option<BodyHandle>;

    fn apply_force(&mut self, body: BodyHandle, force: Float3, at: Float3);

    fn linear_velocity(&self, body: BodyHandle) -> Option<Float3>;

    fn set_linear_velocity(&mut self, body: BodyHandle, velocity: Float3);

    fn body_position(&self, body: BodyHandle) -> Option<Float3>;

    fn body_orientation(&self, body: BodyHandle) -> Option<Quaternion>;

    fn set_body_orientation(&mut self, body: BodyHandle, orientation: Quaternion);

    fn body_mass(&self, body: BodyHandle) -> Option<f32>;

    /// Nearest hit against static collision bodies within `max_length`.
    fn raycast(&self, origin: Float3, direction: Float3, max_length: f32) -> Option<RaycastHit>;

    /// Releases the mesh and every body built on it.
    fn dispose(&mut self, mesh: MeshHandle);

    fn step(&mut self, dt: f32);
}
