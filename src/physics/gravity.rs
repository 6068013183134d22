//! Surface-follow gravity: "down" is towards the nearest track surface.

use tracing::trace;

use super::constants::PROBE_DIRECTIONS;
use super::engine::{BodyHandle, PhysicsEngine, RaycastHit};
use crate::config::GravityConfig;
use crate::geometry::{Float3, Quaternion};

/// Casts the six axis probes from `origin` and keeps the closest hit.
pub fn find_nearest_surface<E: PhysicsEngine + ?Sized>(
    engine: &E,
    origin: Float3,
    probe_length: f32,
) -> Option<RaycastHit> {
    PROBE_DIRECTIONS
        .iter()
        .filter_map(|&dir| engine.raycast(origin, dir, probe_length))
        .filter(|hit| hit.normal.is_finite() && hit.distance.is_finite())
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

/// Per-body gravity state. Keeps the last good gravity vector for ticks where
/// no surface is in probe range.
#[derive(Debug, Clone)]
pub struct SurfaceFollow {
    config: GravityConfig,
    gravity: Float3,
    surface: Option<RaycastHit>,
}

impl SurfaceFollow {
    pub fn new(config: GravityConfig) -> Self {
        Self {
            gravity: Float3::new(0.0, -config.strength, 0.0),
            config,
            surface: None,
        }
    }

    /// Current gravity acceleration.
    pub fn gravity(&self) -> Float3 {
        self.gravity
    }

    /// Surface found on the most recent tick, if any.
    pub fn surface(&self) -> Option<RaycastHit> {
        self.surface
    }

    /// One tick: probe, update gravity, push the body and ease its attitude.
    pub fn update<E: PhysicsEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        body: BodyHandle,
    ) -> Option<RaycastHit> {
        let Some(position) = engine.body_position(body) else {
            self.surface = None;
            return None;
        };

        self.surface = find_nearest_surface(engine, position, self.config.probe_length);
        match self.surface {
            Some(hit) => {
                self.gravity = -hit.normal * self.config.strength;
                self.align_attitude(engine, body, hit.normal);
            }
            None => trace!(%body, "no surface in probe range, keeping previous gravity"),
        }

        let mass = engine.body_mass(body).unwrap_or(0.0);
        let force = self.gravity * mass;
        if force.is_finite() {
            engine.apply_force(body, force, position);
        }
        self.surface
    }

    fn align_attitude<E: PhysicsEngine + ?Sized>(
        &self,
        engine: &mut E,
        body: BodyHandle,
        normal: Float3,
    ) {
        let Some(current) = engine.body_orientation(body) else {
            return;
        };
        let Some(up) = current.mul_vec(Float3::UP).try_normalize() else {
            return;
        };
        let target = (Quaternion::from_rotation_arc(up, normal) * current).normalize();
        let eased = current.nlerp(target, self.config.orientation_smoothing);
        engine.set_body_orientation(body, eased);
    }
}
