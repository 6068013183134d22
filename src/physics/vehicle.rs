use tracing::debug;

use super::constants::clamp_speed;
use super::engine::{BodyHandle, MeshHandle, PhysicsEngine};
use super::gravity::SurfaceFollow;
use crate::config::{GravityConfig, VehicleConfig};
use crate::geometry::{Float3, Quaternion};
use crate::track::MeshData;

/// Raw key state for one tick.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct DriveIntent {
    pub accelerate: bool,
    pub brake: bool,
    pub turn_left: bool,
    pub turn_right: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Throttle {
    Idle,
    Accelerating,
    Braking,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Steering {
    Straight,
    Left,
    Right,
}

impl DriveIntent {
    /// Opposing keys cancel.
    pub fn throttle(&self) -> Throttle {
        match (self.accelerate, self.brake) {
            (true, false) => Throttle::Accelerating,
            (false, true) => Throttle::Braking,
            _ => Throttle::Idle,
        }
    }

    pub fn steering(&self) -> Steering {
        match (self.turn_left, self.turn_right) {
            (true, false) => Steering::Left,
            (false, true) => Steering::Right,
            _ => Steering::Straight,
        }
    }
}

/// Player vehicle: a dynamic box body driven by intents and held to the track
/// by surface-follow gravity.
///
/// Local axes: +Z forward, +Y up, right = forward × up.
#[derive(Debug, Clone)]
pub struct Vehicle {
    body: BodyHandle,
    hull: MeshHandle,
    config: VehicleConfig,
    follow: SurfaceFollow,
    intent: DriveIntent,
}

impl Vehicle {
    /// Registers the hull mesh and a dynamic body at `position`.
    ///
    /// Returns None if the engine refuses the body; the hull is released again.
    pub fn spawn<E: PhysicsEngine + ?Sized>(
        engine: &mut E,
        position: Float3,
        config: VehicleConfig,
        gravity: GravityConfig,
    ) -> Option<Self> {
        let hull = engine.create_mesh(MeshData::cuboid(config.half_extents));
        let Some(body) = engine.create_dynamic_body(
            hull,
            config.mass,
            config.friction,
            config.restitution,
            position,
        ) else {
            engine.dispose(hull);
            return None;
        };
        debug!(%body, ?position, "vehicle spawned");
        Some(Self {
            body,
            hull,
            config,
            follow: SurfaceFollow::new(gravity),
            intent: DriveIntent::default(),
        })
    }

    pub fn body(&self) -> BodyHandle {
        self.body
    }

    pub fn intent(&self) -> DriveIntent {
        self.intent
    }

    pub fn set_intent(&mut self, intent: DriveIntent) {
        self.intent = intent;
    }

    pub fn gravity(&self) -> Float3 {
        self.follow.gravity()
    }

    pub fn surface_follow(&self) -> &SurfaceFollow {
        &self.follow
    }

    pub fn speed<E: PhysicsEngine + ?Sized>(&self, engine: &E) -> f32 {
        engine
            .linear_velocity(self.body)
            .map_or(0.0, |v| v.magnitude())
    }

    /// Surface follow plus drive forces. Call before the engine steps.
    pub fn apply_controls<E: PhysicsEngine + ?Sized>(&mut self, engine: &mut E) {
        self.follow.update(engine, self.body);

        let Some(position) = engine.body_position(self.body) else {
            return;
        };
        let orientation = engine
            .body_orientation(self.body)
            .unwrap_or(Quaternion::IDENTITY);
        let mass = engine.body_mass(self.body).unwrap_or(0.0);
        let forward = orientation.mul_vec(Float3::FORWARD);
        let up = orientation.mul_vec(Float3::UP);
        let right = forward.cross(up);

        let drive = match self.intent.throttle() {
            Throttle::Accelerating => forward * self.config.acceleration,
            Throttle::Braking => -forward * self.config.deceleration,
            Throttle::Idle => Float3::ZERO,
        };

        let speed = self.speed(engine);
        let lateral = if speed > self.config.min_turn_speed {
            match self.intent.steering() {
                Steering::Left => -right * self.config.turn_force,
                Steering::Right => right * self.config.turn_force,
                Steering::Straight => Float3::ZERO,
            }
        } else {
            Float3::ZERO
        };

        let force = (drive + lateral) * mass;
        if force.is_finite() && force != Float3::ZERO {
            engine.apply_force(self.body, force, position);
        }
    }

    /// Hard speed cap. Call after the engine steps.
    pub fn limit_speed<E: PhysicsEngine + ?Sized>(&self, engine: &mut E) {
        let Some(velocity) = engine.linear_velocity(self.body) else {
            return;
        };
        if let Some(clamped) = clamp_speed(velocity, self.config.max_speed) {
            if clamped != velocity {
                engine.set_linear_velocity(self.body, clamped);
            }
        }
    }

    /// Full tick for a world that only simulates this vehicle.
    pub fn tick<E: PhysicsEngine + ?Sized>(&mut self, engine: &mut E, dt: f32) {
        self.apply_controls(engine);
        engine.step(dt);
        self.limit_speed(engine);
    }

    pub fn despawn<E: PhysicsEngine + ?Sized>(self, engine: &mut E) {
        engine.dispose(self.hull);
    }
}
