//! Tunable parameters for snapping, road generation, gravity and driving.
//!
//! Every section has sensible defaults and can be partially overridden from JSON.

use serde::{Deserialize, Serialize};

use crate::geometry::Float3;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    ParseFailed(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ParseFailed(msg) => write!(f, "Failed to parse config: {msg}"),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Which candidate wins when several connector pairs are inside the snap radius.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SnapTieBreak {
    /// First compatible pair in iteration order.
    FirstFound,
    /// Pair with the smallest connector distance.
    Closest,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SnapConfig {
    pub snap_distance: f32,
    pub tie_break: SnapTieBreak,
    pub align_rotation: bool,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            snap_distance: 1.5,
            tie_break: SnapTieBreak::Closest,
            align_rotation: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoadConfig {
    pub width: f32,
    /// Zero or less produces a single-sided ribbon.
    pub thickness: f32,
    /// How far ENTRY/EXIT are extended along their forward vectors to pin the tangents.
    pub tangent_extension: f32,
    pub min_samples: usize,
    pub samples_per_control_point: usize,
    pub friction: f32,
    pub restitution: f32,
}

impl Default for RoadConfig {
    fn default() -> Self {
        Self {
            width: 8.0,
            thickness: 0.5,
            tangent_extension: 1.0,
            min_samples: 50,
            samples_per_control_point: 10,
            friction: 0.5,
            restitution: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GravityConfig {
    pub strength: f32,
    pub probe_length: f32,
    /// Fraction of the remaining attitude error corrected per tick.
    pub orientation_smoothing: f32,
}

impl Default for GravityConfig {
    fn default() -> Self {
        Self {
            strength: 9.81,
            probe_length: 100.0,
            orientation_smoothing: 0.15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VehicleConfig {
    pub mass: f32,
    pub acceleration: f32,
    pub deceleration: f32,
    pub turn_force: f32,
    pub min_turn_speed: f32,
    pub max_speed: f32,
    pub friction: f32,
    pub restitution: f32,
    pub half_extents: Float3,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            mass: 1.0,
            acceleration: 30.0,
            deceleration: 20.0,
            turn_force: 12.0,
            min_turn_speed: 1.0,
            max_speed: 60.0,
            friction: 0.3,
            restitution: 0.0,
            half_extents: Float3::new(0.5, 0.25, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub snap: SnapConfig,
    pub road: RoadConfig,
    pub gravity: GravityConfig,
    pub vehicle: VehicleConfig,
}

impl EngineConfig {
    /// Parses a (possibly partial) JSON config and validates it.
    ///
    /// # Errors
    /// Returns error if the JSON is malformed or a value is out of range
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("snap.snapDistance", self.snap.snap_distance),
            ("road.width", self.road.width),
            ("gravity.strength", self.gravity.strength),
            ("gravity.probeLength", self.gravity.probe_length),
            ("vehicle.mass", self.vehicle.mass),
            ("vehicle.maxSpeed", self.vehicle.max_speed),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must be positive, got {value}")));
            }
        }
        if self.road.min_samples < 2 {
            return Err(ConfigError::Invalid(format!(
                "road.minSamples must be at least 2, got {}",
                self.road.min_samples
            )));
        }
        let smoothing = self.gravity.orientation_smoothing;
        if !(smoothing > 0.0 && smoothing <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "gravity.orientationSmoothing must be in (0, 1], got {smoothing}"
            )));
        }
        Ok(())
    }
}
