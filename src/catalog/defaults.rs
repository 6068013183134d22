//! Built-in element templates. These are never updated or removed.

use super::connector::{Connector, ConnectorType};
use super::element::TrackElement;
use crate::geometry::Float3;

pub const STRAIGHT_SEGMENT: &str = "straight-segment";
pub const CURVE_90: &str = "curve-90";
pub const RAMP_UP: &str = "ramp-up";
pub const BARREL_ROLL: &str = "barrel-roll";

/// Fixed id set identifying the built-in catalog.
pub const DEFAULT_ELEMENT_IDS: [&str; 4] = [STRAIGHT_SEGMENT, CURVE_90, RAMP_UP, BARREL_ROLL];

fn entry(position: Float3, forward: Float3, up: Float3) -> Connector {
    Connector::new("entry", ConnectorType::Entry, position, -forward, up, forward)
}

fn exit(position: Float3, forward: Float3, up: Float3) -> Connector {
    Connector::new("exit", ConnectorType::Exit, position, forward, up, forward)
}

fn checkpoint(index: usize, position: Float3, forward: Float3, up: Float3) -> Connector {
    Connector::new(
        format!("checkpoint-{index}"),
        ConnectorType::Checkpoint,
        position,
        up,
        up,
        forward,
    )
}

pub fn straight_segment() -> TrackElement {
    TrackElement::new(
        STRAIGHT_SEGMENT,
        "Straight",
        Float3::new(1.0, 1.0, 3.0),
        vec![
            entry(Float3::ZERO, Float3::FORWARD, Float3::UP),
            exit(Float3::new(0.0, 0.0, 30.0), Float3::FORWARD, Float3::UP),
        ],
    )
    .with_description("Flat 30-unit straight")
}

/// Quarter circle of radius 20 turning right (towards -X when entering along +Z).
pub fn curve_90() -> TrackElement {
    let half = std::f32::consts::FRAC_1_SQRT_2;
    TrackElement::new(
        CURVE_90,
        "Curve 90°",
        Float3::new(2.0, 1.0, 2.0),
        vec![
            entry(Float3::ZERO, Float3::FORWARD, Float3::UP),
            checkpoint(
                1,
                Float3::new(-20.0 + 20.0 * half, 0.0, 20.0 * half),
                Float3::new(-half, 0.0, half),
                Float3::UP,
            ),
            exit(Float3::new(-20.0, 0.0, 20.0), Float3::LEFT, Float3::UP),
        ],
    )
    .with_description("Flat right-hand quarter turn")
}

pub fn ramp_up() -> TrackElement {
    let slope = Float3::new(0.0, 5.0, 30.0).normalize();
    let slope_up = Float3::new(0.0, slope.z, -slope.y);
    TrackElement::new(
        RAMP_UP,
        "Ramp",
        Float3::new(1.0, 1.0, 3.0),
        vec![
            entry(Float3::ZERO, Float3::FORWARD, Float3::UP),
            checkpoint(1, Float3::new(0.0, 2.5, 15.0), slope, slope_up),
            exit(Float3::new(0.0, 5.0, 30.0), Float3::FORWARD, Float3::UP),
        ],
    )
    .with_description("Climbs 5 units over 30")
}

/// Rolls the road surface through a full turn around its own axis.
pub fn barrel_roll() -> TrackElement {
    TrackElement::new(
        BARREL_ROLL,
        "Barrel Roll",
        Float3::new(1.0, 1.0, 4.0),
        vec![
            entry(Float3::ZERO, Float3::FORWARD, Float3::UP),
            checkpoint(1, Float3::new(0.0, 0.0, 10.0), Float3::FORWARD, Float3::RIGHT),
            checkpoint(2, Float3::new(0.0, 0.0, 20.0), Float3::FORWARD, Float3::DOWN),
            checkpoint(3, Float3::new(0.0, 0.0, 30.0), Float3::FORWARD, Float3::LEFT),
            exit(Float3::new(0.0, 0.0, 40.0), Float3::FORWARD, Float3::UP),
        ],
    )
    .with_description("Full 360° roll over 40 units")
}

pub fn default_elements() -> Vec<TrackElement> {
    vec![straight_segment(), curve_90(), ramp_up(), barrel_roll()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_default_is_valid() {
        for element in default_elements() {
            assert_eq!(element.validate(), Ok(()), "{} failed validation", element.id);
        }
    }

    #[test]
    fn default_ids_match_the_fixed_set() {
        let ids: Vec<String> = default_elements().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, DEFAULT_ELEMENT_IDS);
    }

    #[test]
    fn straight_segment_spans_thirty_units() {
        let s = straight_segment();
        assert_eq!(s.entry().map(|c| c.position.z), Some(0.0));
        assert_eq!(s.exit().map(|c| c.position.z), Some(30.0));
    }
}
