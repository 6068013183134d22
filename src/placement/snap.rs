//! Connector compatibility and the snap correction.

use super::instance::{InstanceId, TrackElementInstance, WorldConnector};
use crate::catalog::ConnectorFrame;
use crate::config::{SnapConfig, SnapTieBreak};
use crate::geometry::{Float3, Quaternion, Transform};

/// A compatible connector pair within the snap radius.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapCandidate {
    pub connector: String,
    pub target: InstanceId,
    pub target_connector: String,
    pub target_frame: ConnectorFrame,
    pub distance: f32,
}

/// Looks for a connector of `moved` that can join a connector of one of `others`.
///
/// Only ENTRY↔EXIT pairs strictly closer than `snap_distance` qualify. The
/// winner depends on `tie_break`; `FirstFound` keeps the order of `others`.
pub fn find_candidate<'a>(
    moved: &TrackElementInstance,
    others: impl IntoIterator<Item = &'a TrackElementInstance>,
    config: &SnapConfig,
) -> Option<SnapCandidate> {
    let others: Vec<&TrackElementInstance> = others
        .into_iter()
        .filter(|other| other.id != moved.id)
        .collect();

    let mut best: Option<SnapCandidate> = None;
    for conn in moved.endpoints() {
        for other in &others {
            for target in other.endpoints() {
                if !conn.connector_type.joins(target.connector_type) {
                    continue;
                }
                let distance = conn.frame.position.distance(target.frame.position);
                if !(distance < config.snap_distance) {
                    continue;
                }
                let closer = best.as_ref().map_or(true, |b| distance < b.distance);
                if closer {
                    best = Some(candidate(conn, other.id, target, distance));
                    if config.tie_break == SnapTieBreak::FirstFound {
                        return best;
                    }
                }
            }
        }
    }
    best
}

fn candidate(
    conn: &WorldConnector,
    target: InstanceId,
    target_conn: &WorldConnector,
    distance: f32,
) -> SnapCandidate {
    SnapCandidate {
        connector: conn.id.clone(),
        target,
        target_connector: target_conn.id.clone(),
        target_frame: target_conn.frame,
        distance,
    }
}

/// Rotation taking the connector's travel direction onto the target's, then
/// twisting about that direction until the up vectors agree.
///
/// Normals end up mirror-opposed because ENTRY and EXIT normals point out of
/// their elements along opposite senses of travel.
pub fn alignment_rotation(current: &ConnectorFrame, target: &ConnectorFrame) -> Quaternion {
    let (Some(from), Some(to)) = (current.forward.try_normalize(), target.forward.try_normalize())
    else {
        return Quaternion::IDENTITY;
    };
    let swing = Quaternion::from_rotation_arc(from, to);

    let up = swing.mul_vec(current.up);
    let projected = |v: Float3| (v - to * v.dot(to)).try_normalize();
    let twist = match (projected(up), projected(target.up)) {
        (Some(a), Some(b)) => {
            let angle = to.dot(a.cross(b)).atan2(a.dot(b));
            Quaternion::from_axis_angle(to, angle)
        }
        _ => Quaternion::IDENTITY,
    };
    (twist * swing).normalize()
}

/// Transform that puts the connector at `local` (template space) exactly on
/// `target`, optionally aligning orientation first.
pub fn snapped_transform(
    transform: Transform,
    local: Float3,
    current: &ConnectorFrame,
    target: &ConnectorFrame,
    align_rotation: bool,
) -> Transform {
    let rotated = if align_rotation {
        transform.rotated_by(alignment_rotation(current, target))
    } else {
        transform
    };
    rotated.with_point_at(local, target.position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::defaults::straight_segment;
    use crate::catalog::TrackElement;
    use approx::assert_relative_eq;

    fn place(id: u32, element: &TrackElement, position: Float3, rotation: Float3) -> TrackElementInstance {
        TrackElementInstance::new(InstanceId(id), element, Transform::new(position, rotation))
    }

    fn config(tie_break: SnapTieBreak) -> SnapConfig {
        SnapConfig {
            tie_break,
            ..SnapConfig::default()
        }
    }

    #[test]
    fn entry_near_exit_is_a_candidate() {
        let s = straight_segment();
        let a = place(0, &s, Float3::ZERO, Float3::ZERO);
        let b = place(1, &s, Float3::new(0.0, 0.0, 29.5), Float3::ZERO);

        let found = find_candidate(&b, [&a], &SnapConfig::default()).unwrap();
        assert_eq!(found.connector, "entry");
        assert_eq!(found.target, InstanceId(0));
        assert_eq!(found.target_connector, "exit");
        assert_relative_eq!(found.distance, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn threshold_is_strict() {
        let s = straight_segment();
        let a = place(0, &s, Float3::ZERO, Float3::ZERO);
        let b = place(1, &s, Float3::new(0.0, 0.0, 31.5), Float3::ZERO);
        assert!(find_candidate(&b, [&a], &SnapConfig::default()).is_none());
    }

    #[test]
    fn like_connectors_never_join() {
        let s = straight_segment();
        let a = place(0, &s, Float3::ZERO, Float3::ZERO);
        // Entries 0.5 apart.
        let b = place(1, &s, Float3::new(0.5, 0.0, 0.0), Float3::ZERO);
        assert!(find_candidate(&b, [&a], &SnapConfig::default()).is_none());
    }

    #[test]
    fn self_is_never_a_target() {
        let s = straight_segment();
        let a = place(0, &s, Float3::ZERO, Float3::ZERO);
        assert!(find_candidate(&a, [&a], &SnapConfig::default()).is_none());
    }

    #[test]
    fn tie_break_first_found_versus_closest() {
        let s = straight_segment();
        let far = place(0, &s, Float3::new(0.0, 0.0, -30.0 + 1.0), Float3::ZERO);
        let near = place(1, &s, Float3::new(0.0, 0.0, -30.0 + 0.2), Float3::ZERO);
        let moved = place(2, &s, Float3::ZERO, Float3::ZERO);

        let first = find_candidate(&moved, [&far, &near], &config(SnapTieBreak::FirstFound)).unwrap();
        assert_eq!(first.target, InstanceId(0));

        let closest = find_candidate(&moved, [&far, &near], &config(SnapTieBreak::Closest)).unwrap();
        assert_eq!(closest.target, InstanceId(1));
    }

    #[test]
    fn aligned_snap_matches_position_forward_and_up() {
        let s = straight_segment();
        let a = place(0, &s, Float3::ZERO, Float3::ZERO);
        let b = place(1, &s, Float3::new(0.6, 0.3, 29.8), Float3::new(0.1, 0.35, -0.2));

        let found = find_candidate(&b, [&a], &SnapConfig::default()).unwrap();
        let local = s.entry().unwrap().position;
        let current = b.connector("entry").unwrap().frame;
        let fixed = snapped_transform(b.transform(), local, &current, &found.target_frame, true);

        let entry = s.entry().unwrap().world_frame(&fixed);
        assert_relative_eq!(entry.position.distance(found.target_frame.position), 0.0, epsilon = 1e-5);
        assert_relative_eq!(entry.forward.dot(found.target_frame.forward), 1.0, epsilon = 1e-4);
        assert_relative_eq!(entry.up.dot(found.target_frame.up), 1.0, epsilon = 1e-4);
        assert_relative_eq!(entry.normal.dot(found.target_frame.normal), -1.0, epsilon = 1e-4);
    }

    #[test]
    fn position_only_snap_keeps_rotation() {
        let s = straight_segment();
        let a = place(0, &s, Float3::ZERO, Float3::ZERO);
        let b = place(1, &s, Float3::new(0.0, 0.0, 29.5), Float3::new(0.0, 0.2, 0.0));
        let found = find_candidate(&b, [&a], &SnapConfig::default()).unwrap();
        let current = b.connector("entry").unwrap().frame;
        let fixed = snapped_transform(b.transform(), Float3::ZERO, &current, &found.target_frame, false);

        assert_eq!(fixed.rotation, b.rotation);
        assert_relative_eq!(fixed.position.z, 30.0, epsilon = 1e-6);
    }
}
