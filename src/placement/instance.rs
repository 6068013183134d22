use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::{ConnectorFrame, ConnectorType, TrackElement};
use crate::geometry::{Float3, Transform};
use crate::track::PathConnector;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(pub u32);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance-{}", self.0)
    }
}

/// A connector of a placed instance, resolved into world space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldConnector {
    pub id: String,
    #[serde(rename = "type")]
    pub connector_type: ConnectorType,
    #[serde(flatten)]
    pub frame: ConnectorFrame,
}

impl WorldConnector {
    pub fn path(&self) -> PathConnector {
        PathConnector::new(self.connector_type, self.frame)
    }
}

/// A track element placed in the world.
///
/// `connectors` mirrors the template's connectors in declared order and is
/// rebuilt from the template on every transform change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackElementInstance {
    pub id: InstanceId,
    pub element_id: String,
    pub position: Float3,
    pub rotation: Float3,
    pub connectors: Vec<WorldConnector>,
}

impl TrackElementInstance {
    pub(crate) fn new(id: InstanceId, element: &TrackElement, transform: Transform) -> Self {
        let mut instance = Self {
            id,
            element_id: element.id.clone(),
            position: transform.position,
            rotation: transform.rotation,
            connectors: Vec::with_capacity(element.connectors.len()),
        };
        instance.resolve_connectors(element);
        instance
    }

    pub fn transform(&self) -> Transform {
        Transform::new(self.position, self.rotation)
    }

    pub fn connector(&self, id: &str) -> Option<&WorldConnector> {
        self.connectors.iter().find(|c| c.id == id)
    }

    pub fn connectors_of(&self, kind: ConnectorType) -> impl Iterator<Item = &WorldConnector> {
        self.connectors
            .iter()
            .filter(move |c| c.connector_type == kind)
    }

    /// Connectors that can take part in snapping.
    pub fn endpoints(&self) -> impl Iterator<Item = &WorldConnector> {
        self.connectors
            .iter()
            .filter(|c| c.connector_type.is_endpoint())
    }

    pub fn path(&self) -> Vec<PathConnector> {
        self.connectors.iter().map(WorldConnector::path).collect()
    }

    /// Recomputes every world connector from the template and the current transform.
    pub(crate) fn resolve_connectors(&mut self, element: &TrackElement) {
        let transform = self.transform();
        self.connectors = element
            .connectors
            .iter()
            .map(|c| WorldConnector {
                id: c.id.clone(),
                connector_type: c.connector_type,
                frame: c.world_frame(&transform),
            })
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::defaults::{curve_90, straight_segment};
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn connectors_follow_transform() {
        let transform = Transform::new(Float3::new(5.0, 0.0, 0.0), Float3::new(0.0, FRAC_PI_2, 0.0));
        let instance = TrackElementInstance::new(InstanceId(1), &straight_segment(), transform);

        let exit = instance.connector("exit").unwrap();
        assert_relative_eq!(exit.frame.position.x, 35.0, epsilon = 1e-4);
        assert_relative_eq!(exit.frame.position.z, 0.0, epsilon = 1e-4);
        assert_relative_eq!(exit.frame.forward.x, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn declared_order_is_kept() {
        let instance =
            TrackElementInstance::new(InstanceId(2), &curve_90(), Transform::IDENTITY);
        let ids: Vec<&str> = instance.connectors.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["entry", "checkpoint-1", "exit"]);
        assert_eq!(instance.endpoints().count(), 2);
        assert_eq!(instance.connectors_of(ConnectorType::Checkpoint).count(), 1);
    }

    #[test]
    fn serializes_with_camel_case_and_flat_frames() {
        let instance =
            TrackElementInstance::new(InstanceId(7), &straight_segment(), Transform::IDENTITY);
        let json = serde_json::to_value(&instance).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["elementId"], "straight-segment");
        assert_eq!(json["connectors"][1]["type"], "EXIT");
        assert_eq!(json["connectors"][1]["worldPosition"]["z"], 30.0);

        let back: TrackElementInstance = serde_json::from_value(json).unwrap();
        assert_eq!(back, instance);
    }
}
