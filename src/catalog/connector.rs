use serde::{Deserialize, Serialize};

use crate::geometry::{Float3, Transform};

/// Role of a connector within its element.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectorType {
    Entry,
    Exit,
    Checkpoint,
}

impl ConnectorType {
    /// ENTRY joins EXIT and vice versa; checkpoints never join anything.
    pub fn joins(self, other: ConnectorType) -> bool {
        matches!(
            (self, other),
            (ConnectorType::Entry, ConnectorType::Exit) | (ConnectorType::Exit, ConnectorType::Entry)
        )
    }

    pub fn is_endpoint(self) -> bool {
        !matches!(self, ConnectorType::Checkpoint)
    }
}

/// Oriented attachment point, expressed in the element's local space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connector {
    pub id: String,
    pub position: Float3,
    /// Outward-facing.
    pub normal: Float3,
    pub up_vector: Float3,
    /// Direction of travel through the element.
    pub forward_vector: Float3,
    #[serde(rename = "type")]
    pub connector_type: ConnectorType,
}

impl Connector {
    pub fn new(
        id: impl Into<String>,
        connector_type: ConnectorType,
        position: Float3,
        normal: Float3,
        up_vector: Float3,
        forward_vector: Float3,
    ) -> Self {
        Self {
            id: id.into(),
            position,
            normal,
            up_vector,
            forward_vector,
            connector_type,
        }
    }

    /// World-space frame of this connector under `transform`.
    pub fn world_frame(&self, transform: &Transform) -> ConnectorFrame {
        ConnectorFrame {
            position: transform.transform_point(self.position),
            normal: transform.transform_direction(self.normal),
            up: transform.transform_direction(self.up_vector),
            forward: transform.transform_direction(self.forward_vector),
        }
    }
}

/// Connector position and orientation resolved into world space.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorFrame {
    #[serde(rename = "worldPosition")]
    pub position: Float3,
    #[serde(rename = "worldNormal")]
    pub normal: Float3,
    #[serde(rename = "worldUpVector")]
    pub up: Float3,
    #[serde(rename = "worldForwardVector")]
    pub forward: Float3,
}
