use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::connector::{Connector, ConnectorType};
use crate::geometry::{Float3, MIN_DIRECTION_LENGTH};

/// Catalog template for a track piece.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackElement {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Bounding size in grid blocks.
    pub container_size: Float3,
    pub connectors: Vec<Connector>,
}

/// Why a template was refused by the catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementDefect {
    EmptyId,
    EntryCount(usize),
    ExitCount(usize),
    DuplicateConnectorId(String),
    DegenerateDirection(String),
    NonFinite(String),
}

impl std::fmt::Display for ElementDefect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementDefect::EmptyId => write!(f, "element id is empty"),
            ElementDefect::EntryCount(n) => write!(f, "expected exactly one ENTRY connector, found {n}"),
            ElementDefect::ExitCount(n) => write!(f, "expected exactly one EXIT connector, found {n}"),
            ElementDefect::DuplicateConnectorId(id) => write!(f, "duplicate connector id '{id}'"),
            ElementDefect::DegenerateDirection(id) => {
                write!(f, "connector '{id}' has a zero-length direction vector")
            }
            ElementDefect::NonFinite(id) => write!(f, "connector '{id}' has a non-finite component"),
        }
    }
}

impl TrackElement {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        container_size: Float3,
        connectors: Vec<Connector>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            container_size,
            connectors,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn connector(&self, id: &str) -> Option<&Connector> {
        self.connectors.iter().find(|c| c.id == id)
    }

    pub fn entry(&self) -> Option<&Connector> {
        self.connectors
            .iter()
            .find(|c| c.connector_type == ConnectorType::Entry)
    }

    pub fn exit(&self) -> Option<&Connector> {
        self.connectors
            .iter()
            .find(|c| c.connector_type == ConnectorType::Exit)
    }

    /// Checks the invariants every catalog element must satisfy before acceptance.
    pub fn validate(&self) -> Result<(), ElementDefect> {
        if self.id.trim().is_empty() {
            return Err(ElementDefect::EmptyId);
        }

        let count = |kind: ConnectorType| {
            self.connectors
                .iter()
                .filter(|c| c.connector_type == kind)
                .count()
        };
        let entries = count(ConnectorType::Entry);
        if entries != 1 {
            return Err(ElementDefect::EntryCount(entries));
        }
        let exits = count(ConnectorType::Exit);
        if exits != 1 {
            return Err(ElementDefect::ExitCount(exits));
        }

        let mut seen = HashSet::with_capacity(self.connectors.len());
        for c in &self.connectors {
            if !seen.insert(c.id.as_str()) {
                return Err(ElementDefect::DuplicateConnectorId(c.id.clone()));
            }
            let vectors = [c.position, c.normal, c.up_vector, c.forward_vector];
            if vectors.iter().any(|v| !v.is_finite()) {
                return Err(ElementDefect::NonFinite(c.id.clone()));
            }
            if [c.normal, c.up_vector, c.forward_vector]
                .iter()
                .any(|v| v.magnitude() < MIN_DIRECTION_LENGTH)
            {
                return Err(ElementDefect::DegenerateDirection(c.id.clone()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(id: &str, kind: ConnectorType, z: f32) -> Connector {
        Connector::new(id, kind, Float3::new(0.0, 0.0, z), Float3::FORWARD, Float3::UP, Float3::FORWARD)
    }

    fn straight(connectors: Vec<Connector>) -> TrackElement {
        TrackElement::new("piece", "Piece", Float3::new(1.0, 1.0, 3.0), connectors)
    }

    #[test]
    fn valid_element_passes() {
        let e = straight(vec![
            endpoint("in", ConnectorType::Entry, 0.0),
            endpoint("cp", ConnectorType::Checkpoint, 15.0),
            endpoint("out", ConnectorType::Exit, 30.0),
        ]);
        assert_eq!(e.validate(), Ok(()));
        assert_eq!(e.entry().map(|c| c.id.as_str()), Some("in"));
        assert_eq!(e.exit().map(|c| c.id.as_str()), Some("out"));
    }

    #[test]
    fn missing_exit_is_rejected() {
        let e = straight(vec![
            endpoint("in", ConnectorType::Entry, 0.0),
            endpoint("cp", ConnectorType::Checkpoint, 15.0),
        ]);
        assert_eq!(e.validate(), Err(ElementDefect::ExitCount(0)));
    }

    #[test]
    fn two_entries_are_rejected() {
        let e = straight(vec![
            endpoint("a", ConnectorType::Entry, 0.0),
            endpoint("b", ConnectorType::Entry, 1.0),
            endpoint("out", ConnectorType::Exit, 30.0),
        ]);
        assert_eq!(e.validate(), Err(ElementDefect::EntryCount(2)));
    }

    #[test]
    fn duplicate_connector_ids_are_rejected() {
        let e = straight(vec![
            endpoint("x", ConnectorType::Entry, 0.0),
            endpoint("x", ConnectorType::Exit, 30.0),
        ]);
        assert_eq!(e.validate(), Err(ElementDefect::DuplicateConnectorId("x".into())));
    }

    #[test]
    fn zero_forward_is_rejected() {
        let mut exit = endpoint("out", ConnectorType::Exit, 30.0);
        exit.forward_vector = Float3::ZERO;
        let e = straight(vec![endpoint("in", ConnectorType::Entry, 0.0), exit]);
        assert_eq!(e.validate(), Err(ElementDefect::DegenerateDirection("out".into())));
    }
}
