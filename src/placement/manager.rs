use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use super::instance::{InstanceId, TrackElementInstance};
use super::snap::{find_candidate, snapped_transform};
use crate::catalog::{DefinitionStore, TrackElement};
use crate::config::{RoadConfig, SnapConfig};
use crate::geometry::{Float3, Transform};
use crate::physics::{BodyHandle, MeshHandle, PhysicsEngine};
use crate::track::{generate_mesh, GeometryError};

#[derive(Debug, Clone, PartialEq)]
pub enum PlacementError {
    ElementNotFound(String),
    InstanceNotFound(InstanceId),
    InstanceExists(InstanceId),
    /// The id is the last representable one; no successor id could be handed out.
    IdSpaceExhausted(InstanceId),
    ConnectorNotFound { instance: InstanceId, connector: String },
    NoActiveDrag,
    Geometry { element_id: String, source: GeometryError },
}

impl std::fmt::Display for PlacementError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlacementError::ElementNotFound(id) => write!(f, "element '{id}' not found"),
            PlacementError::InstanceNotFound(id) => write!(f, "{id} not found"),
            PlacementError::InstanceExists(id) => write!(f, "{id} already exists"),
            PlacementError::IdSpaceExhausted(id) => write!(f, "{id} exhausts the instance id space"),
            PlacementError::ConnectorNotFound {
                instance,
                connector,
            } => write!(f, "{instance} has no connector '{connector}'"),
            PlacementError::NoActiveDrag => write!(f, "no drag in progress"),
            PlacementError::Geometry { element_id, source } => {
                write!(f, "element '{element_id}': {source}")
            }
        }
    }
}

impl std::error::Error for PlacementError {}

#[derive(Debug, Clone, PartialEq)]
pub enum SnapOutcome {
    Snapped {
        connector: String,
        target: InstanceId,
        target_connector: String,
    },
    NoMatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub instance: InstanceId,
    pub connector: Option<String>,
}

/// Called with `(instance, connector)` on every selection change; both None when cleared.
pub type SelectionListener = Box<dyn FnMut(Option<InstanceId>, Option<&str>)>;

#[derive(Debug, Copy, Clone)]
struct RoadBody {
    mesh: MeshHandle,
    body: Option<BodyHandle>,
}

struct Slot {
    instance: TrackElementInstance,
    template: TrackElement,
    road: Option<RoadBody>,
}

#[derive(Debug, Copy, Clone)]
struct Drag {
    instance: InstanceId,
    committed: Transform,
}

/// Owns every placed instance and the engine resources backing them.
///
/// Each mutator goes through [`PlacementManager::refresh_connector_frames`], so
/// the cached world connectors and the road body always match the transform.
pub struct PlacementManager<E: PhysicsEngine> {
    engine: E,
    snap: SnapConfig,
    road: RoadConfig,
    slots: BTreeMap<InstanceId, Slot>,
    next_id: u32,
    selection: Option<Selection>,
    listeners: Vec<SelectionListener>,
    drag: Option<Drag>,
}

impl<E: PhysicsEngine> PlacementManager<E> {
    pub fn new(engine: E, snap: SnapConfig, road: RoadConfig) -> Self {
        Self {
            engine,
            snap,
            road,
            slots: BTreeMap::new(),
            next_id: 0,
            selection: None,
            listeners: Vec::new(),
            drag: None,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn snap_config(&self) -> &SnapConfig {
        &self.snap
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Places a new instance of `element_id`.
    ///
    /// # Errors
    /// `ElementNotFound` for an unknown template, `Geometry` if no road can be
    /// built from it. Nothing is registered on failure.
    pub fn create_instance(
        &mut self,
        catalog: &DefinitionStore,
        element_id: &str,
        position: Float3,
        rotation: Float3,
    ) -> Result<InstanceId, PlacementError> {
        let id = InstanceId(self.next_id);
        self.insert(catalog, id, element_id, Transform::new(position, rotation))?;
        Ok(id)
    }

    /// Re-creates an instance under a previously persisted id.
    pub fn restore_instance(
        &mut self,
        catalog: &DefinitionStore,
        id: InstanceId,
        element_id: &str,
        position: Float3,
        rotation: Float3,
    ) -> Result<InstanceId, PlacementError> {
        self.insert(catalog, id, element_id, Transform::new(position, rotation))?;
        Ok(id)
    }

    fn insert(
        &mut self,
        catalog: &DefinitionStore,
        id: InstanceId,
        element_id: &str,
        transform: Transform,
    ) -> Result<(), PlacementError> {
        if self.slots.contains_key(&id) {
            return Err(PlacementError::InstanceExists(id));
        }
        let successor = id.0.checked_add(1).ok_or_else(|| {
            warn!(%id, element_id, "rejected instance id at the end of the id space");
            PlacementError::IdSpaceExhausted(id)
        })?;
        let template = catalog
            .get_by_id(element_id)
            .ok_or_else(|| PlacementError::ElementNotFound(element_id.to_string()))?
            .clone();
        let instance = TrackElementInstance::new(id, &template, transform);
        let road = self.register_road(&instance)?;

        self.slots.insert(
            id,
            Slot {
                instance,
                template,
                road: Some(road),
            },
        );
        self.next_id = self.next_id.max(successor);
        info!(%id, element_id, "instance created");
        Ok(())
    }

    fn register_road(&mut self, instance: &TrackElementInstance) -> Result<RoadBody, PlacementError> {
        let mesh = generate_mesh(&instance.path(), &self.road).map_err(|source| {
            warn!(id = %instance.id, element_id = %instance.element_id, %source, "road generation failed");
            PlacementError::Geometry {
                element_id: instance.element_id.clone(),
                source,
            }
        })?;
        let mesh = self.engine.create_mesh(mesh);
        let body = self
            .engine
            .create_static_collision_body(mesh, self.road.friction, self.road.restitution);
        if body.is_none() {
            warn!(id = %instance.id, %mesh, "engine refused the road collision body");
        }
        Ok(RoadBody { mesh, body })
    }

    /// Disposing the mesh also drops the collision body built on it.
    fn release_road(&mut self, id: InstanceId, road: RoadBody) {
        match road.body {
            Some(body) => debug!(%id, mesh = %road.mesh, %body, "road released"),
            None => debug!(%id, mesh = %road.mesh, "road released without collision body"),
        }
        self.engine.dispose(road.mesh);
    }

    /// Rebuilds the world connectors and the road body of `id` from its transform.
    pub fn refresh_connector_frames(&mut self, id: InstanceId) -> Result<(), PlacementError> {
        let slot = self
            .slots
            .get_mut(&id)
            .ok_or(PlacementError::InstanceNotFound(id))?;
        slot.instance.resolve_connectors(&slot.template);
        let stale = slot.road.take();
        let instance = slot.instance.clone();

        if let Some(old) = stale {
            self.release_road(id, old);
        }
        let road = self.register_road(&instance)?;
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.road = Some(road);
        }
        Ok(())
    }

    /// Moves an instance; `rotation` None keeps the current rotation.
    pub fn move_instance(
        &mut self,
        id: InstanceId,
        position: Float3,
        rotation: Option<Float3>,
    ) -> Result<(), PlacementError> {
        let slot = self
            .slots
            .get_mut(&id)
            .ok_or(PlacementError::InstanceNotFound(id))?;
        slot.instance.position = position;
        if let Some(rotation) = rotation {
            slot.instance.rotation = rotation;
        }
        self.refresh_connector_frames(id)
    }

    pub fn remove_instance(&mut self, id: InstanceId) -> Result<TrackElementInstance, PlacementError> {
        let slot = self
            .slots
            .remove(&id)
            .ok_or(PlacementError::InstanceNotFound(id))?;
        if let Some(road) = slot.road {
            self.release_road(id, road);
        }
        if self.drag.is_some_and(|d| d.instance == id) {
            debug!(%id, "drag abandoned: instance removed");
            self.drag = None;
        }
        if self.selection.as_ref().is_some_and(|s| s.instance == id) {
            self.set_selection(None);
        }
        info!(%id, "instance removed");
        Ok(slot.instance)
    }

    /// Removes every instance and releases their engine resources.
    pub fn clear(&mut self) {
        for (id, slot) in std::mem::take(&mut self.slots) {
            if let Some(road) = slot.road {
                self.release_road(id, road);
            }
        }
        self.drag = None;
        self.next_id = 0;
        if self.selection.is_some() {
            self.set_selection(None);
        }
    }

    pub fn get_instance(&self, id: InstanceId) -> Option<&TrackElementInstance> {
        self.slots.get(&id).map(|s| &s.instance)
    }

    /// Snapshot of every instance in id order.
    pub fn get_instances(&self) -> Vec<TrackElementInstance> {
        self.slots.values().map(|s| s.instance.clone()).collect()
    }

    pub fn instances(&self) -> impl Iterator<Item = &TrackElementInstance> {
        self.slots.values().map(|s| &s.instance)
    }

    pub fn select(&mut self, id: InstanceId, connector: Option<&str>) -> Result<(), PlacementError> {
        let instance = self
            .get_instance(id)
            .ok_or(PlacementError::InstanceNotFound(id))?;
        if let Some(connector) = connector {
            if instance.connector(connector).is_none() {
                return Err(PlacementError::ConnectorNotFound {
                    instance: id,
                    connector: connector.to_string(),
                });
            }
        }
        self.set_selection(Some(Selection {
            instance: id,
            connector: connector.map(str::to_string),
        }));
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.set_selection(None);
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn add_selection_listener(&mut self, listener: SelectionListener) {
        self.listeners.push(listener);
    }

    fn set_selection(&mut self, selection: Option<Selection>) {
        if self.selection == selection {
            return;
        }
        self.selection = selection;
        let (instance, connector) = match &self.selection {
            Some(s) => (Some(s.instance), s.connector.clone()),
            None => (None, None),
        };
        for listener in &mut self.listeners {
            listener(instance, connector.as_deref());
        }
    }

    /// Joins `id` to the best compatible connector in range, moving `id`.
    pub fn try_auto_snap(&mut self, id: InstanceId) -> Result<SnapOutcome, PlacementError> {
        let slot = self.slots.get(&id).ok_or(PlacementError::InstanceNotFound(id))?;
        let others = self.slots.values().map(|s| &s.instance);
        let Some(found) = find_candidate(&slot.instance, others, &self.snap) else {
            return Ok(SnapOutcome::NoMatch);
        };

        let local = slot
            .template
            .connector(&found.connector)
            .map(|c| c.position)
            .ok_or_else(|| PlacementError::ConnectorNotFound {
                instance: id,
                connector: found.connector.clone(),
            })?;
        let current = slot
            .instance
            .connector(&found.connector)
            .map(|c| c.frame)
            .ok_or_else(|| PlacementError::ConnectorNotFound {
                instance: id,
                connector: found.connector.clone(),
            })?;
        let corrected = snapped_transform(
            slot.instance.transform(),
            local,
            &current,
            &found.target_frame,
            self.snap.align_rotation,
        );

        self.move_instance(id, corrected.position, Some(corrected.rotation))?;
        info!(
            %id,
            connector = %found.connector,
            target = %found.target,
            target_connector = %found.target_connector,
            "snapped"
        );
        Ok(SnapOutcome::Snapped {
            connector: found.connector,
            target: found.target,
            target_connector: found.target_connector,
        })
    }

    /// Starts dragging `id`; the current transform becomes the revert point.
    pub fn begin_drag(&mut self, id: InstanceId) -> Result<(), PlacementError> {
        let committed = self
            .get_instance(id)
            .ok_or(PlacementError::InstanceNotFound(id))?
            .transform();
        self.drag = Some(Drag {
            instance: id,
            committed,
        });
        Ok(())
    }

    /// Moves the dragged instance without snapping.
    pub fn drag_to(&mut self, position: Float3, rotation: Option<Float3>) -> Result<(), PlacementError> {
        let drag = self.drag.ok_or(PlacementError::NoActiveDrag)?;
        self.move_instance(drag.instance, position, rotation)
    }

    /// Pointer up: commits the drag and attempts a snap.
    pub fn end_drag(&mut self) -> Result<SnapOutcome, PlacementError> {
        let drag = self.drag.take().ok_or(PlacementError::NoActiveDrag)?;
        self.try_auto_snap(drag.instance)
    }

    /// Reverts the dragged instance to where the drag began. Returns false if
    /// nothing was being dragged.
    pub fn cancel_drag(&mut self) -> Result<bool, PlacementError> {
        let Some(drag) = self.drag.take() else {
            return Ok(false);
        };
        self.move_instance(
            drag.instance,
            drag.committed.position,
            Some(drag.committed.rotation),
        )?;
        Ok(true)
    }

    pub fn dragging(&self) -> Option<InstanceId> {
        self.drag.map(|d| d.instance)
    }

    pub fn road_mesh(&self, id: InstanceId) -> Option<MeshHandle> {
        self.slots.get(&id)?.road.map(|r| r.mesh)
    }

    /// Static collision body of `id`'s road, if the engine accepted one.
    pub fn road_body(&self, id: InstanceId) -> Option<BodyHandle> {
        self.slots.get(&id)?.road?.body
    }
}
