//! Editor session: one catalog, one placement manager and the track being edited.

use chrono::Utc;
use tracing::{error, info, warn};

use crate::catalog::{CatalogError, ConnectorType, DefinitionStore, TrackElement};
use crate::config::EngineConfig;
use crate::geometry::{Float3, Matrix3};
use crate::persistence::{
    self, export_track, import_track, BestTime, KeyValueStore, PersistenceError, Track,
};
use crate::physics::{PhysicsEngine, Vehicle};
use crate::placement::{InstanceId, PlacementError, PlacementManager};

/// Height above the start pose at which vehicles are dropped in.
const SPAWN_CLEARANCE: f32 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    TrackNotFound(String),
    Persistence(PersistenceError),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::TrackNotFound(id) => write!(f, "track '{id}' not found"),
            SessionError::Persistence(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<PersistenceError> for SessionError {
    fn from(e: PersistenceError) -> Self {
        SessionError::Persistence(e)
    }
}

/// Outcome of applying a track document to the placement manager.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub restored: usize,
    /// Instances that could not be rebuilt, usually because their template is gone.
    pub skipped: Vec<(InstanceId, PlacementError)>,
}

pub struct EditorSession<E: PhysicsEngine, S: KeyValueStore> {
    config: EngineConfig,
    catalog: DefinitionStore,
    placement: PlacementManager<E>,
    store: S,
    track: Track,
}

impl<E: PhysicsEngine, S: KeyValueStore> EditorSession<E, S> {
    /// Builds a session over `engine` and `store`, merging any stored custom
    /// elements into the catalog. An unreadable custom list is logged and ignored.
    pub fn new(config: EngineConfig, engine: E, store: S) -> Self {
        let mut catalog = DefinitionStore::new();
        if let Err(e) = persistence::load_custom_elements(&store, &mut catalog) {
            warn!(error = %e, "ignoring unreadable custom elements");
        }
        Self {
            placement: PlacementManager::new(engine, config.snap, config.road),
            config,
            catalog,
            store,
            track: Track::new(new_track_id(), "Untitled", ""),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &DefinitionStore {
        &self.catalog
    }

    pub fn placement(&self) -> &PlacementManager<E> {
        &self.placement
    }

    pub fn placement_mut(&mut self) -> &mut PlacementManager<E> {
        &mut self.placement
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    /// Places an element from this session's catalog.
    ///
    /// # Errors
    /// Propagates [`PlacementManager::create_instance`] errors
    pub fn place(
        &mut self,
        element_id: &str,
        position: Float3,
        rotation: Float3,
    ) -> Result<InstanceId, PlacementError> {
        self.placement
            .create_instance(&self.catalog, element_id, position, rotation)
    }

    /// Discards every placed instance and starts an empty document.
    pub fn new_track(&mut self, name: &str, author: &str) -> &Track {
        self.placement.clear();
        self.track = Track::new(new_track_id(), name, author);
        info!(id = %self.track.id, name, "new track");
        &self.track
    }

    /// Copies the manager's state into the document.
    pub fn sync_document(&mut self) {
        let instances = self.placement.get_instances();

        self.track.checkpoints = instances
            .iter()
            .flat_map(|i| i.connectors_of(ConnectorType::Checkpoint))
            .map(|c| c.frame.position)
            .collect();

        match instances.first().and_then(|i| i.connectors_of(ConnectorType::Entry).next()) {
            Some(entry) => {
                let frame = entry.frame;
                let basis = Matrix3::from_columns(frame.up.cross(frame.forward), frame.up, frame.forward);
                self.track.start_position = frame.position;
                self.track.start_rotation = basis.to_euler();
            }
            None => {
                self.track.start_position = Float3::ZERO;
                self.track.start_rotation = Float3::ZERO;
            }
        }

        self.track.elements = instances;
        self.track.touch();
    }

    /// Syncs and writes the current track.
    ///
    /// # Errors
    /// Returns the store's error; the in-memory document is kept either way
    pub fn save(&mut self) -> Result<(), PersistenceError> {
        self.sync_document();
        persistence::save_track(&mut self.store, &self.track).map_err(|e| {
            error!(id = %self.track.id, error = %e, "failed to save track");
            e
        })
    }

    /// Replaces the session's track with the stored one.
    ///
    /// # Errors
    /// `TrackNotFound` if no such track is stored, `Persistence` if it cannot be read
    pub fn load(&mut self, id: &str) -> Result<LoadReport, SessionError> {
        let track = persistence::load_track(&self.store, id)?
            .ok_or_else(|| SessionError::TrackNotFound(id.to_string()))?;
        Ok(self.open(track))
    }

    /// Rebuilds the manager from `track` and makes it the current document.
    pub fn open(&mut self, track: Track) -> LoadReport {
        self.placement.clear();
        let mut report = LoadReport::default();
        for instance in &track.elements {
            match self.placement.restore_instance(
                &self.catalog,
                instance.id,
                &instance.element_id,
                instance.position,
                instance.rotation,
            ) {
                Ok(_) => report.restored += 1,
                Err(e) => {
                    warn!(id = %instance.id, element_id = %instance.element_id, error = %e, "skipping instance");
                    report.skipped.push((instance.id, e));
                }
            }
        }
        info!(id = %track.id, restored = report.restored, skipped = report.skipped.len(), "track opened");
        self.track = track;
        report
    }

    /// # Errors
    /// Returns error if the track cannot be serialized
    pub fn export_archive(&mut self) -> Result<Vec<u8>, PersistenceError> {
        self.sync_document();
        export_track(&self.track)
    }

    /// Opens a track from an exported archive. Nothing is persisted until [`Self::save`].
    ///
    /// # Errors
    /// Returns error if the archive is malformed or from a newer format
    pub fn import_archive(&mut self, data: &[u8]) -> Result<LoadReport, PersistenceError> {
        let track = import_track(data)?;
        Ok(self.open(track))
    }

    /// Adds a custom element. `Ok(false)` means the catalog accepted it but
    /// persisting the custom list failed.
    ///
    /// # Errors
    /// Returns the catalog's rejection
    pub fn add_element(&mut self, element: TrackElement) -> Result<bool, CatalogError> {
        self.catalog.add(element)?;
        Ok(self.persist_catalog())
    }

    /// # Errors
    /// Returns the catalog's rejection
    pub fn update_element(&mut self, element: TrackElement) -> Result<bool, CatalogError> {
        self.catalog.update(element)?;
        Ok(self.persist_catalog())
    }

    /// # Errors
    /// Returns the catalog's rejection
    pub fn remove_element(&mut self, id: &str) -> Result<bool, CatalogError> {
        self.catalog.remove(id)?;
        Ok(self.persist_catalog())
    }

    fn persist_catalog(&mut self) -> bool {
        match persistence::save_custom_elements(&mut self.store, &self.catalog) {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "failed to persist custom elements");
                false
            }
        }
    }

    /// Offers a lap time to the leaderboard. Returns the rank if it made it.
    pub fn record_lap(&mut self, player_name: &str, time: f32) -> Option<usize> {
        let rank = self.track.add_best_time(BestTime::new(player_name, time));
        if let Some(rank) = rank {
            info!(player_name, time, rank, "new best time");
        }
        rank
    }

    /// Drops a vehicle above the start pose.
    pub fn spawn_vehicle(&mut self) -> Option<Vehicle> {
        self.sync_document();
        let up = Matrix3::from_euler(self.track.start_rotation).multiply_vector(Float3::UP);
        let position = self.track.start_position + up * SPAWN_CLEARANCE;
        Vehicle::spawn(
            self.placement.engine_mut(),
            position,
            self.config.vehicle,
            self.config.gravity,
        )
    }
}

fn new_track_id() -> String {
    format!("track-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default())
}
