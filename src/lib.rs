//! TubeTrack - track-element editor core for a tube racer.
//!
//! # Architecture
//!
//! Layered modules with strict inward-only dependencies:
//!
//! - **geometry**: Vector, rotation and rigid-transform math (Float3, Frame, Transform)
//! - **catalog**: Connectors, element templates and the definition store
//! - **track**: Centripetal spline and road mesh generation
//! - **physics**: Engine boundary, headless world, surface-follow gravity, vehicle
//! - **placement**: Placed instances, snapping and the placement manager
//! - **persistence**: Track documents, key-value stores and archives
//! - **session**: Editor session wiring everything to one track
//!
//! # Usage
//!
//! ```ignore
//! use tubetrack::{EditorSession, EngineConfig, HeadlessWorld, MemoryStore};
//!
//! let mut session = EditorSession::new(EngineConfig::default(), HeadlessWorld::new(), MemoryStore::new());
//! let id = session.place("straight-segment", Float3::ZERO, Float3::ZERO)?;
//! ```

pub mod catalog;
pub mod config;
pub mod geometry;
pub mod persistence;
pub mod physics;
pub mod placement;
pub mod session;
pub mod track;

// Re-export commonly used types at crate root
pub use catalog::{Connector, ConnectorType, DefinitionStore, TrackElement};
pub use config::EngineConfig;
pub use geometry::{Float3, Frame, Quaternion, Transform};
pub use persistence::{DirectoryStore, KeyValueStore, MemoryStore, Track};
pub use physics::{HeadlessWorld, PhysicsEngine, Vehicle};
pub use placement::{InstanceId, PlacementManager, SnapOutcome};
pub use session::EditorSession;
