//! Placed instances, selection, dragging and connector snapping.

mod instance;
mod manager;
pub mod snap;

pub use instance::{InstanceId, TrackElementInstance, WorldConnector};
pub use manager::{PlacementError, PlacementManager, Selection, SelectionListener, SnapOutcome};
pub use snap::SnapCandidate;
