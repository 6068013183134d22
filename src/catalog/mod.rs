//! Track-element definitions: connectors, templates and the catalog store.

mod connector;
pub mod defaults;
mod element;
mod store;

pub use connector::{Connector, ConnectorFrame, ConnectorType};
pub use element::{ElementDefect, TrackElement};
pub use store::{CatalogError, DefinitionStore};
