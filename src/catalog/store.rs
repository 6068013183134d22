use std::collections::HashSet;
use tracing::{debug, warn};

use super::defaults::{default_elements, DEFAULT_ELEMENT_IDS};
use super::element::{ElementDefect, TrackElement};

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogError {
    DuplicateId(String),
    NotFound(String),
    RejectedDefaultMutation(String),
    InvalidElement { id: String, defect: ElementDefect },
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::DuplicateId(id) => write!(f, "element id '{id}' already exists"),
            CatalogError::NotFound(id) => write!(f, "element '{id}' not found"),
            CatalogError::RejectedDefaultMutation(id) => {
                write!(f, "built-in element '{id}' cannot be modified")
            }
            CatalogError::InvalidElement { id, defect } => {
                write!(f, "element '{id}' is invalid: {defect}")
            }
        }
    }
}

impl std::error::Error for CatalogError {}

/// Catalog of element templates: the built-in defaults plus user-authored custom elements.
///
/// Constructed explicitly and handed to collaborators; there is no global instance.
#[derive(Debug, Clone)]
pub struct DefinitionStore {
    elements: Vec<TrackElement>,
    default_ids: HashSet<String>,
}

impl DefinitionStore {
    /// Catalog holding only the built-in elements.
    pub fn new() -> Self {
        Self::with_defaults(default_elements())
    }

    pub(crate) fn with_defaults(defaults: Vec<TrackElement>) -> Self {
        let default_ids = defaults.iter().map(|e| e.id.clone()).collect();
        Self {
            elements: defaults,
            default_ids,
        }
    }

    pub fn get_all(&self) -> &[TrackElement] {
        &self.elements
    }

    pub fn get_by_id(&self, id: &str) -> Option<&TrackElement> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn is_default(&self, id: &str) -> bool {
        self.default_ids.contains(id) || DEFAULT_ELEMENT_IDS.contains(&id)
    }

    pub fn custom_elements(&self) -> impl Iterator<Item = &TrackElement> {
        self.elements.iter().filter(|e| !self.is_default(&e.id))
    }

    pub fn add(&mut self, element: TrackElement) -> Result<(), CatalogError> {
        if self.get_by_id(&element.id).is_some() || self.is_default(&element.id) {
            warn!(id = %element.id, "rejected catalog add: duplicate id");
            return Err(CatalogError::DuplicateId(element.id));
        }
        validate(&element)?;
        debug!(id = %element.id, "custom element added");
        self.elements.push(element);
        Ok(())
    }

    pub fn update(&mut self, element: TrackElement) -> Result<(), CatalogError> {
        if self.is_default(&element.id) {
            warn!(id = %element.id, "rejected catalog update of built-in element");
            return Err(CatalogError::RejectedDefaultMutation(element.id));
        }
        let Some(index) = self.elements.iter().position(|e| e.id == element.id) else {
            return Err(CatalogError::NotFound(element.id));
        };
        validate(&element)?;
        debug!(id = %element.id, "custom element updated");
        self.elements[index] = element;
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Result<TrackElement, CatalogError> {
        if self.is_default(id) {
            warn!(id, "rejected catalog removal of built-in element");
            return Err(CatalogError::RejectedDefaultMutation(id.to_string()));
        }
        let Some(index) = self.elements.iter().position(|e| e.id == id) else {
            return Err(CatalogError::NotFound(id.to_string()));
        };
        debug!(id, "custom element removed");
        Ok(self.elements.remove(index))
    }

    /// Merges externally loaded custom elements. Defaults win on id collision;
    /// colliding and invalid entries are dropped. Returns how many were accepted.
    pub fn merge_custom(&mut self, custom: Vec<TrackElement>) -> usize {
        let mut accepted = 0;
        for element in custom {
            if self.is_default(&element.id) {
                warn!(id = %element.id, "dropping custom element that collides with a built-in id");
                continue;
            }
            if let Err(defect) = element.validate() {
                warn!(id = %element.id, %defect, "dropping invalid custom element");
                continue;
            }
            match self.elements.iter().position(|e| e.id == element.id) {
                Some(index) => self.elements[index] = element,
                None => self.elements.push(element),
            }
            accepted += 1;
        }
        accepted
    }
}

impl Default for DefinitionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn validate(element: &TrackElement) -> Result<(), CatalogError> {
    element.validate().map_err(|defect| {
        warn!(id = %element.id, %defect, "rejected invalid element");
        CatalogError::InvalidElement {
            id: element.id.clone(),
            defect,
        }
    })
}
