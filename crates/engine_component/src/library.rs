//! Component library: the registry of component metadata.
//!
//! Every component type that should be persisted or replicated registers a
//! [`ComponentMetadata`] here at startup. Afterwards the library is treated
//! as read-only and is usually shared behind an `Arc`.

use std::collections::HashMap;

use crate::component::ComponentTypeId;
use crate::metadata::{ComponentMetadata, MetadataError};

/// Registry of all known component descriptors.
#[derive(Debug, Default)]
pub struct ComponentLibrary {
    /// Descriptors keyed by type id.
    metadata: HashMap<ComponentTypeId, ComponentMetadata>,
    /// Maps component names to type ids.
    names: HashMap<&'static str, ComponentTypeId>,
}

impl ComponentLibrary {
    /// Create a new empty library.
    #[must_use]
    pub fn new() -> Self {
        Self {
            metadata: HashMap::new(),
            names: HashMap::new(),
        }
    }

    /// Register a component descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::AlreadyRegistered`] if a descriptor for the
    /// same type (or the same name) is already present.
    pub fn register(&mut self, metadata: ComponentMetadata) -> Result<(), MetadataError> {
        if self.metadata.contains_key(&metadata.type_id())
            || self.names.contains_key(metadata.name())
        {
            return Err(MetadataError::AlreadyRegistered(metadata.name()));
        }
        self.names.insert(metadata.name(), metadata.type_id());
        self.metadata.insert(metadata.type_id(), metadata);
        Ok(())
    }

    /// Returns the descriptor for a component type, if registered.
    #[must_use]
    pub fn metadata(&self, type_id: ComponentTypeId) -> Option<&ComponentMetadata> {
        self.metadata.get(&type_id)
    }

    /// Returns the descriptor for a component name, if registered.
    #[must_use]
    pub fn metadata_by_name(&self, name: &str) -> Option<&ComponentMetadata> {
        self.names
            .get(name)
            .and_then(|type_id| self.metadata.get(type_id))
    }

    /// Returns an iterator over all registered descriptors (unordered).
    pub fn iter(&self) -> impl Iterator<Item = &ComponentMetadata> {
        self.metadata.values()
    }

    /// Returns the number of registered component types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }
}
