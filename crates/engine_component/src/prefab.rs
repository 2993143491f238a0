//! Prefabs: named template entities.
//!
//! A [`Prefab`] holds one instance of each of its component types. Entities
//! created from a prefab start as copies of those components and remember
//! the prefab as their parent, which lets the persistence layer store only
//! what differs from it.

use std::fmt;

use crate::component::{Component, ComponentTypeId, ErasedComponent};

/// A named template entity.
pub struct Prefab {
    name: String,
    components: Vec<Box<dyn ErasedComponent>>,
}

impl Prefab {
    /// Create an empty prefab. `name` is the URI entities refer to it by.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: Vec::new(),
        }
    }

    /// Add (or replace) a component, builder style.
    #[must_use]
    pub fn with<C: Component>(mut self, component: C) -> Self {
        self.insert(Box::new(component));
        self
    }

    /// Add a component, replacing any existing one of the same type in place.
    pub fn insert(&mut self, component: Box<dyn ErasedComponent>) {
        let type_id = component.component_type();
        match self
            .components
            .iter_mut()
            .find(|existing| existing.component_type() == type_id)
        {
            Some(slot) => *slot = component,
            None => self.components.push(component),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Components in insertion order.
    pub fn components(&self) -> impl Iterator<Item = &dyn ErasedComponent> {
        self.components.iter().map(|component| &**component)
    }

    #[must_use]
    pub fn component(&self, type_id: ComponentTypeId) -> Option<&dyn ErasedComponent> {
        self.components()
            .find(|component| component.component_type() == type_id)
    }

    #[must_use]
    pub fn get<C: Component>(&self) -> Option<&C> {
        self.component(C::component_type_id())
            .and_then(|component| component.downcast_ref::<C>())
    }

    /// Fresh copies of every component, for instantiating an entity.
    #[must_use]
    pub fn instantiate(&self) -> Vec<Box<dyn ErasedComponent>> {
        self.components
            .iter()
            .map(|component| component.clone_boxed())
            .collect()
    }
}

impl Clone for Prefab {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            components: self.instantiate(),
        }
    }
}

impl fmt::Debug for Prefab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Prefab")
            .field("name", &self.name)
            .field("components", &self.components)
            .finish()
    }
}
