//! World state storage.
//!
//! The [`World`] owns entity identities, each entity's ordered component
//! set and the prefab registry. It implements [`EntityManager`] so the
//! persistence layer can read and rebuild entities without knowing how
//! they are stored.

use std::collections::HashMap;

use engine_component::{
    Component, ComponentTypeId, Entity, EntityAllocator, EntityManager, ErasedComponent, Prefab,
};
use tracing::{debug, warn};

/// A single entity's data.
#[derive(Debug, Default)]
struct EntityRecord {
    /// Components in insertion order. Replacing a component keeps its slot.
    components: Vec<Box<dyn ErasedComponent>>,
    /// URI of the prefab this entity was instantiated from.
    parent_prefab: Option<String>,
}

impl EntityRecord {
    fn position(&self, type_id: ComponentTypeId) -> Option<usize> {
        self.components
            .iter()
            .position(|component| component.component_type() == type_id)
    }
}

/// Canonical entity storage.
#[derive(Debug, Default)]
pub struct World {
    /// Entity ID allocator.
    allocator: EntityAllocator,
    /// Live entities.
    entities: HashMap<Entity, EntityRecord>,
    /// Registered prefabs, keyed by URI.
    prefabs: HashMap<String, Prefab>,
}

impl World {
    /// Create a new empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a prefab under its name. Returns the prefab it replaced.
    pub fn register_prefab(&mut self, prefab: Prefab) -> Option<Prefab> {
        self.prefabs.insert(prefab.name().to_string(), prefab)
    }

    /// Returns the prefab registered under `uri`.
    #[must_use]
    pub fn prefab(&self, uri: &str) -> Option<&Prefab> {
        self.prefabs.get(uri)
    }

    /// Allocate a new entity without any components.
    pub fn spawn(&mut self) -> Entity {
        let entity = self.allocator.allocate();
        self.entities.insert(entity, EntityRecord::default());
        entity
    }

    /// Allocate a new entity as a copy of a registered prefab.
    ///
    /// Returns `None` if no prefab is registered under `uri`.
    pub fn spawn_from_prefab(&mut self, uri: &str) -> Option<Entity> {
        let Some(prefab) = self.prefabs.get(uri) else {
            warn!(prefab = uri, "cannot instantiate unknown prefab");
            return None;
        };
        let record = EntityRecord {
            components: prefab.instantiate(),
            parent_prefab: Some(uri.to_string()),
        };
        let entity = self.allocator.allocate();
        debug!(%entity, prefab = uri, "spawned entity from prefab");
        self.entities.insert(entity, record);
        Some(entity)
    }

    /// Destroy an entity and all of its components.
    ///
    /// Returns `true` if the entity existed.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        self.entities.remove(&entity).is_some()
    }

    /// Attach a typed component. Returns `false` if the entity is unknown.
    pub fn insert<C: Component>(&mut self, entity: Entity, component: C) -> bool {
        self.add_component(entity, Box::new(component))
    }

    /// Typed access to a component.
    #[must_use]
    pub fn get<C: Component>(&self, entity: Entity) -> Option<&C> {
        self.component(entity, C::component_type_id())
            .and_then(|component| component.downcast_ref::<C>())
    }

    /// Typed mutable access to a component.
    #[must_use]
    pub fn get_mut<C: Component>(&mut self, entity: Entity) -> Option<&mut C> {
        let record = self.entities.get_mut(&entity)?;
        let index = record.position(C::component_type_id())?;
        record.components[index].downcast_mut::<C>()
    }

    /// Detach a typed component.
    pub fn remove<C: Component>(&mut self, entity: Entity) -> Option<C> {
        let removed = self.remove_component(entity, C::component_type_id())?;
        removed.downcast_ref::<C>().cloned()
    }

    /// The component types attached to `entity`, in storage order.
    #[must_use]
    pub fn component_types(&self, entity: Entity) -> Vec<ComponentTypeId> {
        self.components(entity)
            .map(|component| component.component_type())
            .collect()
    }

    /// All live entities, sorted by id.
    #[must_use]
    pub fn entities(&self) -> Vec<Entity> {
        let mut entities: Vec<_> = self.entities.keys().copied().collect();
        entities.sort_unstable();
        entities
    }

    /// Returns the number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }
}

impl EntityManager for World {
    fn create(&mut self) -> Entity {
        self.spawn()
    }

    fn create_from_prefab(&mut self, prefab_uri: &str) -> Option<Entity> {
        self.spawn_from_prefab(prefab_uri)
    }

    fn exists(&self, entity: Entity) -> bool {
        self.entities.contains_key(&entity)
    }

    fn components(&self, entity: Entity) -> Box<dyn Iterator<Item = &dyn ErasedComponent> + '_> {
        match self.entities.get(&entity) {
            Some(record) => Box::new(record.components.iter().map(|component| &**component)),
            None => Box::new(std::iter::empty()),
        }
    }

    fn parent_prefab(&self, entity: Entity) -> Option<&Prefab> {
        let uri = self.entities.get(&entity)?.parent_prefab.as_deref()?;
        self.prefabs.get(uri)
    }

    fn component(&self, entity: Entity, type_id: ComponentTypeId) -> Option<&dyn ErasedComponent> {
        let record = self.entities.get(&entity)?;
        record
            .position(type_id)
            .map(|index| &*record.components[index])
    }

    fn add_component(&mut self, entity: Entity, component: Box<dyn ErasedComponent>) -> bool {
        let Some(record) = self.entities.get_mut(&entity) else {
            return false;
        };
        match record.position(component.component_type()) {
            Some(index) => record.components[index] = component,
            None => record.components.push(component),
        }
        true
    }

    fn remove_component(
        &mut self,
        entity: Entity,
        type_id: ComponentTypeId,
    ) -> Option<Box<dyn ErasedComponent>> {
        let record = self.entities.get_mut(&entity)?;
        let index = record.position(type_id)?;
        Some(record.components.remove(index))
    }
}
