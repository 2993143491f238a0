//! The [`EntityManager`] contract.
//!
//! Entity storage lives elsewhere (see the `engine_world` crate); this trait
//! is the narrow surface that serialisation code needs: create identities,
//! walk and look up components, attach and detach them.

use crate::component::{ComponentTypeId, ErasedComponent};
use crate::entity::Entity;
use crate::prefab::Prefab;

/// Owner of entity identities and their components.
pub trait EntityManager {
    /// Create a bare entity with no components.
    fn create(&mut self) -> Entity;

    /// Create an entity populated from the prefab registered under
    /// `prefab_uri`. Returns `None` if no such prefab exists.
    fn create_from_prefab(&mut self, prefab_uri: &str) -> Option<Entity>;

    /// Returns `true` if `entity` is alive.
    fn exists(&self, entity: Entity) -> bool;

    /// The entity's components in a stable order (insertion order).
    ///
    /// Yields nothing for an unknown entity.
    fn components(&self, entity: Entity) -> Box<dyn Iterator<Item = &dyn ErasedComponent> + '_>;

    /// The prefab the entity was created from, if any.
    fn parent_prefab(&self, entity: Entity) -> Option<&Prefab>;

    /// The entity's component of the given type, if present.
    fn component(&self, entity: Entity, type_id: ComponentTypeId) -> Option<&dyn ErasedComponent>;

    /// Attach a component, replacing an existing one of the same type in
    /// place. Returns `false` if the entity does not exist.
    fn add_component(&mut self, entity: Entity, component: Box<dyn ErasedComponent>) -> bool;

    /// Detach and return the component of the given type.
    fn remove_component(
        &mut self,
        entity: Entity,
        type_id: ComponentTypeId,
    ) -> Option<Box<dyn ErasedComponent>>;
}

impl<M: EntityManager + ?Sized> EntityManager for &mut M {
    fn create(&mut self) -> Entity {
        (**self).create()
    }

    fn create_from_prefab(&mut self, prefab_uri: &str) -> Option<Entity> {
        (**self).create_from_prefab(prefab_uri)
    }

    fn exists(&self, entity: Entity) -> bool {
        (**self).exists(entity)
    }

    fn components(&self, entity: Entity) -> Box<dyn Iterator<Item = &dyn ErasedComponent> + '_> {
        (**self).components(entity)
    }

    fn parent_prefab(&self, entity: Entity) -> Option<&Prefab> {
        (**self).parent_prefab(entity)
    }

    fn component(&self, entity: Entity, type_id: ComponentTypeId) -> Option<&dyn ErasedComponent> {
        (**self).component(entity, type_id)
    }

    fn add_component(&mut self, entity: Entity, component: Box<dyn ErasedComponent>) -> bool {
        (**self).add_component(entity, component)
    }

    fn remove_component(
        &mut self,
        entity: Entity,
        type_id: ComponentTypeId,
    ) -> Option<Box<dyn ErasedComponent>> {
        (**self).remove_component(entity, type_id)
    }
}
