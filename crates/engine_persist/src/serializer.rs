//! The public serializer.

use std::sync::Arc;

use engine_component::{ComponentLibrary, Entity, EntityManager};
use parking_lot::RwLock;

use crate::check::{AllowAll, ComponentCheck, FieldCheck};
use crate::decode::Decoder;
use crate::encode::{EncodeMode, Encoder};
use crate::error::PersistError;
use crate::id_table::ComponentIdTable;
use crate::packed::PackedEntity;

/// Packs entities of an [`EntityManager`] into [`PackedEntity`] records and
/// back.
///
/// The serializer owns (or mutably borrows, via `&mut M`) the entity
/// manager, shares the component library, and holds the current
/// [`ComponentIdTable`]. The table can be replaced through a shared
/// reference at any time; every call reads it exactly once, so a call sees
/// either the old or the new table, never a mix.
///
/// ```ignore
/// let library = Arc::new(library);
/// let mut serializer = PackedEntitySerializer::new(world, library.clone());
/// serializer.set_id_mapping(ComponentIdTable::from_library(&library));
///
/// let record = serializer.encode(entity, EncodeMode::Delta, &AllowAll)?;
/// let copy = serializer.decode(&record)?;
/// ```
pub struct PackedEntitySerializer<M: EntityManager> {
    entity_manager: M,
    library: Arc<ComponentLibrary>,
    component_check: Arc<dyn ComponentCheck>,
    id_table: RwLock<Arc<ComponentIdTable>>,
}

impl<M: EntityManager> PackedEntitySerializer<M> {
    /// Create a serializer with an empty id table and a component check
    /// that lets everything through.
    pub fn new(entity_manager: M, library: Arc<ComponentLibrary>) -> Self {
        Self {
            entity_manager,
            library,
            component_check: Arc::new(AllowAll),
            id_table: RwLock::new(Arc::new(ComponentIdTable::new())),
        }
    }

    /// Replace the component check used by every later call.
    pub fn set_component_check(&mut self, check: impl ComponentCheck + 'static) {
        self.component_check = Arc::new(check);
    }

    pub fn component_check(&self) -> &dyn ComponentCheck {
        self.component_check.as_ref()
    }

    pub fn component_library(&self) -> &Arc<ComponentLibrary> {
        &self.library
    }

    pub fn entity_manager(&self) -> &M {
        &self.entity_manager
    }

    pub fn entity_manager_mut(&mut self) -> &mut M {
        &mut self.entity_manager
    }

    /// Give back the entity manager.
    pub fn into_inner(self) -> M {
        self.entity_manager
    }

    /// The current id table.
    pub fn id_mapping(&self) -> Arc<ComponentIdTable> {
        Arc::clone(&self.id_table.read())
    }

    /// Swap in a new id table.
    pub fn set_id_mapping(&self, table: impl Into<Arc<ComponentIdTable>>) {
        *self.id_table.write() = table.into();
    }

    /// Pack `entity`.
    ///
    /// # Errors
    ///
    /// [`PersistError::EntityNotFound`] if the entity does not exist, and
    /// [`PersistError::FieldCountOverflow`] if a component has more than
    /// 255 visible fields. Other problems drop the affected field or
    /// component and are logged.
    pub fn encode(
        &self,
        entity: Entity,
        mode: EncodeMode,
        field_check: &dyn FieldCheck,
    ) -> Result<PackedEntity, PersistError> {
        let id_table = self.id_mapping();
        Encoder {
            library: &self.library,
            id_table: &id_table,
            component_check: self.component_check.as_ref(),
            field_check,
        }
        .encode(&self.entity_manager, entity, mode)
    }

    /// Apply `record` onto `entity` with every field allowed.
    ///
    /// # Errors
    ///
    /// See [`decode_onto_with`](Self::decode_onto_with).
    pub fn decode_onto(&mut self, entity: Entity, record: &PackedEntity) -> Result<(), PersistError> {
        self.decode_onto_with(entity, record, &AllowAll)
    }

    /// Apply `record` onto `entity`, filtering fields with `field_check`.
    ///
    /// # Errors
    ///
    /// [`PersistError::EntityNotFound`] if the entity does not exist and
    /// [`PersistError::MalformedRecord`] if the record's arrays disagree;
    /// the entity is not touched in either case.
    pub fn decode_onto_with(
        &mut self,
        entity: Entity,
        record: &PackedEntity,
        field_check: &dyn FieldCheck,
    ) -> Result<(), PersistError> {
        let id_table = self.id_mapping();
        Decoder {
            library: &self.library,
            id_table: &id_table,
            component_check: self.component_check.as_ref(),
        }
        .decode_onto(&mut self.entity_manager, entity, record, field_check)
    }

    /// Create a new entity from `record`.
    ///
    /// # Errors
    ///
    /// [`PersistError::MalformedRecord`] for an inconsistent record and
    /// [`PersistError::UnknownPrefab`] if its parent prefab is not
    /// registered. No entity is created in either case.
    pub fn decode(&mut self, record: &PackedEntity) -> Result<Entity, PersistError> {
        let id_table = self.id_mapping();
        Decoder {
            library: &self.library,
            id_table: &id_table,
            component_check: self.component_check.as_ref(),
        }
        .decode(&mut self.entity_manager, record)
    }
}

impl<M: EntityManager> std::fmt::Debug for PackedEntitySerializer<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackedEntitySerializer")
            .field("components", &self.library.len())
            .field("id_table", &self.id_table.read().len())
            .finish_non_exhaustive()
    }
}
