//! [`PackedEntity`] to entity decoding.

use engine_component::{ComponentLibrary, Entity, EntityManager};
use tracing::{debug, warn};

use crate::check::{AllowAll, ComponentCheck, FieldCheck};
use crate::error::PersistError;
use crate::id_table::ComponentIdTable;
use crate::packed::PackedEntity;

/// One decoding pass. Borrows everything it reads.
pub(crate) struct Decoder<'a> {
    pub(crate) library: &'a ComponentLibrary,
    pub(crate) id_table: &'a ComponentIdTable,
    pub(crate) component_check: &'a dyn ComponentCheck,
}

impl Decoder<'_> {
    /// Create an entity for `record` and apply it with every field allowed.
    ///
    /// Delta records start from a fresh instance of their parent prefab.
    pub(crate) fn decode(
        &self,
        manager: &mut dyn EntityManager,
        record: &PackedEntity,
    ) -> Result<Entity, PersistError> {
        record.validate()?;

        let entity = match record.parent_prefab_uri() {
            Some(uri) => manager
                .create_from_prefab(uri)
                .ok_or_else(|| PersistError::UnknownPrefab(uri.to_string()))?,
            None => manager.create(),
        };
        self.decode_onto(manager, entity, record, &AllowAll)?;
        Ok(entity)
    }

    /// Apply `record` onto an existing entity.
    ///
    /// Components are merged field by field into the entity's current
    /// instance (or a default one), then prefab removals are applied. The
    /// record is validated first, so a malformed record leaves the entity
    /// untouched.
    pub(crate) fn decode_onto(
        &self,
        manager: &mut dyn EntityManager,
        entity: Entity,
        record: &PackedEntity,
        field_check: &dyn FieldCheck,
    ) -> Result<(), PersistError> {
        if !manager.exists(entity) {
            return Err(PersistError::EntityNotFound(entity));
        }
        record.validate()?;

        let mut applied = 0usize;
        for packed in record.components() {
            // Skipping a component skips its whole slice, so the next one
            // still starts at the right field position.
            let Some(type_id) = self.id_table.inverse(packed.id) else {
                warn!(id = packed.id, fields = packed.len(), "unknown component id; skipping");
                continue;
            };
            let Some(metadata) = self.library.metadata(type_id) else {
                warn!(component = %type_id, "unregistered component type; skipping");
                continue;
            };
            if !self.component_check.should_serialize(metadata) {
                continue;
            }

            let mut component = match manager.component(entity, type_id) {
                Some(existing) => existing.clone_boxed(),
                None => metadata.new_instance(),
            };
            for (field_id, value) in packed.fields() {
                let Some(field) = metadata.field_by_id(field_id) else {
                    continue;
                };
                if !field_check.should_deserialize_field(field) {
                    continue;
                }
                if let Err(err) = field.deserialize_onto(component.as_mut(), value.clone()) {
                    warn!(
                        component = metadata.name(),
                        error = %err,
                        "failed to apply field; keeping previous value"
                    );
                }
            }
            manager.add_component(entity, component);
            applied += 1;
        }

        let mut removed = 0usize;
        for &id in record.removed_components() {
            let Some(type_id) = self.id_table.inverse(id) else {
                warn!(id, "unknown removed component id; skipping");
                continue;
            };
            let Some(metadata) = self.library.metadata(type_id) else {
                warn!(component = %type_id, "unregistered removed component type; skipping");
                continue;
            };
            if self.component_check.should_serialize(metadata)
                && manager.remove_component(entity, type_id).is_some()
            {
                removed += 1;
            }
        }

        debug!(%entity, applied, removed, "decoded entity");
        Ok(())
    }
}
