//! Entity to [`PackedEntity`] encoding.

use std::collections::HashSet;

use engine_component::{
    ComponentLibrary, ComponentMetadata, ComponentTypeId, Entity, EntityManager, ErasedComponent,
    FieldId, FieldMetadata, FieldValue, Prefab,
};
use tracing::{debug, error};

use crate::check::{ComponentCheck, FieldCheck};
use crate::error::PersistError;
use crate::id_table::{ComponentId, ComponentIdTable};
use crate::packed::{PackedEntity, PackedEntityBuilder};

/// How an entity is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EncodeMode {
    /// Every visible field of every visible component.
    #[default]
    Full,
    /// Only what differs from the entity's parent prefab, plus the prefab
    /// components the entity has lost. Entities without a parent prefab are
    /// written in full.
    Delta,
}

/// What a field that could not be written takes down with it.
enum Dropped {
    /// The field serialised to null.
    Field,
    /// The library failed on the field; the whole component goes.
    Component,
}

/// One encoding pass. Borrows everything it reads.
pub(crate) struct Encoder<'a> {
    pub(crate) library: &'a ComponentLibrary,
    pub(crate) id_table: &'a ComponentIdTable,
    pub(crate) component_check: &'a dyn ComponentCheck,
    pub(crate) field_check: &'a dyn FieldCheck,
}

impl Encoder<'_> {
    pub(crate) fn encode(
        &self,
        manager: &dyn EntityManager,
        entity: Entity,
        mode: EncodeMode,
    ) -> Result<PackedEntity, PersistError> {
        if !manager.exists(entity) {
            return Err(PersistError::EntityNotFound(entity));
        }

        let mut builder = PackedEntityBuilder::new();
        match (mode, manager.parent_prefab(entity)) {
            (EncodeMode::Delta, Some(prefab)) => {
                self.encode_delta(manager, entity, prefab, &mut builder)?;
            }
            _ => {
                for component in manager.components(entity) {
                    if let Some(metadata) = self.visible_metadata(component.component_type()) {
                        self.emit_full(metadata, component, &mut builder)?;
                    }
                }
            }
        }

        let record = builder.build();
        debug!(
            %entity,
            ?mode,
            components = record.component_count(),
            fields = record.field_ids().len(),
            removed = record.removed_components().len(),
            "encoded entity"
        );
        Ok(record)
    }

    fn encode_delta(
        &self,
        manager: &dyn EntityManager,
        entity: Entity,
        prefab: &Prefab,
        builder: &mut PackedEntityBuilder,
    ) -> Result<(), PersistError> {
        builder.set_parent_prefab_uri(prefab.name());
        let mut present = HashSet::new();

        for component in manager.components(entity) {
            let type_id = component.component_type();
            let Some(metadata) = self.visible_metadata(type_id) else {
                continue;
            };
            present.insert(type_id);

            match prefab.component(type_id) {
                Some(original) => self.emit_changed(metadata, original, component, builder)?,
                None => self.emit_full(metadata, component, builder)?,
            }
        }

        for original in prefab.components() {
            let type_id = original.component_type();
            if present.contains(&type_id) {
                continue;
            }
            let Some(metadata) = self.library.metadata(type_id) else {
                continue;
            };
            if !self.component_check.should_serialize(metadata) {
                continue;
            }
            match self.id_table.forward(type_id) {
                Some(id) => {
                    builder.push_removed(id);
                }
                None => error!(
                    component = metadata.name(),
                    "removed prefab component has no id in the id table"
                ),
            }
        }
        Ok(())
    }

    /// Metadata of a component type that takes part in this pass.
    fn visible_metadata(&self, type_id: ComponentTypeId) -> Option<&ComponentMetadata> {
        let Some(metadata) = self.library.metadata(type_id) else {
            error!(component = %type_id, "unregistered component type");
            return None;
        };
        self.component_check
            .should_serialize(metadata)
            .then_some(metadata)
    }

    /// Write every visible field of `component`.
    fn emit_full(
        &self,
        metadata: &ComponentMetadata,
        component: &dyn ErasedComponent,
        builder: &mut PackedEntityBuilder,
    ) -> Result<(), PersistError> {
        let Some(id) = self.component_id(metadata) else {
            return Ok(());
        };

        let mut fields = Vec::with_capacity(metadata.field_count());
        for field in metadata.fields() {
            if !self.field_check.should_serialize_field(field, component) {
                continue;
            }
            match self.serialize_field(metadata, field, component) {
                Ok(value) => fields.push((field.id(), value)),
                Err(Dropped::Field) => {}
                Err(Dropped::Component) => return Ok(()),
            }
        }

        builder.push_component(id, fields)?;
        Ok(())
    }

    /// Write only the fields of `component` that differ from `original`.
    /// Nothing is written if no field differs.
    fn emit_changed(
        &self,
        metadata: &ComponentMetadata,
        original: &dyn ErasedComponent,
        component: &dyn ErasedComponent,
        builder: &mut PackedEntityBuilder,
    ) -> Result<(), PersistError> {
        let mut fields: Vec<(FieldId, FieldValue)> = Vec::new();
        for field in metadata.fields() {
            if !self.field_check.should_serialize_field(field, component)
                || field.values_equal(original, component)
            {
                continue;
            }
            match self.serialize_field(metadata, field, component) {
                Ok(value) => fields.push((field.id(), value)),
                Err(Dropped::Field) => {}
                Err(Dropped::Component) => return Ok(()),
            }
        }

        if fields.is_empty() {
            return Ok(());
        }
        let Some(id) = self.component_id(metadata) else {
            return Ok(());
        };
        builder.push_component(id, fields)?;
        Ok(())
    }

    fn component_id(&self, metadata: &ComponentMetadata) -> Option<ComponentId> {
        let id = self.id_table.forward(metadata.type_id());
        if id.is_none() {
            error!(
                component = metadata.name(),
                "component has no id in the id table; dropping it"
            );
        }
        id
    }

    /// Drops are logged here.
    fn serialize_field(
        &self,
        metadata: &ComponentMetadata,
        field: &FieldMetadata,
        component: &dyn ErasedComponent,
    ) -> Result<FieldValue, Dropped> {
        match field.serialize(component) {
            Ok(Some(value)) => Ok(value),
            Ok(None) => {
                error!(
                    component = metadata.name(),
                    field = %field,
                    "field serialised to null; dropping it"
                );
                Err(Dropped::Field)
            }
            Err(err) => {
                error!(
                    component = metadata.name(),
                    error = %err,
                    "failed to serialise component; dropping it"
                );
                Err(Dropped::Component)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use engine_component::{ComponentMetadata, Entity};
    use serde_json::json;

    use super::*;
    use crate::check::{AllowAll, PersistedOnly, ReplicatedFields, ReplicatedOnly};
    use crate::test_support::*;

    fn is_sub_record(sub: &PackedEntity, full: &PackedEntity) -> bool {
        let mut rest = full.components();
        sub.components().all(|small| {
            rest.by_ref().any(|big| {
                big.id == small.id && {
                    let mut big_fields = big.fields();
                    small
                        .fields()
                        .all(|field| big_fields.by_ref().any(|other| other == field))
                }
            })
        })
    }

    #[test]
    fn test_full_two_components() {
        let mut serializer = serializer();
        let world = serializer.entity_manager_mut();
        let entity = world.spawn();
        world.insert(entity, Alpha { f0: 7, f1: "x".into() });
        world.insert(entity, Beta { f0: true });

        let record = serializer.encode(entity, EncodeMode::Full, &AllowAll).unwrap();
        assert_eq!(record.component_ids(), &[ALPHA, BETA]);
        assert_eq!(record.component_field_counts(), &[2, 1]);
        assert_eq!(record.field_ids(), &[0, 1, 0]);
        assert_eq!(record.field_values(), &[json!(7), json!("x"), json!(true)]);
        assert_eq!(record.parent_prefab_uri(), None);
        assert!(record.removed_components().is_empty());
    }

    #[test]
    fn test_delta_identical_to_prefab_is_empty() {
        let mut serializer = serializer();
        let entity = serializer.entity_manager_mut().spawn_from_prefab(PREFAB).unwrap();

        let record = serializer.encode(entity, EncodeMode::Delta, &AllowAll).unwrap();
        assert_eq!(record.parent_prefab_uri(), Some(PREFAB));
        assert!(record.component_ids().is_empty());
        assert!(record.component_field_counts().is_empty());
        assert!(record.field_ids().is_empty());
        assert!(record.field_values().is_empty());
        assert!(record.removed_components().is_empty());
    }

    #[test]
    fn test_delta_one_changed_field() {
        let mut serializer = serializer();
        let world = serializer.entity_manager_mut();
        let entity = world.spawn_from_prefab(PREFAB).unwrap();
        world.get_mut::<Counter>(entity).unwrap().f1 = 2;

        let record = serializer.encode(entity, EncodeMode::Delta, &AllowAll).unwrap();
        assert_eq!(record.component_ids(), &[COUNTER]);
        assert_eq!(record.component_field_counts(), &[1]);
        assert_eq!(record.field_ids(), &[1]);
        assert_eq!(record.field_values(), &[json!(2)]);
    }

    #[test]
    fn test_delta_removed_component() {
        let mut serializer = serializer();
        let world = serializer.entity_manager_mut();
        let entity = world.spawn_from_prefab(PREFAB).unwrap();
        world.remove::<Beta>(entity).unwrap();

        let record = serializer.encode(entity, EncodeMode::Delta, &AllowAll).unwrap();
        assert_eq!(record.removed_components(), &[BETA]);
        assert!(!record.component_ids().contains(&BETA));
    }

    #[test]
    fn test_delta_removal_respects_component_check() {
        let mut serializer = serializer();
        serializer.set_component_check(|m: &ComponentMetadata| m.name() != "Beta");
        let world = serializer.entity_manager_mut();
        let entity = world.spawn_from_prefab(PREFAB).unwrap();
        world.remove::<Beta>(entity).unwrap();

        let record = serializer.encode(entity, EncodeMode::Delta, &AllowAll).unwrap();
        assert!(record.removed_components().is_empty());
    }

    #[test]
    fn test_delta_added_component_is_written_in_full() {
        let mut serializer = serializer();
        let world = serializer.entity_manager_mut();
        let entity = world.spawn_from_prefab(PREFAB).unwrap();
        world.insert(entity, Alpha { f0: 0, f1: String::new() });

        let record = serializer.encode(entity, EncodeMode::Delta, &AllowAll).unwrap();
        assert_eq!(record.component_ids(), &[ALPHA]);
        // Default values are still written: the prefab has nothing to diff against.
        assert_eq!(record.field_values(), &[json!(0), json!("")]);
    }

    #[test]
    fn test_delta_without_prefab_falls_back_to_full() {
        let mut serializer = serializer();
        let world = serializer.entity_manager_mut();
        let entity = world.spawn();
        world.insert(entity, Beta { f0: false });

        let delta = serializer.encode(entity, EncodeMode::Delta, &AllowAll).unwrap();
        let full = serializer.encode(entity, EncodeMode::Full, &AllowAll).unwrap();
        assert_eq!(delta, full);
        assert!(!delta.is_delta());
    }

    #[test]
    fn test_full_mode_ignores_prefab() {
        let mut serializer = serializer();
        let entity = serializer.entity_manager_mut().spawn_from_prefab(PREFAB).unwrap();

        let record = serializer.encode(entity, EncodeMode::Full, &AllowAll).unwrap();
        assert_eq!(record.parent_prefab_uri(), None);
        assert_eq!(record.component_ids(), &[COUNTER, BETA]);
        assert_eq!(record.component_field_counts(), &[2, 1]);
    }

    #[test]
    fn test_field_count_overflow_is_fatal() {
        let mut serializer = serializer();
        let world = serializer.entity_manager_mut();
        let entity = world.spawn();
        world.insert(entity, Beta { f0: true });
        world.insert(entity, Wide::default());

        let err = serializer.encode(entity, EncodeMode::Full, &AllowAll).unwrap_err();
        assert!(matches!(
            err,
            PersistError::FieldCountOverflow {
                component_id: WIDE,
                count: WIDE_FIELDS
            }
        ));
    }

    #[test]
    fn test_null_field_is_dropped() {
        let mut serializer = serializer();
        let world = serializer.entity_manager_mut();
        let entity = world.spawn();
        world.insert(entity, Note { text: None, pinned: true });

        let record = serializer.encode(entity, EncodeMode::Full, &AllowAll).unwrap();
        assert_eq!(record.component_ids(), &[NOTE]);
        assert_eq!(record.component_field_counts(), &[1]);
        assert_eq!(record.field_ids(), &[1]);
        assert_eq!(record.field_values(), &[json!(true)]);
    }

    #[test]
    fn test_delta_null_field_is_dropped() {
        let mut serializer = serializer();
        let world = serializer.entity_manager_mut();
        let entity = world.spawn_from_prefab(EXTRAS).unwrap();
        let note = world.get_mut::<Note>(entity).unwrap();
        note.text = None;
        note.pinned = true;

        let record = serializer.encode(entity, EncodeMode::Delta, &AllowAll).unwrap();
        assert_eq!(record.component_ids(), &[NOTE]);
        assert_eq!(record.component_field_counts(), &[1]);
        assert_eq!(record.field_ids(), &[1]);
        assert_eq!(record.field_values(), &[json!(true)]);
    }

    #[test]
    fn test_library_fault_drops_only_that_component() {
        let mut serializer = serializer();
        let world = serializer.entity_manager_mut();
        let entity = world.spawn();
        world.insert(entity, Faulty { links: HashMap::from([((1, 2), 3)]) });
        world.insert(entity, Beta { f0: true });

        let record = serializer.encode(entity, EncodeMode::Full, &AllowAll).unwrap();
        assert_eq!(record.component_ids(), &[BETA]);
        assert_eq!(record.component_field_counts(), &[1]);
        assert_eq!(record.field_ids(), &[0]);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_delta_library_fault_drops_only_that_component() {
        let mut serializer = serializer();
        let world = serializer.entity_manager_mut();
        let entity = world.spawn_from_prefab(EXTRAS).unwrap();
        world
            .get_mut::<Faulty>(entity)
            .unwrap()
            .links
            .insert((4, 5), 6);
        world.get_mut::<Beta>(entity).unwrap().f0 = true;

        let record = serializer.encode(entity, EncodeMode::Delta, &AllowAll).unwrap();
        assert_eq!(record.parent_prefab_uri(), Some(EXTRAS));
        assert_eq!(record.component_ids(), &[BETA]);
        assert_eq!(record.field_values(), &[json!(true)]);
        assert!(record.removed_components().is_empty());
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_unregistered_and_unmapped_components_are_dropped() {
        let mut serializer = serializer();
        let world = serializer.entity_manager_mut();
        let entity = world.spawn();
        world.insert(entity, Stray);
        world.insert(entity, Unmapped { value: 3 });
        world.insert(entity, Beta { f0: true });

        let record = serializer.encode(entity, EncodeMode::Full, &AllowAll).unwrap();
        assert_eq!(record.component_ids(), &[BETA]);
        assert_eq!(record.component_field_counts(), &[1]);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_component_without_visible_fields_keeps_its_slot() {
        let mut serializer = serializer();
        let world = serializer.entity_manager_mut();
        let entity = world.spawn();
        world.insert(entity, Counter { f0: 4, f1: 5 });

        let record = serializer.encode(entity, EncodeMode::Full, &ReplicatedFields).unwrap();
        assert_eq!(record.component_ids(), &[COUNTER]);
        assert_eq!(record.component_field_counts(), &[0]);
    }

    #[test]
    fn test_stricter_policies_give_sub_records() {
        let mut serializer = serializer();
        let world = serializer.entity_manager_mut();
        let entity = world.spawn();
        world.insert(entity, Alpha { f0: 1, f1: "a".into() });
        world.insert(entity, Session { shared: 2, local: 3 });
        world.insert(entity, Counter { f0: 4, f1: 5 });

        let everything = serializer.encode(entity, EncodeMode::Full, &AllowAll).unwrap();
        let replicated_fields = serializer
            .encode(entity, EncodeMode::Full, &ReplicatedFields)
            .unwrap();
        assert!(is_sub_record(&replicated_fields, &everything));
        assert_eq!(replicated_fields.field_ids(), &[0, 0]);

        serializer.set_component_check(PersistedOnly);
        let persisted = serializer.encode(entity, EncodeMode::Full, &AllowAll).unwrap();
        assert_eq!(persisted.component_ids(), &[ALPHA, COUNTER]);
        assert!(is_sub_record(&persisted, &everything));

        serializer.set_component_check(ReplicatedOnly);
        let replicated = serializer
            .encode(entity, EncodeMode::Full, &ReplicatedFields)
            .unwrap();
        assert_eq!(replicated.component_ids(), &[ALPHA, SESSION]);
        assert!(is_sub_record(&replicated, &replicated_fields));
    }

    #[test]
    fn test_missing_entity() {
        let serializer = serializer();
        let err = serializer
            .encode(Entity::from_raw(404), EncodeMode::Full, &AllowAll)
            .unwrap_err();
        assert!(matches!(err, PersistError::EntityNotFound(_)));
    }

    #[test]
    fn test_unchanged_component_is_never_emitted_in_delta() {
        let mut serializer = serializer();
        let world = serializer.entity_manager_mut();
        let entity = world.spawn_from_prefab(PREFAB).unwrap();
        world.get_mut::<Counter>(entity).unwrap().f0 = 9;

        let record = serializer.encode(entity, EncodeMode::Delta, &AllowAll).unwrap();
        assert!(!record.component_ids().contains(&BETA));
        assert_eq!(record.component_ids(), &[COUNTER]);
        assert_eq!(record.field_ids(), &[0]);
    }
}
