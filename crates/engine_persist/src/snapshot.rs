//! Whole-world snapshots.
//!
//! A [`WorldSnapshot`] bundles packed entities with the id table they were
//! written against, by component name, so it can be restored by a process
//! whose numeric ids differ.

use engine_component::{Entity, EntityManager};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::check::FieldCheck;
use crate::encode::EncodeMode;
use crate::error::PersistError;
use crate::id_table::{ComponentIdTable, IdMappingEntry};
use crate::packed::PackedEntity;
use crate::serializer::PackedEntitySerializer;

/// Packed entities plus the id table they refer to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub id_mapping: Vec<IdMappingEntry>,
    pub entities: Vec<PackedEntity>,
}

impl WorldSnapshot {
    /// Pack `entities` with the serializer's current id table.
    ///
    /// # Errors
    ///
    /// Fails on the first entity that fails to encode.
    pub fn capture<M: EntityManager>(
        serializer: &PackedEntitySerializer<M>,
        entities: impl IntoIterator<Item = Entity>,
        mode: EncodeMode,
        field_check: &dyn FieldCheck,
    ) -> Result<Self, PersistError> {
        let id_mapping = serializer
            .id_mapping()
            .to_named(serializer.component_library());
        let entities = entities
            .into_iter()
            .map(|entity| serializer.encode(entity, mode, field_check))
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            entities = entities.len(),
            components = id_mapping.len(),
            "captured snapshot"
        );
        Ok(Self {
            id_mapping,
            entities,
        })
    }

    /// Install the snapshot's id table on `serializer` and decode every
    /// entity as a new one.
    ///
    /// Components named in the snapshot but not registered locally are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Fails if the id table is not one-to-one, or on the first entity that
    /// fails to decode.
    pub fn restore<M: EntityManager>(
        &self,
        serializer: &mut PackedEntitySerializer<M>,
    ) -> Result<Vec<Entity>, PersistError> {
        let table = ComponentIdTable::from_named(serializer.component_library(), &self.id_mapping)?;
        serializer.set_id_mapping(table);

        let restored = self
            .entities
            .iter()
            .map(|record| serializer.decode(record))
            .collect::<Result<Vec<_>, _>>()?;
        info!(entities = restored.len(), "restored snapshot");
        Ok(restored)
    }

    /// Encode to MessagePack.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::Encode`] if serialisation fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, PersistError> {
        Ok(rmp_serde::to_vec(self)?)
    }

    /// Decode from MessagePack.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::Decode`] if the bytes are not a snapshot.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PersistError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}
