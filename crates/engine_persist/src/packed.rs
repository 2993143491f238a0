//! The packed entity record.
//!
//! A [`PackedEntity`] stores an entity as parallel arrays:
//!
//! ```text
//! component_ids          [ 1,     2   ]
//! component_field_counts [ 2,     1   ]   one byte per component
//! field_ids              [ 0, 1,  0   ]   one byte per field
//! field_values           [ 7,"x", true]   same positions as field_ids
//! ```
//!
//! The fields of component `i` start at the sum of the counts before it.
//! Counts and field ids are unsigned bytes and are always widened through
//! `usize::from`, so counts of 128 and above stay correct.
//!
//! Records are only ever assembled through [`PackedEntityBuilder`], which
//! pushes a component id, its count and its fields together. Records from
//! outside (disk, network) can be checked with [`PackedEntity::validate`].

use std::collections::HashSet;

use engine_component::{FieldId, FieldValue};
use serde::{Deserialize, Serialize};

use crate::error::PersistError;
use crate::id_table::ComponentId;

/// An entity packed for persistence or transfer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackedEntity {
    /// Present iff the record is a delta against this prefab.
    parent_prefab_uri: Option<String>,
    /// Emitted components, in emission order.
    component_ids: Vec<ComponentId>,
    /// Field count of each emitted component.
    #[serde(with = "byte_string")]
    component_field_counts: Vec<u8>,
    /// Field ids of all emitted components, concatenated.
    #[serde(with = "byte_string")]
    field_ids: Vec<FieldId>,
    /// Field values, positionally matching `field_ids`.
    field_values: Vec<FieldValue>,
    /// Prefab components the entity no longer has (delta records only).
    removed_components: Vec<ComponentId>,
}

impl PackedEntity {
    /// The parent prefab URI of a delta record.
    #[must_use]
    pub fn parent_prefab_uri(&self) -> Option<&str> {
        self.parent_prefab_uri.as_deref()
    }

    /// Returns `true` if this record is a delta against a prefab.
    #[must_use]
    pub fn is_delta(&self) -> bool {
        self.parent_prefab_uri.is_some()
    }

    #[must_use]
    pub fn component_ids(&self) -> &[ComponentId] {
        &self.component_ids
    }

    #[must_use]
    pub fn component_field_counts(&self) -> &[u8] {
        &self.component_field_counts
    }

    #[must_use]
    pub fn field_ids(&self) -> &[FieldId] {
        &self.field_ids
    }

    #[must_use]
    pub fn field_values(&self) -> &[FieldValue] {
        &self.field_values
    }

    #[must_use]
    pub fn removed_components(&self) -> &[ComponentId] {
        &self.removed_components
    }

    /// Number of emitted components.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.component_ids.len()
    }

    /// Field count of the component at `index`, widened without sign.
    #[must_use]
    pub fn field_count(&self, index: usize) -> Option<usize> {
        self.component_field_counts
            .get(index)
            .map(|&count| usize::from(count))
    }

    /// Check the structural invariants of the record.
    ///
    /// - one count per component id;
    /// - as many field ids and field values as the counts add up to;
    /// - no component id emitted twice;
    /// - no id both emitted and listed as removed.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::MalformedRecord`] describing the first
    /// violation found.
    pub fn validate(&self) -> Result<(), PersistError> {
        if self.component_ids.len() != self.component_field_counts.len() {
            return Err(PersistError::MalformedRecord(format!(
                "{} component ids but {} field counts",
                self.component_ids.len(),
                self.component_field_counts.len()
            )));
        }

        let total: usize = self
            .component_field_counts
            .iter()
            .map(|&count| usize::from(count))
            .sum();
        if self.field_ids.len() != total || self.field_values.len() != total {
            return Err(PersistError::MalformedRecord(format!(
                "field counts add up to {total} but there are {} field ids and {} field values",
                self.field_ids.len(),
                self.field_values.len()
            )));
        }

        let mut seen = HashSet::with_capacity(self.component_ids.len());
        for &id in &self.component_ids {
            if !seen.insert(id) {
                return Err(PersistError::MalformedRecord(format!(
                    "component id {id} is emitted twice"
                )));
            }
        }
        if let Some(id) = self.removed_components.iter().find(|id| seen.contains(id)) {
            return Err(PersistError::MalformedRecord(format!(
                "component id {id} is both emitted and removed"
            )));
        }
        Ok(())
    }

    /// Iterate the emitted components with their slices of field ids and
    /// values.
    ///
    /// Iteration stops early if the record is truncated; call
    /// [`validate`](Self::validate) first to rule that out.
    #[must_use]
    pub fn components(&self) -> PackedComponents<'_> {
        PackedComponents {
            record: self,
            index: 0,
            field_pos: 0,
        }
    }
}

/// One emitted component of a [`PackedEntity`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackedComponent<'a> {
    /// The component id.
    pub id: ComponentId,
    /// Field ids of this component.
    pub field_ids: &'a [FieldId],
    /// Field values of this component.
    pub field_values: &'a [FieldValue],
}

impl<'a> PackedComponent<'a> {
    /// `(field id, value)` pairs in record order.
    pub fn fields(&self) -> impl Iterator<Item = (FieldId, &'a FieldValue)> + use<'a> {
        self.field_ids
            .iter()
            .copied()
            .zip(self.field_values.iter())
    }

    /// Number of fields carried for this component.
    #[must_use]
    pub fn len(&self) -> usize {
        self.field_ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.field_ids.is_empty()
    }
}

/// Iterator returned by [`PackedEntity::components`].
#[derive(Debug, Clone)]
pub struct PackedComponents<'a> {
    record: &'a PackedEntity,
    index: usize,
    field_pos: usize,
}

impl<'a> Iterator for PackedComponents<'a> {
    type Item = PackedComponent<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = *self.record.component_ids.get(self.index)?;
        let count = self.record.field_count(self.index)?;
        let range = self.field_pos..self.field_pos + count;
        let field_ids = self.record.field_ids.get(range.clone())?;
        let field_values = self.record.field_values.get(range)?;

        self.index += 1;
        self.field_pos += count;
        Some(PackedComponent {
            id,
            field_ids,
            field_values,
        })
    }
}

/// Assembles a [`PackedEntity`] one component at a time.
#[derive(Debug, Default)]
pub struct PackedEntityBuilder {
    record: PackedEntity,
}

impl PackedEntityBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the record as a delta against `uri`.
    pub fn set_parent_prefab_uri(&mut self, uri: impl Into<String>) -> &mut Self {
        self.record.parent_prefab_uri = Some(uri.into());
        self
    }

    /// Append a component with its fields.
    ///
    /// A component with no fields is allowed and still occupies a slot.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::FieldCountOverflow`] if more than 255 fields
    /// are given; the builder is left unchanged.
    pub fn push_component(
        &mut self,
        id: ComponentId,
        fields: Vec<(FieldId, FieldValue)>,
    ) -> Result<&mut Self, PersistError> {
        let count = u8::try_from(fields.len()).map_err(|_| PersistError::FieldCountOverflow {
            component_id: id,
            count: fields.len(),
        })?;

        self.record.component_ids.push(id);
        self.record.component_field_counts.push(count);
        for (field_id, value) in fields {
            self.record.field_ids.push(field_id);
            self.record.field_values.push(value);
        }
        Ok(self)
    }

    /// Record a prefab component the entity no longer has.
    pub fn push_removed(&mut self, id: ComponentId) -> &mut Self {
        self.record.removed_components.push(id);
        self
    }

    /// Number of components pushed so far.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.record.component_ids.len()
    }

    /// Finish the record.
    #[must_use]
    pub fn build(self) -> PackedEntity {
        self.record
    }
}

/// Serde adapter that writes `Vec<u8>` as a byte string (MessagePack `bin`)
/// instead of an array of integers, and accepts either form when reading.
mod byte_string {
    use std::fmt;

    use serde::de::{self, SeqAccess, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(bytes)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        deserializer.deserialize_byte_buf(ByteStringVisitor)
    }

    struct ByteStringVisitor;

    impl<'de> Visitor<'de> for ByteStringVisitor {
        type Value = Vec<u8>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a byte string")
        }

        fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Vec<u8>, E> {
            Ok(v.to_vec())
        }

        fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Vec<u8>, E> {
            Ok(v)
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Vec<u8>, A::Error> {
            let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
            while let Some(byte) = seq.next_element::<u8>()? {
                bytes.push(byte);
            }
            Ok(bytes)
        }
    }
}
