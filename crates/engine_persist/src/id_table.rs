//! The component id table.
//!
//! Packed records refer to component types by small integers instead of
//! 64-bit type hashes. [`ComponentIdTable`] is the bidirectional mapping
//! between the two. A table is immutable once built; the serialiser swaps
//! whole tables rather than editing one in place.

use std::collections::HashMap;

use engine_component::{ComponentLibrary, ComponentTypeId};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Small integer standing in for a component type inside packed records.
pub type ComponentId = u32;

/// Errors raised while building an id table.
#[derive(Debug, thiserror::Error)]
pub enum IdTableError {
    /// One component type was mapped to two different ids.
    #[error("component type {type_id} is mapped to both {first} and {second}")]
    DuplicateType {
        type_id: ComponentTypeId,
        first: ComponentId,
        second: ComponentId,
    },

    /// One id was assigned to two different component types.
    #[error("component id {id} is assigned to both {first} and {second}")]
    DuplicateId {
        id: ComponentId,
        first: ComponentTypeId,
        second: ComponentTypeId,
    },
}

/// One `(name, id)` pair of a persisted id table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdMappingEntry {
    /// Registered component name.
    pub name: String,
    /// The id records use for that component.
    pub id: ComponentId,
}

/// Bidirectional `ComponentTypeId <-> ComponentId` mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentIdTable {
    forward: HashMap<ComponentTypeId, ComponentId>,
    inverse: HashMap<ComponentId, ComponentTypeId>,
}

impl ComponentIdTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(type, id)` pairs.
    ///
    /// Repeating an identical pair is harmless.
    ///
    /// # Errors
    ///
    /// Returns [`IdTableError`] if a type maps to two ids or an id to two
    /// types.
    pub fn try_from_pairs(
        pairs: impl IntoIterator<Item = (ComponentTypeId, ComponentId)>,
    ) -> Result<Self, IdTableError> {
        let mut table = Self::new();
        for (type_id, id) in pairs {
            if let Some(&first) = table.forward.get(&type_id)
                && first != id
            {
                return Err(IdTableError::DuplicateType {
                    type_id,
                    first,
                    second: id,
                });
            }
            if let Some(&first) = table.inverse.get(&id)
                && first != type_id
            {
                return Err(IdTableError::DuplicateId {
                    id,
                    first,
                    second: type_id,
                });
            }
            table.forward.insert(type_id, id);
            table.inverse.insert(id, type_id);
        }
        Ok(table)
    }

    /// Assign ids `0..n` to every registered component, ordered by name.
    ///
    /// Two processes with the same set of registered components produce the
    /// same table.
    #[must_use]
    pub fn from_library(library: &ComponentLibrary) -> Self {
        let mut registered: Vec<_> = library
            .iter()
            .map(|metadata| (metadata.name(), metadata.type_id()))
            .collect();
        registered.sort_unstable_by_key(|&(name, _)| name);

        let mut table = Self::new();
        for (id, (_, type_id)) in (0..).zip(registered) {
            table.forward.insert(type_id, id);
            table.inverse.insert(id, type_id);
        }
        table
    }

    /// Rebuild a table from persisted `(name, id)` pairs.
    ///
    /// Names not registered in `library` are skipped with a warning; records
    /// using their ids will then decode those components as unknown.
    ///
    /// # Errors
    ///
    /// Returns [`IdTableError`] if the entries are not one-to-one.
    pub fn from_named(
        library: &ComponentLibrary,
        entries: &[IdMappingEntry],
    ) -> Result<Self, IdTableError> {
        let pairs = entries.iter().filter_map(|entry| {
            let metadata = library.metadata_by_name(&entry.name);
            if metadata.is_none() {
                warn!(
                    component = %entry.name,
                    id = entry.id,
                    "persisted id table names an unregistered component"
                );
            }
            metadata.map(|metadata| (metadata.type_id(), entry.id))
        });
        Self::try_from_pairs(pairs)
    }

    /// Export the table as `(name, id)` pairs, sorted by id.
    ///
    /// Types that `library` does not know are left out.
    #[must_use]
    pub fn to_named(&self, library: &ComponentLibrary) -> Vec<IdMappingEntry> {
        let mut entries: Vec<_> = self
            .forward
            .iter()
            .filter_map(|(&type_id, &id)| {
                library.metadata(type_id).map(|metadata| IdMappingEntry {
                    name: metadata.name().to_string(),
                    id,
                })
            })
            .collect();
        entries.sort_unstable_by_key(|entry| entry.id);
        entries
    }

    /// The id assigned to a component type.
    #[must_use]
    pub fn forward(&self, type_id: ComponentTypeId) -> Option<ComponentId> {
        self.forward.get(&type_id).copied()
    }

    /// The component type an id stands for.
    #[must_use]
    pub fn inverse(&self, id: ComponentId) -> Option<ComponentTypeId> {
        self.inverse.get(&id).copied()
    }

    /// A copy of the forward map.
    #[must_use]
    pub fn to_map(&self) -> HashMap<ComponentTypeId, ComponentId> {
        self.forward.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

impl TryFrom<HashMap<ComponentTypeId, ComponentId>> for ComponentIdTable {
    type Error = IdTableError;

    fn try_from(mapping: HashMap<ComponentTypeId, ComponentId>) -> Result<Self, Self::Error> {
        Self::try_from_pairs(mapping)
    }
}

#[cfg(test)]
mod tests {
    use engine_component::{Component, ComponentMetadata};

    use super::*;

    #[derive(Debug, Clone, Default)]
    struct Zeta;
    impl Component for Zeta {
        fn type_name() -> &'static str {
            "Zeta"
        }
    }

    #[derive(Debug, Clone, Default)]
    struct Alpha;
    impl Component for Alpha {
        fn type_name() -> &'static str {
            "Alpha"
        }
    }

    fn library() -> ComponentLibrary {
        let mut library = ComponentLibrary::new();
        library
            .register(ComponentMetadata::builder::<Zeta>().build().unwrap())
            .unwrap();
        library
            .register(ComponentMetadata::builder::<Alpha>().build().unwrap())
            .unwrap();
        library
    }

    #[test]
    fn test_forward_and_inverse_agree() {
        let table = ComponentIdTable::try_from_pairs([
            (ComponentTypeId(10), 1),
            (ComponentTypeId(20), 2),
        ])
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.forward(ComponentTypeId(10)), Some(1));
        assert_eq!(table.inverse(2), Some(ComponentTypeId(20)));
        assert_eq!(table.forward(ComponentTypeId(30)), None);
        assert_eq!(table.inverse(3), None);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let result = ComponentIdTable::try_from_pairs([
            (ComponentTypeId(10), 1),
            (ComponentTypeId(20), 1),
        ]);
        assert!(matches!(result, Err(IdTableError::DuplicateId { id: 1, .. })));
    }

    #[test]
    fn test_duplicate_type_rejected() {
        let result = ComponentIdTable::try_from_pairs([
            (ComponentTypeId(10), 1),
            (ComponentTypeId(10), 2),
        ]);
        assert!(matches!(
            result,
            Err(IdTableError::DuplicateType { first: 1, second: 2, .. })
        ));
    }

    #[test]
    fn test_repeated_identical_pair_is_accepted() {
        let table = ComponentIdTable::try_from_pairs([
            (ComponentTypeId(10), 1),
            (ComponentTypeId(10), 1),
        ])
        .unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_from_library_orders_by_name() {
        let table = ComponentIdTable::from_library(&library());
        assert_eq!(table.forward(Alpha::component_type_id()), Some(0));
        assert_eq!(table.forward(Zeta::component_type_id()), Some(1));
    }

    #[test]
    fn test_named_roundtrip() {
        let library = library();
        let table = ComponentIdTable::try_from_pairs([
            (Alpha::component_type_id(), 7),
            (Zeta::component_type_id(), 3),
        ])
        .unwrap();

        let named = table.to_named(&library);
        assert_eq!(
            named,
            vec![
                IdMappingEntry {
                    name: "Zeta".into(),
                    id: 3
                },
                IdMappingEntry {
                    name: "Alpha".into(),
                    id: 7
                },
            ]
        );
        assert_eq!(ComponentIdTable::from_named(&library, &named).unwrap(), table);
    }

    #[test]
    fn test_from_named_skips_unknown_names() {
        let entries = vec![
            IdMappingEntry {
                name: "Alpha".into(),
                id: 0,
            },
            IdMappingEntry {
                name: "Removed".into(),
                id: 1,
            },
        ];
        let table = ComponentIdTable::from_named(&library(), &entries).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.inverse(1), None);
    }

    #[test]
    fn test_try_from_map() {
        let mut map = HashMap::new();
        map.insert(ComponentTypeId(5), 50);
        let table = ComponentIdTable::try_from(map.clone()).unwrap();
        assert_eq!(table.to_map(), map);
    }
}
