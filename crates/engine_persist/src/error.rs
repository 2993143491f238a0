//! Persistence-layer error types.

use engine_component::Entity;

use crate::id_table::{ComponentId, IdTableError};

/// Errors that can occur while packing or unpacking entities.
///
/// Recoverable conditions (unknown ids, unregistered types, null fields,
/// per-component library failures) are logged and skipped instead; only
/// the variants below abort an operation.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// A component produced more fields than fit in one count byte.
    #[error("component id {component_id} carries {count} fields; at most 255 fit in a packed record")]
    FieldCountOverflow {
        component_id: ComponentId,
        count: usize,
    },

    /// The entity handed to the serialiser does not exist.
    #[error("{0} does not exist")]
    EntityNotFound(Entity),

    /// The record names a parent prefab the entity manager does not know.
    #[error("prefab '{0}' is not registered")]
    UnknownPrefab(String),

    /// The record's parallel arrays disagree with each other.
    #[error("malformed packed entity: {0}")]
    MalformedRecord(String),

    /// The id table could not be built.
    #[error(transparent)]
    IdTable(#[from] IdTableError),

    /// Failed to encode to MessagePack.
    #[error("failed to encode packed data: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// Failed to decode from MessagePack.
    #[error("failed to decode packed data: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}
