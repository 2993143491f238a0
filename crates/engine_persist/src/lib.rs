//! # engine_persist
//!
//! Packs entities into compact records for saving and for transfer, and
//! unpacks them again.
//!
//! This crate provides:
//!
//! - [`ComponentIdTable`]: the bidirectional mapping between component types
//!   and the small integers records use for them.
//! - [`ComponentCheck`] / [`FieldCheck`]: visibility policies deciding which
//!   components and fields take part in a pass.
//! - [`PackedEntity`]: the record itself, in parallel-array layout, and its
//!   [`PackedEntityBuilder`].
//! - [`PackedEntitySerializer`]: full and prefab-delta encoding, and decoding
//!   onto new or existing entities of any [`EntityManager`](engine_component::EntityManager).
//! - [`WorldSnapshot`]: a set of records and their id table, as MessagePack.

pub mod check;
mod decode;
pub mod encode;
pub mod error;
pub mod id_table;
pub mod packed;
pub mod serializer;
pub mod snapshot;

#[cfg(test)]
mod test_support;

pub use check::{AllowAll, ComponentCheck, FieldCheck, PersistedOnly, ReplicatedFields, ReplicatedOnly};
pub use encode::EncodeMode;
pub use error::PersistError;
pub use id_table::{ComponentId, ComponentIdTable, IdMappingEntry, IdTableError};
pub use packed::{PackedComponent, PackedEntity, PackedEntityBuilder};
pub use serializer::PackedEntitySerializer;
pub use snapshot::WorldSnapshot;
