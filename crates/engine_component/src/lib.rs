//! # engine_component
//!
//! The "C" in ECS: it defines what a component is, how its fields are
//! described at runtime, and the contract entity storage has to satisfy.
//!
//! This crate provides:
//!
//! - [`Component`] / [`ErasedComponent`]: typed and object-safe component traits.
//! - [`FieldMetadata`] / [`ComponentMetadata`]: per-field and per-type descriptors
//!   with byte-sized field ids and (de)serialisation hooks.
//! - [`ComponentLibrary`]: the registry of descriptors.
//! - [`Entity`] / [`EntityAllocator`]: `u64` entity handles.
//! - [`Prefab`]: named template entities.
//! - [`EntityManager`]: the storage contract used by serialisation code.

pub mod component;
pub mod entity;
pub mod field;
pub mod library;
pub mod manager;
pub mod metadata;
pub mod prefab;

pub use component::{Component, ComponentTypeId, ErasedComponent};
pub use entity::{Entity, EntityAllocator};
pub use field::{FieldError, FieldId, FieldMetadata, FieldValue};
pub use library::ComponentLibrary;
pub use manager::EntityManager;
pub use metadata::{ComponentMetadata, ComponentMetadataBuilder, MetadataError};
pub use prefab::Prefab;
