//! # engine_world
//!
//! In-memory entity storage for the ECS engine.
//!
//! [`World`] allocates entity identities, keeps each entity's components in
//! insertion order, owns the prefab registry and implements the
//! [`EntityManager`](engine_component::EntityManager) contract.

pub mod world;

pub use world::World;
