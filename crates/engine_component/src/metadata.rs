//! Per-type component metadata.
//!
//! A [`ComponentMetadata`] is the runtime descriptor of one component type:
//! its identity, its fields in declaration order and a constructor for
//! default instances. Descriptors are registered once at startup in a
//! [`ComponentLibrary`](crate::ComponentLibrary) and looked up by
//! [`ComponentTypeId`] afterwards.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::component::{Component, ComponentTypeId, ErasedComponent};
use crate::field::{FieldId, FieldMetadata};

/// Errors raised while building or registering metadata.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// Two fields of the same component share an id.
    #[error("component '{component}' declares field id {id} twice")]
    DuplicateFieldId { component: &'static str, id: FieldId },

    /// Two fields of the same component share a name.
    #[error("component '{component}' declares field '{name}' twice")]
    DuplicateFieldName {
        component: &'static str,
        name: &'static str,
    },

    /// The component type is already registered.
    #[error("component '{0}' is already registered")]
    AlreadyRegistered(&'static str),
}

/// Runtime descriptor of a component type.
pub struct ComponentMetadata {
    type_id: ComponentTypeId,
    name: &'static str,
    fields: Vec<FieldMetadata>,
    field_index: HashMap<FieldId, usize>,
    persisted: bool,
    replicated: bool,
    new_instance: fn() -> Box<dyn ErasedComponent>,
}

impl ComponentMetadata {
    /// Start describing component type `C`.
    #[must_use]
    pub fn builder<C: Component>() -> ComponentMetadataBuilder<C> {
        ComponentMetadataBuilder {
            fields: Vec::new(),
            persisted: true,
            replicated: false,
            _marker: std::marker::PhantomData,
        }
    }

    #[must_use]
    pub fn type_id(&self) -> ComponentTypeId {
        self.type_id
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl ExactSizeIterator<Item = &FieldMetadata> {
        self.fields.iter()
    }

    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Look up a field by its byte id.
    #[must_use]
    pub fn field_by_id(&self, id: FieldId) -> Option<&FieldMetadata> {
        self.field_index.get(&id).map(|&index| &self.fields[index])
    }

    #[must_use]
    pub fn field_by_name(&self, name: &str) -> Option<&FieldMetadata> {
        self.fields.iter().find(|field| field.name() == name)
    }

    /// Returns `false` for components that must never be written to disk.
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    /// Returns `true` for components that take part in network replication.
    #[must_use]
    pub fn is_replicated(&self) -> bool {
        self.replicated
    }

    /// Construct a default-initialised instance of the described type.
    #[must_use]
    pub fn new_instance(&self) -> Box<dyn ErasedComponent> {
        (self.new_instance)()
    }
}

impl fmt::Debug for ComponentMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentMetadata")
            .field("type_id", &self.type_id)
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("persisted", &self.persisted)
            .field("replicated", &self.replicated)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ComponentMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Builder returned by [`ComponentMetadata::builder`].
///
/// ```rust
/// use engine_component::{Component, ComponentMetadata};
///
/// #[derive(Debug, Clone, Default)]
/// struct Health { current: i32, max: i32 }
/// impl Component for Health { fn type_name() -> &'static str { "Health" } }
///
/// let meta = ComponentMetadata::builder::<Health>()
///     .field(0, "current", |h| &h.current, |h| &mut h.current)
///     .field(1, "max", |h| &h.max, |h| &mut h.max)
///     .build()
///     .unwrap();
/// assert_eq!(meta.field_count(), 2);
/// ```
pub struct ComponentMetadataBuilder<C> {
    fields: Vec<FieldMetadata>,
    persisted: bool,
    replicated: bool,
    _marker: std::marker::PhantomData<fn() -> C>,
}

impl<C: Component> ComponentMetadataBuilder<C> {
    /// Add a field. Fields keep the order in which they are added.
    #[must_use]
    pub fn field<F>(
        self,
        id: FieldId,
        name: &'static str,
        get: fn(&C) -> &F,
        get_mut: fn(&mut C) -> &mut F,
    ) -> Self
    where
        F: Serialize + DeserializeOwned + PartialEq + Send + Sync + 'static,
    {
        self.with_field(FieldMetadata::new(id, name, get, get_mut))
    }

    /// Add a field that takes part in network replication.
    #[must_use]
    pub fn replicated_field<F>(
        self,
        id: FieldId,
        name: &'static str,
        get: fn(&C) -> &F,
        get_mut: fn(&mut C) -> &mut F,
    ) -> Self
    where
        F: Serialize + DeserializeOwned + PartialEq + Send + Sync + 'static,
    {
        self.with_field(FieldMetadata::new(id, name, get, get_mut).replicated())
    }

    /// Add a prebuilt field descriptor.
    #[must_use]
    pub fn with_field(mut self, field: FieldMetadata) -> Self {
        self.fields.push(field);
        self
    }

    /// Exclude the component from persistence.
    #[must_use]
    pub fn not_persisted(mut self) -> Self {
        self.persisted = false;
        self
    }

    /// Mark the component as replicated over the network.
    #[must_use]
    pub fn replicated(mut self) -> Self {
        self.replicated = true;
        self
    }

    /// Finish the descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError`] if two fields share an id or a name.
    pub fn build(self) -> Result<ComponentMetadata, MetadataError> {
        let name = C::type_name();
        let mut field_index = HashMap::with_capacity(self.fields.len());
        for (index, field) in self.fields.iter().enumerate() {
            if field_index.insert(field.id(), index).is_some() {
                return Err(MetadataError::DuplicateFieldId {
                    component: name,
                    id: field.id(),
                });
            }
            if self.fields[..index]
                .iter()
                .any(|earlier| earlier.name() == field.name())
            {
                return Err(MetadataError::DuplicateFieldName {
                    component: name,
                    name: field.name(),
                });
            }
        }

        Ok(ComponentMetadata {
            type_id: C::component_type_id(),
            name,
            fields: self.fields,
            field_index,
            persisted: self.persisted,
            replicated: self.replicated,
            new_instance: || Box::new(C::default()) as Box<dyn ErasedComponent>,
        })
    }
}
