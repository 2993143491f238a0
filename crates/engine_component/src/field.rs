//! Field-level metadata: stable byte ids and type-erased access hooks.
//!
//! A [`FieldMetadata`] is built once per field from a pair of accessor
//! functions on the concrete component type. Everything downstream (the
//! packed encoder and decoder) only sees `dyn ErasedComponent` and calls the
//! hooks stored here, so no reflection is needed at runtime.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::component::{Component, ErasedComponent};

/// A field identifier, unique within one component type.
pub type FieldId = u8;

/// The opaque, tagged value a field serialises to.
///
/// Scalars, strings, lists and nested maps are all representable. The
/// persistence layer forwards these values positionally and never inspects
/// them; a [`FieldValue::Null`] result from a hook means "no value".
pub type FieldValue = serde_json::Value;

/// Errors raised by field hooks.
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    /// The hook was handed a component of a different type.
    #[error("field '{field}' expects component '{expected}', got '{found}'")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    /// The field value could not be converted into a [`FieldValue`].
    #[error("failed to serialise field '{field}': {source}")]
    Serialize {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The [`FieldValue`] could not be converted back into the field type.
    #[error("failed to deserialise field '{field}': {source}")]
    Deserialize {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

type SerializeFn =
    Box<dyn Fn(&dyn ErasedComponent) -> Result<Option<FieldValue>, FieldError> + Send + Sync>;
type DeserializeFn =
    Box<dyn Fn(&mut dyn ErasedComponent, FieldValue) -> Result<(), FieldError> + Send + Sync>;
type EqualsFn = Box<dyn Fn(&dyn ErasedComponent, &dyn ErasedComponent) -> bool + Send + Sync>;

/// Describes one serialisable field of a component type.
pub struct FieldMetadata {
    id: FieldId,
    name: &'static str,
    replicated: bool,
    serialize_fn: SerializeFn,
    deserialize_fn: DeserializeFn,
    equals_fn: EqualsFn,
}

impl FieldMetadata {
    /// Describe field `name` of component `C`, reached through `get` and
    /// `get_mut`.
    ///
    /// ```rust
    /// use engine_component::{Component, FieldMetadata};
    ///
    /// #[derive(Debug, Clone, Default)]
    /// struct Health { current: i32 }
    /// impl Component for Health { fn type_name() -> &'static str { "Health" } }
    ///
    /// let field = FieldMetadata::new::<Health, _>(0, "current", |h| &h.current, |h| &mut h.current);
    /// assert_eq!(field.id(), 0);
    /// ```
    #[must_use]
    pub fn new<C, F>(
        id: FieldId,
        name: &'static str,
        get: fn(&C) -> &F,
        get_mut: fn(&mut C) -> &mut F,
    ) -> Self
    where
        C: Component,
        F: Serialize + DeserializeOwned + PartialEq + Send + Sync + 'static,
    {
        Self::with_accessors(id, name, get, get_mut)
    }

    /// Like [`FieldMetadata::new`], but the accessors may capture state
    /// (an index into a collection, for instance).
    #[must_use]
    pub fn with_accessors<C, F, G, M>(id: FieldId, name: &'static str, get: G, get_mut: M) -> Self
    where
        C: Component,
        F: Serialize + DeserializeOwned + PartialEq + Send + Sync + 'static,
        G: Fn(&C) -> &F + Send + Sync + 'static,
        M: Fn(&mut C) -> &mut F + Send + Sync + 'static,
    {
        let get = Arc::new(get);

        let read = Arc::clone(&get);
        let serialize_fn: SerializeFn = Box::new(
            move |component: &dyn ErasedComponent| -> Result<Option<FieldValue>, FieldError> {
                let typed = downcast::<C>(component, name)?;
                let value = serde_json::to_value((*read)(typed))
                    .map_err(|source| FieldError::Serialize { field: name, source })?;
                Ok((!value.is_null()).then_some(value))
            },
        );

        let deserialize_fn: DeserializeFn = Box::new(
            move |component: &mut dyn ErasedComponent, value: FieldValue| -> Result<(), FieldError> {
                let found = component.component_name();
                let typed = component
                    .downcast_mut::<C>()
                    .ok_or(FieldError::TypeMismatch {
                        field: name,
                        expected: C::type_name(),
                        found,
                    })?;
                *get_mut(typed) = serde_json::from_value(value)
                    .map_err(|source| FieldError::Deserialize { field: name, source })?;
                Ok(())
            },
        );

        let equals_fn: EqualsFn = Box::new(
            move |old: &dyn ErasedComponent, new: &dyn ErasedComponent| -> bool {
                match (old.downcast_ref::<C>(), new.downcast_ref::<C>()) {
                    (Some(old), Some(new)) => (*get)(old) == (*get)(new),
                    _ => false,
                }
            },
        );

        Self {
            id,
            name,
            replicated: false,
            serialize_fn,
            deserialize_fn,
            equals_fn,
        }
    }

    /// Mark this field as part of network replication.
    #[must_use]
    pub fn replicated(mut self) -> Self {
        self.replicated = true;
        self
    }

    #[must_use]
    pub fn id(&self) -> FieldId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` if the field takes part in network replication.
    #[must_use]
    pub fn is_replicated(&self) -> bool {
        self.replicated
    }

    /// Read the field off `component` as a [`FieldValue`].
    ///
    /// `Ok(None)` means the field currently has no value (it serialised to
    /// null).
    ///
    /// # Errors
    ///
    /// Returns a [`FieldError`] if `component` has the wrong type or the
    /// value cannot be represented.
    pub fn serialize(
        &self,
        component: &dyn ErasedComponent,
    ) -> Result<Option<FieldValue>, FieldError> {
        (self.serialize_fn)(component)
    }

    /// Write `value` into the field of `component`.
    ///
    /// # Errors
    ///
    /// Returns a [`FieldError`] if `component` has the wrong type or `value`
    /// does not fit the field type.
    pub fn deserialize_onto(
        &self,
        component: &mut dyn ErasedComponent,
        value: FieldValue,
    ) -> Result<(), FieldError> {
        (self.deserialize_fn)(component, value)
    }

    /// Value-based equality of this field between two instances.
    ///
    /// Compares the decoded field values, not their serialised forms.
    #[must_use]
    pub fn values_equal(&self, old: &dyn ErasedComponent, new: &dyn ErasedComponent) -> bool {
        (self.equals_fn)(old, new)
    }
}

impl fmt::Debug for FieldMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldMetadata")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("replicated", &self.replicated)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for FieldMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}

fn downcast<'a, C: Component>(
    component: &'a dyn ErasedComponent,
    field: &'static str,
) -> Result<&'a C, FieldError> {
    component
        .downcast_ref::<C>()
        .ok_or(FieldError::TypeMismatch {
            field,
            expected: C::type_name(),
            found: component.component_name(),
        })
}
