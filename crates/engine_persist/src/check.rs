//! Visibility policies.
//!
//! Two independent predicates decide what takes part in a pass:
//!
//! - a [`ComponentCheck`] accepts or rejects whole component types, in both
//!   directions;
//! - a [`FieldCheck`] accepts or rejects single fields, separately for
//!   serialisation and deserialisation.
//!
//! Rejection is never an error; rejected data is silently left out.

use engine_component::{ComponentMetadata, ErasedComponent, FieldMetadata};

/// Decides whether a whole component type participates in a pass.
pub trait ComponentCheck: Send + Sync {
    fn should_serialize(&self, metadata: &ComponentMetadata) -> bool;
}

impl<F> ComponentCheck for F
where
    F: Fn(&ComponentMetadata) -> bool + Send + Sync,
{
    fn should_serialize(&self, metadata: &ComponentMetadata) -> bool {
        self(metadata)
    }
}

/// Decides whether a single field participates in a pass.
pub trait FieldCheck {
    /// Whether `field` of `component` is written into a record.
    fn should_serialize_field(
        &self,
        field: &FieldMetadata,
        component: &dyn ErasedComponent,
    ) -> bool;

    /// Whether `field` is applied when read back from a record.
    fn should_deserialize_field(&self, field: &FieldMetadata) -> bool;
}

/// Lets everything through. The default for both policies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllowAll;

impl ComponentCheck for AllowAll {
    fn should_serialize(&self, _metadata: &ComponentMetadata) -> bool {
        true
    }
}

impl FieldCheck for AllowAll {
    fn should_serialize_field(
        &self,
        _field: &FieldMetadata,
        _component: &dyn ErasedComponent,
    ) -> bool {
        true
    }

    fn should_deserialize_field(&self, _field: &FieldMetadata) -> bool {
        true
    }
}

/// Rejects component types flagged as not persisted. Used when saving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistedOnly;

impl ComponentCheck for PersistedOnly {
    fn should_serialize(&self, metadata: &ComponentMetadata) -> bool {
        metadata.is_persisted()
    }
}

/// Accepts only component types flagged as replicated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplicatedOnly;

impl ComponentCheck for ReplicatedOnly {
    fn should_serialize(&self, metadata: &ComponentMetadata) -> bool {
        metadata.is_replicated()
    }
}

/// Accepts only fields flagged as replicated, in both directions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplicatedFields;

impl FieldCheck for ReplicatedFields {
    fn should_serialize_field(
        &self,
        field: &FieldMetadata,
        _component: &dyn ErasedComponent,
    ) -> bool {
        field.is_replicated()
    }

    fn should_deserialize_field(&self, field: &FieldMetadata) -> bool {
        field.is_replicated()
    }
}

#[cfg(test)]
mod tests {
    use engine_component::Component;

    use super::*;

    #[derive(Debug, Clone, Default)]
    struct Score {
        points: u32,
        secret: u32,
    }

    impl Component for Score {
        fn type_name() -> &'static str {
            "Score"
        }
    }

    fn meta(builder: engine_component::ComponentMetadataBuilder<Score>) -> ComponentMetadata {
        builder
            .replicated_field(0, "points", |s| &s.points, |s| &mut s.points)
            .field(1, "secret", |s| &s.secret, |s| &mut s.secret)
            .build()
            .unwrap()
    }

    #[test]
    fn test_allow_all() {
        let metadata = meta(ComponentMetadata::builder::<Score>());
        assert!(AllowAll.should_serialize(&metadata));
        for field in metadata.fields() {
            assert!(AllowAll.should_serialize_field(field, &Score::default()));
            assert!(AllowAll.should_deserialize_field(field));
        }
    }

    #[test]
    fn test_persisted_only() {
        let saved = meta(ComponentMetadata::builder::<Score>());
        let transient = meta(ComponentMetadata::builder::<Score>().not_persisted());
        assert!(PersistedOnly.should_serialize(&saved));
        assert!(!PersistedOnly.should_serialize(&transient));
    }

    #[test]
    fn test_replicated_policies() {
        let local = meta(ComponentMetadata::builder::<Score>());
        let shared = meta(ComponentMetadata::builder::<Score>().replicated());
        assert!(!ReplicatedOnly.should_serialize(&local));
        assert!(ReplicatedOnly.should_serialize(&shared));

        let points = shared.field_by_id(0).unwrap();
        let secret = shared.field_by_id(1).unwrap();
        assert!(ReplicatedFields.should_serialize_field(points, &Score::default()));
        assert!(!ReplicatedFields.should_serialize_field(secret, &Score::default()));
        assert!(!ReplicatedFields.should_deserialize_field(secret));
    }

    #[test]
    fn test_closure_as_component_check() {
        let metadata = meta(ComponentMetadata::builder::<Score>());
        let reject_score = |m: &ComponentMetadata| m.name() != "Score";
        assert!(!reject_score.should_serialize(&metadata));
    }
}
