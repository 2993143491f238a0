//! Gameplay components: health, naming, inventory and network ownership.

use engine_component::{Component, ComponentMetadata, MetadataError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Health {
    pub current: u32,
    pub max: u32,
    /// Points regained per second.
    pub regen_rate: f32,
}

impl Health {
    #[must_use]
    pub fn full(max: u32) -> Self {
        Self {
            current: max,
            max,
            regen_rate: 0.0,
        }
    }

    /// Subtract `amount`, saturating at zero.
    pub fn damage(&mut self, amount: u32) {
        self.current = self.current.saturating_sub(amount);
    }

    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.current == 0
    }

    pub(crate) fn metadata() -> Result<ComponentMetadata, MetadataError> {
        ComponentMetadata::builder::<Self>()
            .replicated()
            .replicated_field(0, "current", |h| &h.current, |h| &mut h.current)
            .replicated_field(1, "max", |h| &h.max, |h| &mut h.max)
            .field(2, "regen_rate", |h| &h.regen_rate, |h| &mut h.regen_rate)
            .build()
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::full(100)
    }
}

impl Component for Health {
    fn type_name() -> &'static str {
        "Health"
    }
}

/// Human-readable label shown above an entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DisplayName {
    pub name: String,
}

impl DisplayName {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub(crate) fn metadata() -> Result<ComponentMetadata, MetadataError> {
        ComponentMetadata::builder::<Self>()
            .replicated()
            .replicated_field(0, "name", |d| &d.name, |d| &mut d.name)
            .build()
    }
}

impl Component for DisplayName {
    fn type_name() -> &'static str {
        "DisplayName"
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Inventory {
    pub items: Vec<String>,
    pub capacity: u32,
}

impl Inventory {
    #[must_use]
    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            items: Vec::new(),
            capacity,
        }
    }

    /// Add `item` if there is room. Returns `false` when full.
    pub fn add(&mut self, item: impl Into<String>) -> bool {
        if self.items.len() >= self.capacity as usize {
            return false;
        }
        self.items.push(item.into());
        true
    }

    pub(crate) fn metadata() -> Result<ComponentMetadata, MetadataError> {
        ComponentMetadata::builder::<Self>()
            .field(0, "items", |i| &i.items, |i| &mut i.items)
            .field(1, "capacity", |i| &i.capacity, |i| &mut i.capacity)
            .build()
    }
}

impl Component for Inventory {
    fn type_name() -> &'static str {
        "Inventory"
    }
}

/// The client currently controlling an entity. Session state: replicated,
/// never saved.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NetworkOwner {
    /// `None` while the server owns the entity.
    pub client_id: Option<u64>,
}

impl NetworkOwner {
    pub(crate) fn metadata() -> Result<ComponentMetadata, MetadataError> {
        ComponentMetadata::builder::<Self>()
            .not_persisted()
            .replicated()
            .replicated_field(0, "client_id", |o| &o.client_id, |o| &mut o.client_id)
            .build()
    }
}

impl Component for NetworkOwner {
    fn type_name() -> &'static str {
        "NetworkOwner"
    }
}
