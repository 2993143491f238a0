//! Spatial component.
//!
//! [`Location`] places an entity in the world. Position and rotation are
//! replicated; scale only matters to the owning simulation and is persisted
//! but not sent over the network.

use engine_component::{Component, ComponentMetadata, MetadataError};
use serde::{Deserialize, Serialize};

/// Position, rotation (unit quaternion `[x, y, z, w]`) and uniform scale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Location {
    /// World-space position.
    pub position: [f32; 3],
    /// Rotation as a unit quaternion.
    pub rotation: [f32; 4],
    /// Uniform scale factor.
    pub scale: f32,
}

impl Location {
    /// Origin, no rotation, unit scale.
    pub const IDENTITY: Self = Self {
        position: [0.0; 3],
        rotation: [0.0, 0.0, 0.0, 1.0],
        scale: 1.0,
    };

    /// A location at `position` with default rotation and scale.
    #[must_use]
    pub fn at(position: [f32; 3]) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Move by `offset`.
    #[must_use]
    pub fn translated(mut self, offset: [f32; 3]) -> Self {
        for (axis, delta) in self.position.iter_mut().zip(offset) {
            *axis += delta;
        }
        self
    }

    /// Apply a uniform scale factor.
    #[must_use]
    pub fn scaled(mut self, factor: f32) -> Self {
        self.scale *= factor;
        self
    }

    pub(crate) fn metadata() -> Result<ComponentMetadata, MetadataError> {
        ComponentMetadata::builder::<Self>()
            .replicated()
            .replicated_field(0, "position", |l| &l.position, |l| &mut l.position)
            .replicated_field(1, "rotation", |l| &l.rotation, |l| &mut l.rotation)
            .field(2, "scale", |l| &l.scale, |l| &mut l.scale)
            .build()
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Component for Location {
    fn type_name() -> &'static str {
        "Location"
    }
}
