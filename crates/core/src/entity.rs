//! Entity trait: identity + continuity across state changes.

use serde::{Deserialize, Serialize};

use crate::id::RecordId;

/// Entity marker + minimal interface.
pub trait Entity {
    /// Which record type this entity is.
    const KIND: EntityKind;

    /// Returns the entity identifier.
    fn id(&self) -> &RecordId;
}

/// The record types managed by the service.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Item,
    Supplier,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Item => "item",
            EntityKind::Supplier => "supplier",
        }
    }
}

impl core::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
