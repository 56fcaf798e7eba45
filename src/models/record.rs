//! Host record abstraction
//!
//! The shadowing layer never reflects over host types. A host type opts in by
//! implementing [`Record`] (and [`Tracked`] for owners of shadow rows), exposing
//! its fields and attachments by name.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ids::RecordId;
use crate::shadow::state::ShadowState;

/// Optional capability: the type keeps a version history
pub trait Versionable {
    /// Current version marker
    fn version(&self) -> i64;
}

/// A record managed by the host ORM
pub trait Record {
    /// Entity type name, as registered in the schema catalog
    fn entity_type(&self) -> &str;

    /// Durable identity; `None` until the record has been persisted
    fn id(&self) -> Option<RecordId>;

    /// Whether the record has no durable identity yet
    fn is_new_record(&self) -> bool {
        self.id().is_none()
    }

    /// Current in-memory value of a named field
    fn get(&self, field: &str) -> Option<Value>;

    /// Attachment currently held under `name`
    fn attachment(&self, name: &str) -> Option<AttachmentRef>;

    /// Version capability, for types that expose a version marker
    fn as_versionable(&self) -> Option<&dyn Versionable> {
        None
    }
}

/// A record whose type owns shadow tables
pub trait Tracked: Record {
    fn shadow_state(&self) -> &ShadowState;

    fn shadow_state_mut(&mut self) -> &mut ShadowState;
}

/// Reference to an auxiliary record (e.g. the actor making a change)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub entity_type: String,
    pub id: Option<RecordId>,
}

impl AttachmentRef {
    /// Reference a persisted record
    pub fn persisted(entity_type: impl Into<String>, id: impl Into<RecordId>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: Some(id.into()),
        }
    }

    /// Reference a record that has not been saved yet
    pub fn unsaved(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: None,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Parse `Type#id` (e.g. `User#7`)
    pub fn parse(s: &str) -> Option<Self> {
        let (entity_type, id) = s.split_once('#')?;
        if entity_type.is_empty() {
            return None;
        }
        let id: i64 = id.trim().parse().ok()?;
        Some(Self::persisted(entity_type.trim(), id))
    }
}

impl fmt::Display for AttachmentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "{}{}", self.entity_type, id),
            None => write!(f, "{}(unsaved)", self.entity_type),
        }
    }
}

/// Named attachment slots for types without native accessors
///
/// A slot exists only once it has been bound; binding never clobbers a value
/// already held.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachmentSlots {
    slots: BTreeMap<String, Option<AttachmentRef>>,
}

impl AttachmentSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an empty slot; returns false if the slot already existed
    pub fn bind(&mut self, name: &str) -> bool {
        if self.slots.contains_key(name) {
            return false;
        }
        self.slots.insert(name.to_string(), None);
        true
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&AttachmentRef> {
        self.slots.get(name).and_then(Option::as_ref)
    }

    /// Write a bound slot; returns false if no slot is bound under `name`
    pub fn set(&mut self, name: &str, value: Option<AttachmentRef>) -> bool {
        match self.slots.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }
}
