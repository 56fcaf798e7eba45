//! Dynamic entity model
//!
//! A schema-driven record used by the bundled store and CLI. Fields are held
//! by name; `id` and `version` are first-class so stores can key on them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ids::RecordId;
use super::record::{AttachmentRef, AttachmentSlots, Record, Tracked, Versionable};
use super::value::FieldMap;
use crate::error::{ShadowError, ShadowResult};
use crate::shadow::state::ShadowState;

/// A record of any registered entity type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Entity type name
    #[serde(rename = "type")]
    pub entity_type: String,

    /// Durable identity (None until inserted)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,

    /// Version marker for versioned types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,

    /// Column values by name
    #[serde(default)]
    pub fields: FieldMap,

    /// Related record ids per association
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub links: BTreeMap<String, Vec<RecordId>>,

    #[serde(skip)]
    attachments: AttachmentSlots,

    #[serde(skip)]
    shadow: ShadowState,

    /// Version capability from the schema; unknown until prepared
    #[serde(skip)]
    versioned: Option<bool>,
}

impl Entity {
    /// Create a new, unsaved entity of the given type
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: None,
            version: None,
            fields: FieldMap::new(),
            links: BTreeMap::new(),
            attachments: AttachmentSlots::new(),
            shadow: ShadowState::default(),
            versioned: None,
        }
    }

    /// Builder-style field assignment
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Assign a field value
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Open an attachment slot (no-op if already open)
    pub fn bind_attachment(&mut self, name: &str) -> bool {
        self.attachments.bind(name)
    }

    /// Fix the version capability to the type's schema
    pub fn set_versioned(&mut self, versioned: bool) {
        self.versioned = Some(versioned);
    }

    pub fn has_attachment_slot(&self, name: &str) -> bool {
        self.attachments.is_bound(name)
    }

    /// Set an attachment through its bound slot
    pub fn attach(&mut self, name: &str, attachment: AttachmentRef) -> ShadowResult<()> {
        if self.attachments.set(name, Some(attachment)) {
            Ok(())
        } else {
            Err(ShadowError::Validation(format!(
                "{} has no attachment slot '{}'",
                self.entity_type, name
            )))
        }
    }

    /// Clear an attachment slot
    pub fn detach(&mut self, name: &str) {
        self.attachments.set(name, None);
    }

    /// Related ids currently linked through an association
    pub fn linked(&self, association: &str) -> &[RecordId] {
        self.links
            .get(association)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Link a related id; returns false if it was already linked
    pub fn link(&mut self, association: &str, id: RecordId) -> bool {
        let ids = self.links.entry(association.to_string()).or_default();
        if ids.contains(&id) {
            return false;
        }
        ids.push(id);
        true
    }

    /// Unlink a related id; returns false if it was not linked
    pub fn unlink(&mut self, association: &str, id: RecordId) -> bool {
        match self.links.get_mut(association) {
            Some(ids) => {
                let before = ids.len();
                ids.retain(|linked| *linked != id);
                ids.len() != before
            }
            None => false,
        }
    }

    /// Reference this entity as an attachment of another record
    pub fn as_attachment(&self) -> AttachmentRef {
        AttachmentRef {
            entity_type: self.entity_type.clone(),
            id: self.id,
        }
    }

    /// Copy of the persisted shape only (no slots, no shadow state)
    pub fn snapshot(&self) -> Self {
        Self {
            entity_type: self.entity_type.clone(),
            id: self.id,
            version: self.version,
            fields: self.fields.clone(),
            links: self.links.clone(),
            attachments: AttachmentSlots::new(),
            shadow: ShadowState::default(),
            versioned: self.versioned,
        }
    }
}

impl Record for Entity {
    fn entity_type(&self) -> &str {
        &self.entity_type
    }

    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn get(&self, field: &str) -> Option<Value> {
        match field {
            "id" => self.id.map(|id| Value::from(id.get())),
            "version" => self.version.map(Value::from),
            _ => self.fields.get(field).cloned(),
        }
    }

    fn attachment(&self, name: &str) -> Option<AttachmentRef> {
        self.attachments.get(name).cloned()
    }

    fn as_versionable(&self) -> Option<&dyn Versionable> {
        // Unprepared entities fall back to the marker they carry
        if self.versioned.unwrap_or(self.version.is_some()) {
            Some(self)
        } else {
            None
        }
    }
}

impl Versionable for Entity {
    fn version(&self) -> i64 {
        self.version.unwrap_or_default()
    }
}

impl Tracked for Entity {
    fn shadow_state(&self) -> &ShadowState {
        &self.shadow
    }

    fn shadow_state_mut(&mut self) -> &mut ShadowState {
        &mut self.shadow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_entity_is_new_record() {
        let entity = Entity::new("Invoice").with("amount", 100);
        assert!(entity.is_new_record());
        assert_eq!(entity.get("amount"), Some(json!(100)));
        assert_eq!(entity.get("id"), None);
    }

    #[test]
    fn test_id_and_version_read_as_fields() {
        let mut entity = Entity::new("Invoice");
        entity.id = Some(RecordId::new(3));
        entity.version = Some(2);

        assert_eq!(entity.get("id"), Some(json!(3)));
        assert_eq!(entity.get("version"), Some(json!(2)));
        assert_eq!(entity.as_versionable().unwrap().version(), 2);
    }

    #[test]
    fn test_unversioned_entity_has_no_version_capability() {
        let entity = Entity::new("Invoice");
        assert!(entity.as_versionable().is_none());
    }

    #[test]
    fn test_schema_version_capability_overrides_marker() {
        let mut entity = Entity::new("Invoice");
        entity.set_versioned(true);
        assert_eq!(entity.as_versionable().unwrap().version(), 0);

        entity.version = Some(3);
        entity.set_versioned(false);
        assert!(entity.as_versionable().is_none());
    }

    #[test]
    fn test_attach_requires_slot() {
        let mut entity = Entity::new("Invoice");
        let err = entity
            .attach("editor", AttachmentRef::persisted("User", 7))
            .unwrap_err();
        assert!(matches!(err, ShadowError::Validation(_)));

        entity.bind_attachment("editor");
        entity
            .attach("editor", AttachmentRef::persisted("User", 7))
            .unwrap();
        assert_eq!(
            entity.attachment("editor"),
            Some(AttachmentRef::persisted("User", 7))
        );

        entity.detach("editor");
        assert!(entity.attachment("editor").is_none());
    }

    #[test]
    fn test_link_and_unlink() {
        let mut entity = Entity::new("Invoice");
        assert!(entity.link("line_items", RecordId::new(42)));
        assert!(!entity.link("line_items", RecordId::new(42)));
        assert_eq!(entity.linked("line_items"), &[RecordId::new(42)]);

        assert!(entity.unlink("line_items", RecordId::new(42)));
        assert!(!entity.unlink("line_items", RecordId::new(42)));
        assert!(entity.linked("line_items").is_empty());
    }

    #[test]
    fn test_serialization_skips_runtime_state() {
        let mut entity = Entity::new("Invoice").with("status", "open");
        entity.bind_attachment("editor");
        entity
            .attach("editor", AttachmentRef::persisted("User", 1))
            .unwrap();

        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["type"], "Invoice");
        assert!(json.get("attachments").is_none());

        let restored: Entity = serde_json::from_value(json).unwrap();
        assert_eq!(restored.get("status"), Some(json!("open")));
        assert!(!restored.has_attachment_slot("editor"));
    }
}
