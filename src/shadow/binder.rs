//! Attachment binder
//!
//! Decides, per entity type and attachment name, whether the type already
//! exposes its own accessor pair or needs a slot opened on its instances, and
//! reads attachment ids off records when a shadow row is written.

use std::collections::BTreeMap;
use std::fmt;

use super::config::{Attachment, ShadowConfig};
use crate::error::{ShadowError, ShadowResult};
use crate::models::{Record, RecordId, SchemaCatalog};

/// How a type exposes an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorKind {
    /// The type defines its own reader and writer
    Native,
    /// A slot is opened on each instance
    Slot,
}

impl fmt::Display for AccessorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessorKind::Native => write!(f, "native"),
            AccessorKind::Slot => write!(f, "slot"),
        }
    }
}

/// One attachment accessor guaranteed on one entity type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentBinding {
    pub entity_type: String,
    pub attachment: String,
    pub kind: AccessorKind,
}

/// Bindings for the tracked type and every type reachable through its tracked associations
pub fn bind_attachments(
    config: &ShadowConfig,
    catalog: &SchemaCatalog,
) -> ShadowResult<Vec<AttachmentBinding>> {
    let mut types: Vec<&str> = vec![config.entity_type.as_str()];
    for association in &config.tracked_associations {
        if !types.contains(&association.target.as_str()) {
            types.push(association.target.as_str());
        }
    }

    let mut bindings = Vec::new();
    for entity_type in types {
        let schema = catalog.require(entity_type)?;
        for attachment in &config.required_attachments {
            let kind = if schema.has_accessor(&attachment.name) {
                AccessorKind::Native
            } else {
                AccessorKind::Slot
            };
            bindings.push(AttachmentBinding {
                entity_type: entity_type.to_string(),
                attachment: attachment.name.clone(),
                kind,
            });
        }
    }

    Ok(bindings)
}

/// Process-wide binding table, keyed by entity type then attachment name
#[derive(Debug, Clone, Default)]
pub struct BindingTable {
    bindings: BTreeMap<String, BTreeMap<String, AccessorKind>>,
}

impl BindingTable {
    /// Merge a binding; an existing accessor is never replaced
    pub fn insert(&mut self, binding: AttachmentBinding) -> bool {
        let per_type = self.bindings.entry(binding.entity_type).or_default();
        if per_type.contains_key(&binding.attachment) {
            return false;
        }
        per_type.insert(binding.attachment, binding.kind);
        true
    }

    pub fn get(&self, entity_type: &str, attachment: &str) -> Option<AccessorKind> {
        self.bindings
            .get(entity_type)
            .and_then(|per_type| per_type.get(attachment))
            .copied()
    }

    /// Every attachment bound on `entity_type`, native or slot
    pub fn attachments_for<'a>(&'a self, entity_type: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.bindings
            .get(entity_type)
            .into_iter()
            .flat_map(|per_type| per_type.keys())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.bindings.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read every required attachment off `record` as a foreign key map
///
/// # Errors
///
/// Returns `AttachmentMissing` naming the record's type for the first
/// attachment that is absent or not yet persisted.
pub fn resolve_attachment_ids(
    attachments: &[Attachment],
    record: &dyn Record,
) -> ShadowResult<BTreeMap<String, RecordId>> {
    let mut keys = BTreeMap::new();
    for attachment in attachments {
        let id = record
            .attachment(&attachment.name)
            .and_then(|attached| attached.id)
            .ok_or_else(|| ShadowError::attachment_missing(record.entity_type(), &attachment.name))?;
        keys.insert(attachment.key(), id);
    }
    Ok(keys)
}
