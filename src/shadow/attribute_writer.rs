//! Attribute shadow writer
//!
//! Runs after the owner has been persisted. Writes one row per save of an
//! existing record whose tracked attributes changed.

use tracing::info;

use super::backend::ShadowSink;
use super::binder::resolve_attachment_ids;
use super::config::ShadowConfig;
use super::detector::ChangeSet;
use super::rows::{AttributeShadow, PendingAttributeShadow};
use crate::error::{ShadowError, ShadowResult};
use crate::models::Record;

/// Build the pending row for a save, or `None` when nothing is shadowed
///
/// Creation is exempt: a change set taken from a new record never produces
/// a row, whatever its contents.
///
/// # Errors
///
/// Returns `AttachmentMissing` naming the owner's type when a required
/// attachment is absent or unpersisted.
pub fn build_attribute_shadow(
    config: &ShadowConfig,
    record: &dyn Record,
    changes: &ChangeSet,
) -> ShadowResult<Option<PendingAttributeShadow>> {
    if changes.is_empty() || changes.is_new_record() {
        return Ok(None);
    }

    let owner_id = record.id().ok_or_else(|| {
        ShadowError::Validation(format!(
            "{} has no id after save; cannot write attribute shadow",
            record.entity_type()
        ))
    })?;

    let mut keys = resolve_attachment_ids(&config.required_attachments, record)?;
    keys.insert(config.attribute_table.owner_key.clone(), owner_id);

    Ok(Some(PendingAttributeShadow {
        updated_attributes: changes.changed_attributes(),
        version: record.as_versionable().map(|v| v.version()),
        keys,
    }))
}

/// Build and persist the attribute shadow for a completed save
pub fn store_attribute_shadow(
    config: &ShadowConfig,
    record: &dyn Record,
    changes: &ChangeSet,
    sink: &dyn ShadowSink,
) -> ShadowResult<Option<AttributeShadow>> {
    let Some(pending) = build_attribute_shadow(config, record, changes)? else {
        return Ok(None);
    };

    let row = sink.insert_attribute_shadow(&config.attribute_table, pending)?;

    info!(
        entity_type = %config.entity_type,
        table = %config.attribute_table.name,
        shadow = %row.id,
        attributes = ?row.updated_attributes,
        "wrote attribute shadow"
    );

    Ok(Some(row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttachmentRef, Entity, EntitySchema, RecordId, SchemaCatalog};
    use crate::shadow::detector::AttributeChange;
    use crate::shadow::options::ShadowOptions;
    use crate::shadow::table::TableNaming;
    use serde_json::json;

    fn config(options: ShadowOptions) -> ShadowConfig {
        let catalog = SchemaCatalog::new()
            .with(EntitySchema::new("Invoice").columns(["id", "amount", "status"]))
            .with(EntitySchema::new("User"));
        ShadowConfig::resolve("Invoice", &options, &catalog, &TableNaming::default()).unwrap()
    }

    fn amount_changed(new_record: bool) -> ChangeSet {
        ChangeSet::new(
            new_record,
            vec![AttributeChange {
                name: "amount".into(),
                before: json!(100),
                after: json!(150),
            }],
        )
    }

    fn saved_invoice() -> Entity {
        let mut invoice = Entity::new("Invoice").with("amount", 150);
        invoice.id = Some(RecordId::new(1));
        invoice.bind_attachment("editor");
        invoice
    }

    #[test]
    fn test_builds_row_with_owner_and_attachment_keys() {
        let config = config(ShadowOptions::new().attach_as("editor", "User"));
        let mut invoice = saved_invoice();
        invoice
            .attach("editor", AttachmentRef::persisted("User", 7))
            .unwrap();

        let pending = build_attribute_shadow(&config, &invoice, &amount_changed(false))
            .unwrap()
            .unwrap();

        assert_eq!(pending.updated_attributes, vec!["amount"]);
        assert_eq!(pending.keys["invoice_id"], RecordId::new(1));
        assert_eq!(pending.keys["editor_id"], RecordId::new(7));
        assert_eq!(pending.version, None);
    }

    #[test]
    fn test_new_record_is_exempt() {
        let config = config(ShadowOptions::new());
        let pending = build_attribute_shadow(&config, &saved_invoice(), &amount_changed(true)).unwrap();
        assert!(pending.is_none());
    }

    #[test]
    fn test_empty_change_set_writes_nothing() {
        let config = config(ShadowOptions::new());
        let pending =
            build_attribute_shadow(&config, &saved_invoice(), &ChangeSet::default()).unwrap();
        assert!(pending.is_none());
    }

    #[test]
    fn test_version_stamp_from_versionable_owner() {
        let config = config(ShadowOptions::new());
        let mut invoice = saved_invoice();
        invoice.version = Some(4);

        let pending = build_attribute_shadow(&config, &invoice, &amount_changed(false))
            .unwrap()
            .unwrap();
        assert_eq!(pending.version, Some(4));
    }

    #[test]
    fn test_missing_attachment_fails() {
        let config = config(ShadowOptions::new().attach_as("editor", "User"));
        let err = build_attribute_shadow(&config, &saved_invoice(), &amount_changed(false))
            .unwrap_err();

        assert_eq!(err.to_string(), "Expected attached editor on Invoice.");
    }
}
