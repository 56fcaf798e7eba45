//! Association shadow writer
//!
//! Runs inside the host's add/remove callbacks, once per related record.
//! Attachments are read off the related record, not the owner.

use tracing::info;

use super::backend::ShadowSink;
use super::binder::resolve_attachment_ids;
use super::config::{ShadowConfig, TrackedAssociation};
use super::rows::{AssociationShadow, PendingAssociationShadow, ShadowAction};
use crate::error::{ShadowError, ShadowResult};
use crate::models::{Record, Tracked};

/// Build the pending row for one mutation, or `None` for an unsaved related record
///
/// # Errors
///
/// Returns a validation error when the owner has no id, and
/// `AttachmentMissing` naming the related type when a required attachment is
/// absent or unpersisted on the related record.
pub fn build_association_shadow(
    config: &ShadowConfig,
    owner: &dyn Record,
    association: &TrackedAssociation,
    action: ShadowAction,
    related: &dyn Record,
) -> ShadowResult<Option<PendingAssociationShadow>> {
    let Some(record_id) = related.id() else {
        return Ok(None);
    };

    let owner_id = owner.id().ok_or_else(|| {
        ShadowError::Validation(format!(
            "cannot shadow '{}' on an unsaved {}",
            association.name,
            owner.entity_type()
        ))
    })?;

    let mut keys = resolve_attachment_ids(&config.required_attachments, related)?;
    keys.insert(config.association_table.owner_key.clone(), owner_id);

    Ok(Some(PendingAssociationShadow {
        association: association.name.clone(),
        action,
        record_id,
        record_version: related.as_versionable().map(|v| v.version()),
        keys,
    }))
}

/// Build and persist the shadow for one mutation, then buffer it on the owner
///
/// The buffer only ever lists rows the sink accepted.
pub fn store_association_shadow<O: Tracked>(
    config: &ShadowConfig,
    owner: &mut O,
    association: &TrackedAssociation,
    action: ShadowAction,
    related: &dyn Record,
    sink: &dyn ShadowSink,
) -> ShadowResult<Option<AssociationShadow>> {
    let Some(pending) = build_association_shadow(config, &*owner, association, action, related)?
    else {
        return Ok(None);
    };

    let row = sink.insert_association_shadow(&config.association_table, pending.clone())?;
    owner.shadow_state_mut().push_association(pending);

    info!(
        entity_type = %config.entity_type,
        table = %config.association_table.name,
        shadow = %row.id,
        association = %row.association,
        action = %row.action,
        record = %row.record_id,
        "wrote association shadow"
    );

    Ok(Some(row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttachmentRef, Entity, EntitySchema, RecordId, SchemaCatalog};
    use crate::shadow::options::ShadowOptions;
    use crate::shadow::rows::{AttributeShadow, PendingAttributeShadow};
    use crate::shadow::table::{TableLayout, TableNaming};

    fn config() -> ShadowConfig {
        let catalog = SchemaCatalog::new()
            .with(
                EntitySchema::new("Invoice")
                    .columns(["id", "amount"])
                    .has_many("line_items"),
            )
            .with(EntitySchema::new("LineItem").columns(["id", "sku"]))
            .with(EntitySchema::new("User"));
        ShadowConfig::resolve(
            "Invoice",
            &ShadowOptions::new().attach_as("editor", "User"),
            &catalog,
            &TableNaming::default(),
        )
        .unwrap()
    }

    fn owner() -> Entity {
        let mut invoice = Entity::new("Invoice");
        invoice.id = Some(RecordId::new(1));
        invoice
    }

    fn line_item(id: Option<i64>, editor: Option<i64>) -> Entity {
        let mut item = Entity::new("LineItem");
        item.id = id.map(RecordId::new);
        item.bind_attachment("editor");
        if let Some(editor) = editor {
            item.attach("editor", AttachmentRef::persisted("User", editor))
                .unwrap();
        }
        item
    }

    #[test]
    fn test_builds_added_row() {
        let config = config();
        let association = config.tracked_association("line_items").unwrap();

        let pending = build_association_shadow(
            &config,
            &owner(),
            association,
            ShadowAction::Added,
            &line_item(Some(42), Some(7)),
        )
        .unwrap()
        .unwrap();

        assert_eq!(pending.association, "line_items");
        assert_eq!(pending.action, ShadowAction::Added);
        assert_eq!(pending.record_id, RecordId::new(42));
        assert_eq!(pending.keys["invoice_id"], RecordId::new(1));
        assert_eq!(pending.keys["editor_id"], RecordId::new(7));
        assert_eq!(pending.record_version, None);
    }

    #[test]
    fn test_unsaved_related_record_is_skipped() {
        let config = config();
        let association = config.tracked_association("line_items").unwrap();

        let pending = build_association_shadow(
            &config,
            &owner(),
            association,
            ShadowAction::Removed,
            &line_item(None, None),
        )
        .unwrap();
        assert!(pending.is_none());
    }

    #[test]
    fn test_attachment_read_off_related_record() {
        let config = config();
        let association = config.tracked_association("line_items").unwrap();

        let mut invoice = owner();
        invoice.bind_attachment("editor");
        invoice
            .attach("editor", AttachmentRef::persisted("User", 7))
            .unwrap();

        let err = build_association_shadow(
            &config,
            &invoice,
            association,
            ShadowAction::Added,
            &line_item(Some(42), None),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Expected attached editor on LineItem.");
    }

    #[test]
    fn test_related_version_is_recorded() {
        let config = config();
        let association = config.tracked_association("line_items").unwrap();
        let mut item = line_item(Some(42), Some(7));
        item.version = Some(2);

        let pending =
            build_association_shadow(&config, &owner(), association, ShadowAction::Added, &item)
                .unwrap()
                .unwrap();
        assert_eq!(pending.record_version, Some(2));
    }

    #[test]
    fn test_unsaved_owner_is_rejected() {
        let config = config();
        let association = config.tracked_association("line_items").unwrap();

        let err = build_association_shadow(
            &config,
            &Entity::new("Invoice"),
            association,
            ShadowAction::Added,
            &line_item(Some(42), Some(7)),
        )
        .unwrap_err();
        assert!(matches!(err, ShadowError::Validation(_)));
    }

    struct RejectingSink;

    impl ShadowSink for RejectingSink {
        fn insert_attribute_shadow(
            &self,
            table: &TableLayout,
            _: PendingAttributeShadow,
        ) -> ShadowResult<AttributeShadow> {
            Err(ShadowError::Storage(format!("table {} does not exist", table.name)))
        }

        fn insert_association_shadow(
            &self,
            table: &TableLayout,
            _: PendingAssociationShadow,
        ) -> ShadowResult<AssociationShadow> {
            Err(ShadowError::Storage(format!("table {} does not exist", table.name)))
        }
    }

    #[test]
    fn test_failed_insert_leaves_buffer_empty() {
        let config = config();
        let association = config.tracked_association("line_items").unwrap();
        let mut invoice = owner();

        let err = store_association_shadow(
            &config,
            &mut invoice,
            association,
            ShadowAction::Added,
            &line_item(Some(42), Some(7)),
            &RejectingSink,
        )
        .unwrap_err();

        assert!(matches!(err, ShadowError::Storage(_)));
        assert!(invoice.shadow_state().updated_associations().is_empty());
    }
}
