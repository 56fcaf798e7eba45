//! Shadow display formatting
//!
//! Formats shadow rows, table layouts and configurations for terminal output.

use crate::models::RecordId;
use crate::shadow::{AssociationShadow, AttributeShadow, ShadowConfig, TableLayout};

fn key_or_dash(key: Option<RecordId>) -> String {
    key.map(|id| id.get().to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn version_or_dash(version: Option<i64>) -> String {
    version
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn width(header: &str, cells: impl Iterator<Item = usize>) -> usize {
    cells.max().unwrap_or(0).max(header.len())
}

/// Format attribute shadow rows as a table
pub fn format_attribute_shadows(rows: &[AttributeShadow], layout: &TableLayout) -> String {
    if rows.is_empty() {
        return format!("No rows in {}.\n", layout.name);
    }

    let attributes: Vec<String> = rows.iter().map(|r| r.updated_attributes.join(", ")).collect();
    let attributes_width = width("Attributes", attributes.iter().map(String::len));
    let owner_width = layout.owner_key.len();

    let mut output = String::new();
    output.push_str(&format!(
        "{:>6}  {:>owner_width$}  {:<attributes_width$}  {:>7}",
        "ID",
        layout.owner_key,
        "Attributes",
        "Version",
        owner_width = owner_width,
        attributes_width = attributes_width,
    ));
    for key in &layout.attachment_keys {
        output.push_str(&format!("  {:>width$}", key, width = key.len()));
    }
    output.push_str("  Created\n");

    output.push_str(&format!(
        "{:->6}  {:->owner_width$}  {:-<attributes_width$}  {:->7}",
        "",
        "",
        "",
        "",
        owner_width = owner_width,
        attributes_width = attributes_width,
    ));
    for key in &layout.attachment_keys {
        output.push_str(&format!("  {:->width$}", "", width = key.len()));
    }
    output.push_str(&format!("  {:-<19}\n", ""));

    for (row, attributes) in rows.iter().zip(&attributes) {
        output.push_str(&format!(
            "{:>6}  {:>owner_width$}  {:<attributes_width$}  {:>7}",
            row.id.get(),
            key_or_dash(row.key(&layout.owner_key)),
            attributes,
            version_or_dash(row.version),
            owner_width = owner_width,
            attributes_width = attributes_width,
        ));
        for key in &layout.attachment_keys {
            output.push_str(&format!(
                "  {:>width$}",
                key_or_dash(row.key(key)),
                width = key.len()
            ));
        }
        output.push_str(&format!(
            "  {}\n",
            row.created_at.format("%Y-%m-%d %H:%M:%S")
        ));
    }

    output
}

/// Format association shadow rows as a table
pub fn format_association_shadows(rows: &[AssociationShadow], layout: &TableLayout) -> String {
    if rows.is_empty() {
        return format!("No rows in {}.\n", layout.name);
    }

    let association_width = width("Association", rows.iter().map(|r| r.association.len()));
    let owner_width = layout.owner_key.len();

    let mut output = String::new();
    output.push_str(&format!(
        "{:>6}  {:>owner_width$}  {:<association_width$}  {:<7}  {:>6}  {:>7}",
        "ID",
        layout.owner_key,
        "Association",
        "Action",
        "Record",
        "Version",
        owner_width = owner_width,
        association_width = association_width,
    ));
    for key in &layout.attachment_keys {
        output.push_str(&format!("  {:>width$}", key, width = key.len()));
    }
    output.push_str("  Created\n");

    output.push_str(&format!(
        "{:->6}  {:->owner_width$}  {:-<association_width$}  {:-<7}  {:->6}  {:->7}",
        "",
        "",
        "",
        "",
        "",
        "",
        owner_width = owner_width,
        association_width = association_width,
    ));
    for key in &layout.attachment_keys {
        output.push_str(&format!("  {:->width$}", "", width = key.len()));
    }
    output.push_str(&format!("  {:-<19}\n", ""));

    for row in rows {
        output.push_str(&format!(
            "{:>6}  {:>owner_width$}  {:<association_width$}  {:<7}  {:>6}  {:>7}",
            row.id.get(),
            key_or_dash(row.key(&layout.owner_key)),
            row.association,
            row.action.to_string(),
            row.record_id.get(),
            version_or_dash(row.record_version),
            owner_width = owner_width,
            association_width = association_width,
        ));
        for key in &layout.attachment_keys {
            output.push_str(&format!(
                "  {:>width$}",
                key_or_dash(row.key(key)),
                width = key.len()
            ));
        }
        output.push_str(&format!(
            "  {}\n",
            row.created_at.format("%Y-%m-%d %H:%M:%S")
        ));
    }

    output
}

/// Format the column list of a shadow table
pub fn format_table_layout(layout: &TableLayout) -> String {
    let columns = layout.columns();
    let name_width = width("Column", columns.iter().map(|c| c.name.len()));

    let mut output = format!("{} ({} shadows)\n", layout.name, layout.kind);
    for column in columns {
        output.push_str(&format!(
            "  {:<name_width$}  {:<8}  {}\n",
            column.name,
            column.column_type.to_string(),
            if column.nullable { "null" } else { "not null" },
            name_width = name_width,
        ));
    }
    output
}

/// Format a resolved shadow configuration with both table layouts
pub fn format_shadow_config(config: &ShadowConfig) -> String {
    fn list<'a>(items: impl Iterator<Item = &'a str>) -> String {
        let joined = items.collect::<Vec<_>>().join(", ");
        if joined.is_empty() {
            "(none)".to_string()
        } else {
            joined
        }
    }

    let mut output = String::new();
    output.push_str(&format!("Shadow configuration for {}\n", config.entity_type));
    output.push_str(&format!(
        "  Attributes:   {}\n",
        list(config.tracked_attributes.iter().map(String::as_str))
    ));
    output.push_str(&format!(
        "  Skipped:      {}\n",
        list(config.skipped_attributes.iter().map(String::as_str))
    ));
    output.push_str(&format!(
        "  Associations: {}\n",
        list(config.association_names())
    ));
    output.push_str(&format!(
        "  Attachments:  {}\n",
        list(config.attachment_names())
    ));
    output.push('\n');
    output.push_str(&format_table_layout(&config.attribute_table));
    output.push('\n');
    output.push_str(&format_table_layout(&config.association_table));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntitySchema, SchemaCatalog, ShadowId};
    use crate::shadow::rows::{ForeignKeys, PendingAssociationShadow, PendingAttributeShadow};
    use crate::shadow::{ShadowAction, ShadowOptions, TableNaming};
    use chrono::Utc;

    fn config() -> ShadowConfig {
        let catalog = SchemaCatalog::new()
            .with(
                EntitySchema::new("Invoice")
                    .columns(["id", "amount", "status"])
                    .has_many("line_items"),
            )
            .with(EntitySchema::new("LineItem"))
            .with(EntitySchema::new("User"));
        ShadowConfig::resolve(
            "Invoice",
            &ShadowOptions::new().attach_as("editor", "User"),
            &catalog,
            &TableNaming::default(),
        )
        .unwrap()
    }

    fn keys() -> ForeignKeys {
        let mut keys = ForeignKeys::new();
        keys.insert("invoice_id".into(), RecordId::new(1));
        keys.insert("editor_id".into(), RecordId::new(7));
        keys
    }

    #[test]
    fn test_empty_tables() {
        let config = config();
        assert_eq!(
            format_attribute_shadows(&[], &config.attribute_table),
            "No rows in invoice_attribute_shadows.\n"
        );
        assert!(format_association_shadows(&[], &config.association_table).contains("No rows"));
    }

    #[test]
    fn test_attribute_table_has_key_columns() {
        let config = config();
        let row = AttributeShadow::from_pending(
            ShadowId::new(1),
            PendingAttributeShadow {
                updated_attributes: vec!["amount".into(), "status".into()],
                version: Some(2),
                keys: keys(),
            },
            Utc::now(),
        );

        let output = format_attribute_shadows(&[row], &config.attribute_table);
        assert!(output.contains("invoice_id"));
        assert!(output.contains("editor_id"));
        assert!(output.contains("amount, status"));
        assert_eq!(output.lines().count(), 3);
    }

    #[test]
    fn test_association_table() {
        let config = config();
        let row = AssociationShadow::from_pending(
            ShadowId::new(1),
            PendingAssociationShadow {
                association: "line_items".into(),
                action: ShadowAction::Removed,
                record_id: RecordId::new(42),
                record_version: None,
                keys: keys(),
            },
            Utc::now(),
        );

        let output = format_association_shadows(&[row], &config.association_table);
        assert!(output.contains("removed"));
        assert!(output.contains("42"));
    }

    #[test]
    fn test_config_lists_tables() {
        let output = format_shadow_config(&config());
        assert!(output.contains("Attributes:   amount, status"));
        assert!(output.contains("Attachments:  editor"));
        assert!(output.contains("invoice_association_shadows (association shadows)"));
        assert!(output.contains("record_version"));
    }
}
