//! Shadow table naming and column layout

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::schema::underscore;

/// The two shadow tables every tracked type owns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShadowKind {
    Attribute,
    Association,
}

impl ShadowKind {
    fn table_suffix(&self) -> &'static str {
        match self {
            ShadowKind::Attribute => "_attribute_shadows",
            ShadowKind::Association => "_association_shadows",
        }
    }
}

impl fmt::Display for ShadowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShadowKind::Attribute => write!(f, "attribute"),
            ShadowKind::Association => write!(f, "association"),
        }
    }
}

/// Table name prefix/suffix applied to every shadow table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableNaming {
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub suffix: String,
}

impl TableNaming {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    pub fn table_name(&self, entity_type: &str, kind: ShadowKind) -> String {
        [
            self.prefix.as_str(),
            &underscore(entity_type),
            kind.table_suffix(),
            self.suffix.as_str(),
        ]
        .concat()
    }
}

/// Column types used by the shadow tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    String,
    Integer,
    Datetime,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Text => write!(f, "text"),
            ColumnType::String => write!(f, "string"),
            ColumnType::Integer => write!(f, "integer"),
            ColumnType::Datetime => write!(f, "datetime"),
        }
    }
}

/// One column of a shadow table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
}

impl Column {
    fn new(name: impl Into<String>, column_type: ColumnType, nullable: bool) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable,
        }
    }
}

/// Resolved layout of one shadow table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    pub name: String,
    pub kind: ShadowKind,
    /// Owner foreign key column (e.g. `invoice_id`)
    pub owner_key: String,
    /// One foreign key column per required attachment (e.g. `editor_id`)
    pub attachment_keys: Vec<String>,
}

impl TableLayout {
    /// Full column list, in declaration order
    pub fn columns(&self) -> Vec<Column> {
        let mut columns = vec![Column::new("id", ColumnType::Integer, false)];

        match self.kind {
            ShadowKind::Attribute => {
                columns.push(Column::new("updated_attributes", ColumnType::Text, false));
                columns.push(Column::new("version", ColumnType::Integer, true));
            }
            ShadowKind::Association => {
                columns.push(Column::new("association", ColumnType::String, false));
                columns.push(Column::new("action", ColumnType::String, false));
                columns.push(Column::new("record_id", ColumnType::Integer, false));
                columns.push(Column::new("record_version", ColumnType::Integer, true));
            }
        }

        columns.push(Column::new("created_at", ColumnType::Datetime, false));
        columns.push(Column::new("updated_at", ColumnType::Datetime, false));
        columns.push(Column::new(self.owner_key.clone(), ColumnType::Integer, false));
        for key in &self.attachment_keys {
            columns.push(Column::new(key.clone(), ColumnType::Integer, false));
        }

        columns
    }

    /// First column name that appears more than once
    pub fn duplicate_column(&self) -> Option<String> {
        let mut seen = HashSet::new();
        self.columns()
            .into_iter()
            .map(|column| column.name)
            .find(|name| !seen.insert(name.clone()))
    }
}

/// Foreign key column for an attachment (`editor` -> `editor_id`)
pub fn attachment_key(attachment: &str) -> String {
    format!("{}_id", attachment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names() {
        let naming = TableNaming::default();
        assert_eq!(
            naming.table_name("Invoice", ShadowKind::Attribute),
            "invoice_attribute_shadows"
        );
        assert_eq!(
            naming.table_name("LineItem", ShadowKind::Association),
            "line_item_association_shadows"
        );
    }

    #[test]
    fn test_table_names_with_prefix_and_suffix() {
        let naming = TableNaming::new("app_", "_v1");
        assert_eq!(
            naming.table_name("Invoice", ShadowKind::Attribute),
            "app_invoice_attribute_shadows_v1"
        );
    }

    #[test]
    fn test_attribute_columns() {
        let layout = TableLayout {
            name: "invoice_attribute_shadows".into(),
            kind: ShadowKind::Attribute,
            owner_key: "invoice_id".into(),
            attachment_keys: vec!["editor_id".into()],
        };

        let names: Vec<_> = layout.columns().into_iter().map(|c| c.name).collect();
        assert_eq!(
            names,
            vec![
                "id",
                "updated_attributes",
                "version",
                "created_at",
                "updated_at",
                "invoice_id",
                "editor_id"
            ]
        );
    }

    #[test]
    fn test_association_columns() {
        let layout = TableLayout {
            name: "invoice_association_shadows".into(),
            kind: ShadowKind::Association,
            owner_key: "invoice_id".into(),
            attachment_keys: vec![],
        };

        let columns = layout.columns();
        let record_version = columns.iter().find(|c| c.name == "record_version").unwrap();
        assert!(record_version.nullable);
        assert!(columns.iter().any(|c| c.name == "action"));
        assert!(!columns.iter().any(|c| c.name == "updated_attributes"));
    }

    #[test]
    fn test_duplicate_column() {
        let mut layout = TableLayout {
            name: "invoice_association_shadows".into(),
            kind: ShadowKind::Association,
            owner_key: "invoice_id".into(),
            attachment_keys: vec!["editor_id".into()],
        };
        assert_eq!(layout.duplicate_column(), None);

        layout.attachment_keys.push("record_id".into());
        assert_eq!(layout.duplicate_column().as_deref(), Some("record_id"));

        layout.kind = ShadowKind::Attribute;
        assert_eq!(layout.duplicate_column(), None);
    }
}
