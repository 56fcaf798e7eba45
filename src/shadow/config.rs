//! Configuration resolver
//!
//! Turns declarative [`ShadowOptions`] plus the entity's schema into the
//! resolved, immutable [`ShadowConfig`] the detector and writers consume.

use tracing::debug;

use super::options::{Selection, ShadowOptions};
use super::table::{attachment_key, ShadowKind, TableLayout, TableNaming};
use crate::error::{ShadowError, ShadowResult};
use crate::models::schema::{classify, foreign_key, SchemaCatalog};

/// Attributes never shadowed
pub const DEFAULT_SKIPPED_ATTRIBUTES: [&str; 4] = ["created_at", "updated_at", "id", "version"];

/// Associations never shadowed (the version history itself)
pub const DEFAULT_SKIPPED_ASSOCIATIONS: [&str; 1] = ["versions"];

/// A tracked association and the type it points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedAssociation {
    pub name: String,
    pub target: String,
}

/// A required attachment and the type it references
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub entity_type: String,
}

impl Attachment {
    /// Foreign key column carrying this attachment on shadow rows
    pub fn key(&self) -> String {
        attachment_key(&self.name)
    }
}

/// Resolved shadow configuration for one entity type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowConfig {
    pub entity_type: String,
    pub tracked_attributes: Vec<String>,
    pub skipped_attributes: Vec<String>,
    pub tracked_associations: Vec<TrackedAssociation>,
    pub skipped_associations: Vec<String>,
    pub required_attachments: Vec<Attachment>,
    pub attribute_table: TableLayout,
    pub association_table: TableLayout,
}

impl ShadowConfig {
    /// Resolve options against the catalog
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown entity type, attribute,
    /// association, association target or attachment type.
    pub fn resolve(
        entity_type: &str,
        options: &ShadowOptions,
        catalog: &SchemaCatalog,
        naming: &TableNaming,
    ) -> ShadowResult<Self> {
        let schema = catalog.require(entity_type)?;

        let skipped_attributes = unique(
            options
                .skip_attributes
                .iter()
                .map(String::as_str)
                .chain(DEFAULT_SKIPPED_ATTRIBUTES),
        );

        let tracked_attributes = match &options.attributes {
            Selection::None => Vec::new(),
            Selection::Only(names) => {
                for name in names {
                    if !schema.has_column(name) {
                        return Err(ShadowError::Config(format!(
                            "unknown attribute '{}' on {}",
                            name, entity_type
                        )));
                    }
                }
                without(names, &skipped_attributes)
            }
            Selection::All => without(&schema.columns, &skipped_attributes),
        };

        let skipped_associations = unique(
            options
                .skip_associations
                .iter()
                .map(String::as_str)
                .chain(DEFAULT_SKIPPED_ASSOCIATIONS),
        );

        let association_names = match &options.associations {
            Selection::None => Vec::new(),
            Selection::Only(names) => without(names, &skipped_associations),
            Selection::All => {
                let declared: Vec<String> =
                    schema.associations.iter().map(|a| a.name.clone()).collect();
                without(&declared, &skipped_associations)
            }
        };

        let mut tracked_associations = Vec::with_capacity(association_names.len());
        for name in association_names {
            let association = schema.association(&name).ok_or_else(|| {
                ShadowError::Config(format!(
                    "unknown association '{}' on {}",
                    name, entity_type
                ))
            })?;
            let target = association.target();
            if !catalog.contains(&target) {
                return Err(ShadowError::Config(format!(
                    "association '{}' on {} points at unknown type '{}'",
                    name, entity_type, target
                )));
            }
            tracked_associations.push(TrackedAssociation { name, target });
        }

        let mut required_attachments: Vec<Attachment> = Vec::new();
        for name in &options.attach {
            let name = name.trim();
            if name.is_empty() {
                return Err(ShadowError::Config(format!(
                    "empty attachment name on {}",
                    entity_type
                )));
            }
            if required_attachments.iter().any(|a| a.name == name) {
                continue;
            }
            let attachment_type = options
                .attachment_types
                .get(name)
                .cloned()
                .unwrap_or_else(|| classify(name));
            if !catalog.contains(&attachment_type) {
                return Err(ShadowError::Config(format!(
                    "attachment '{}' on {} references unknown type '{}'",
                    name, entity_type, attachment_type
                )));
            }
            required_attachments.push(Attachment {
                name: name.to_string(),
                entity_type: attachment_type,
            });
        }

        let owner_key = foreign_key(entity_type);
        let attachment_keys: Vec<String> = required_attachments.iter().map(Attachment::key).collect();

        let config = Self {
            entity_type: entity_type.to_string(),
            tracked_attributes,
            skipped_attributes,
            tracked_associations,
            skipped_associations,
            required_attachments,
            attribute_table: TableLayout {
                name: naming.table_name(entity_type, ShadowKind::Attribute),
                kind: ShadowKind::Attribute,
                owner_key: owner_key.clone(),
                attachment_keys: attachment_keys.clone(),
            },
            association_table: TableLayout {
                name: naming.table_name(entity_type, ShadowKind::Association),
                kind: ShadowKind::Association,
                owner_key,
                attachment_keys,
            },
        };

        for layout in [&config.attribute_table, &config.association_table] {
            if let Some(column) = layout.duplicate_column() {
                return Err(ShadowError::Config(format!(
                    "attachment key '{}' on {} collides with another column of {}",
                    column, entity_type, layout.name
                )));
            }
        }

        debug!(
            entity_type,
            attributes = ?config.tracked_attributes,
            associations = ?config.association_names().collect::<Vec<_>>(),
            attachments = ?config.attachment_names().collect::<Vec<_>>(),
            "resolved shadow configuration"
        );

        Ok(config)
    }

    pub fn tracks_attribute(&self, name: &str) -> bool {
        self.tracked_attributes.iter().any(|a| a == name)
    }

    pub fn tracked_association(&self, name: &str) -> Option<&TrackedAssociation> {
        self.tracked_associations.iter().find(|a| a.name == name)
    }

    pub fn association_names(&self) -> impl Iterator<Item = &str> {
        self.tracked_associations.iter().map(|a| a.name.as_str())
    }

    pub fn attachment_names(&self) -> impl Iterator<Item = &str> {
        self.required_attachments.iter().map(|a| a.name.as_str())
    }

    /// Table layout for the given kind of shadow row
    pub fn table(&self, kind: ShadowKind) -> &TableLayout {
        match kind {
            ShadowKind::Attribute => &self.attribute_table,
            ShadowKind::Association => &self.association_table,
        }
    }
}

/// De-duplicate while keeping first-seen order
fn unique<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in names {
        if !out.iter().any(|n| n == name) {
            out.push(name.to_string());
        }
    }
    out
}

fn without(names: &[String], skipped: &[String]) -> Vec<String> {
    unique(
        names
            .iter()
            .map(String::as_str)
            .filter(|name| !skipped.iter().any(|s| s == name)),
    )
}
