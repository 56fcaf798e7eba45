//! Persisted settings for shadow-trail
//!
//! The settings file declares the entity schemas known to the bundled store
//! and the shadow options for every tracked type.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::paths::ShadowPaths;
use crate::error::{ShadowError, ShadowResult};
use crate::models::{EntitySchema, SchemaCatalog};
use crate::shadow::{RegistryBuilder, ShadowOptions, ShadowRegistry, TableNaming};

/// Settings for shadow-trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Prepended to every shadow table name
    #[serde(default)]
    pub table_name_prefix: String,

    /// Appended to every shadow table name
    #[serde(default)]
    pub table_name_suffix: String,

    /// Default `tracing` filter when `SHADOW_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Entity schemas known to the store
    #[serde(default)]
    pub entities: Vec<EntitySchema>,

    /// Shadow options per tracked entity type
    #[serde(default)]
    pub shadows: BTreeMap<String, ShadowOptions>,
}

fn default_schema_version() -> u32 {
    1
}

fn default_log_filter() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            table_name_prefix: String::new(),
            table_name_suffix: String::new(),
            log_filter: default_log_filter(),
            entities: Vec::new(),
            shadows: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// An invoicing schema with `Invoice` shadowed and attached to its editor
    pub fn sample() -> Self {
        let entities = vec![
            EntitySchema::new("Invoice")
                .columns(["id", "amount", "status", "created_at", "updated_at"])
                .has_many("line_items")
                .versioned(),
            EntitySchema::new("LineItem").columns(["id", "sku", "quantity"]),
            EntitySchema::new("User").columns(["id", "name"]),
        ];

        let mut shadows = BTreeMap::new();
        shadows.insert(
            "Invoice".to_string(),
            ShadowOptions::new().attach_as("editor", "User"),
        );

        Self {
            entities,
            shadows,
            ..Self::default()
        }
    }

    /// Load settings from disk, or defaults if the file doesn't exist
    pub fn load_or_create(paths: &ShadowPaths) -> ShadowResult<Self> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| ShadowError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents)
                .map_err(|e| ShadowError::Config(format!("Failed to parse settings file: {}", e)))?;

            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &ShadowPaths) -> ShadowResult<()> {
        paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ShadowError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(paths.settings_file(), contents)
            .map_err(|e| ShadowError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }

    pub fn naming(&self) -> TableNaming {
        TableNaming::new(&self.table_name_prefix, &self.table_name_suffix)
    }

    pub fn catalog(&self) -> ShadowResult<SchemaCatalog> {
        let mut catalog = SchemaCatalog::new();
        for schema in &self.entities {
            if catalog.contains(&schema.name) {
                return Err(ShadowError::Config(format!(
                    "entity type {} is declared twice",
                    schema.name
                )));
            }
            catalog.insert(schema.clone());
        }
        Ok(catalog)
    }

    /// Build the shadow registry from the declared entities and shadows
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a duplicate entity declaration or
    /// any shadow declaration that does not resolve.
    pub fn registry(&self) -> ShadowResult<ShadowRegistry> {
        let mut builder = RegistryBuilder::new(self.catalog()?).with_naming(self.naming());
        for (entity_type, options) in &self.shadows {
            builder.shadow(entity_type, options.clone())?;
        }
        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shadow::Selection;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.schema_version, 1);
        assert_eq!(settings.log_filter, "warn");
        assert!(settings.entities.is_empty());
        assert_eq!(settings.registry().unwrap().tracked_types().count(), 0);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ShadowPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::sample();
        settings.table_name_prefix = "audit_".into();
        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_sample_registry() {
        let registry = Settings::sample().registry().unwrap();
        let config = registry.require("Invoice").unwrap();

        assert_eq!(config.tracked_attributes, vec!["amount", "status"]);
        assert_eq!(config.association_names().collect::<Vec<_>>(), vec!["line_items"]);
        assert_eq!(config.attachment_names().collect::<Vec<_>>(), vec!["editor"]);
    }

    #[test]
    fn test_parses_hand_written_settings() {
        let json = r#"{
            "table_name_suffix": "_log",
            "entities": [
                {"name": "Invoice", "columns": ["id", "amount", "status"]},
                {"name": "Editor", "columns": ["id"]}
            ],
            "shadows": {
                "Invoice": {"attributes": {"only": ["amount"]}, "associations": "none", "attach": "editor"}
            }
        }"#;
        let settings: Settings = serde_json::from_str(json).unwrap();

        assert_eq!(settings.log_filter, "warn");
        assert_eq!(
            settings.shadows["Invoice"].attributes,
            Selection::Only(vec!["amount".to_string()])
        );

        let registry = settings.registry().unwrap();
        let config = registry.require("Invoice").unwrap();
        assert_eq!(config.attribute_table.name, "invoice_attribute_shadows_log");
        assert_eq!(config.required_attachments[0].entity_type, "Editor");
    }

    #[test]
    fn test_duplicate_entity_is_config_error() {
        let mut settings = Settings::sample();
        settings.entities.push(EntitySchema::new("User"));
        assert!(settings.registry().unwrap_err().is_config());
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let paths = ShadowPaths::with_base_dir(temp_dir.path().to_path_buf());
        std::fs::write(paths.settings_file(), "{ nope").unwrap();

        assert!(Settings::load_or_create(&paths).unwrap_err().is_config());
    }
}
