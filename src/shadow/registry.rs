//! Shadow registry
//!
//! Per-type configurations are registered once through [`RegistryBuilder`]
//! and then frozen into a read-only [`ShadowRegistry`].

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::binder::{bind_attachments, AccessorKind, BindingTable};
use super::config::ShadowConfig;
use super::options::ShadowOptions;
use super::table::TableNaming;
use crate::error::{ShadowError, ShadowResult};
use crate::models::{Entity, SchemaCatalog};

/// Collects shadow declarations before the registry is frozen
#[derive(Debug)]
pub struct RegistryBuilder {
    catalog: SchemaCatalog,
    naming: TableNaming,
    configs: BTreeMap<String, ShadowConfig>,
    options: BTreeMap<String, ShadowOptions>,
    bindings: BindingTable,
}

impl RegistryBuilder {
    pub fn new(catalog: SchemaCatalog) -> Self {
        Self {
            catalog,
            naming: TableNaming::default(),
            configs: BTreeMap::new(),
            options: BTreeMap::new(),
            bindings: BindingTable::default(),
        }
    }

    /// Set the table name prefix/suffix; applies to types registered afterwards
    pub fn with_naming(mut self, naming: TableNaming) -> Self {
        self.naming = naming;
        self
    }

    /// Enable shadowing on `entity_type`
    ///
    /// Registering a type twice keeps the first configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the options do not resolve against
    /// the catalog.
    pub fn shadow(
        &mut self,
        entity_type: &str,
        options: ShadowOptions,
    ) -> ShadowResult<&ShadowConfig> {
        if self.configs.contains_key(entity_type) {
            if self.options.get(entity_type) != Some(&options) {
                warn!(
                    entity_type,
                    "shadowing already enabled; ignoring different options"
                );
            }
            return self
                .configs
                .get(entity_type)
                .ok_or_else(|| ShadowError::Config(format!("{} is not shadowed", entity_type)));
        }

        let config = ShadowConfig::resolve(entity_type, &options, &self.catalog, &self.naming)?;
        for binding in bind_attachments(&config, &self.catalog)? {
            let (bound_type, attachment, kind) = (
                binding.entity_type.clone(),
                binding.attachment.clone(),
                binding.kind,
            );
            if self.bindings.insert(binding) {
                debug!(entity_type = %bound_type, attachment = %attachment, kind = %kind, "bound attachment");
            }
        }

        self.options.insert(entity_type.to_string(), options);
        Ok(self
            .configs
            .entry(entity_type.to_string())
            .or_insert(config))
    }

    pub fn build(self) -> ShadowRegistry {
        debug!(types = self.configs.len(), bindings = self.bindings.len(), "shadow registry built");
        ShadowRegistry {
            catalog: self.catalog,
            naming: self.naming,
            configs: self.configs,
            bindings: self.bindings,
        }
    }
}

/// Read-only shadow configuration for every registered type
#[derive(Debug, Clone)]
pub struct ShadowRegistry {
    catalog: SchemaCatalog,
    naming: TableNaming,
    configs: BTreeMap<String, ShadowConfig>,
    bindings: BindingTable,
}

impl ShadowRegistry {
    pub fn config(&self, entity_type: &str) -> Option<&ShadowConfig> {
        self.configs.get(entity_type)
    }

    /// Configuration for a type that must be shadowed
    pub fn require(&self, entity_type: &str) -> ShadowResult<&ShadowConfig> {
        self.config(entity_type)
            .ok_or_else(|| ShadowError::Config(format!("{} is not shadowed", entity_type)))
    }

    pub fn is_tracked(&self, entity_type: &str) -> bool {
        self.configs.contains_key(entity_type)
    }

    pub fn binding(&self, entity_type: &str, attachment: &str) -> Option<AccessorKind> {
        self.bindings.get(entity_type, attachment)
    }

    /// Ready a dynamic entity for the hooks
    ///
    /// `Entity` has no accessors of its own, so every bound attachment gets a
    /// slot, including those the schema declares as native. The version
    /// capability follows the schema.
    pub fn prepare(&self, entity: &mut Entity) {
        for name in self.bindings.attachments_for(&entity.entity_type) {
            entity.bind_attachment(name);
        }
        if let Some(schema) = self.catalog.get(&entity.entity_type) {
            for name in &schema.accessors {
                entity.bind_attachment(name);
            }
            entity.set_versioned(schema.versioned);
        }
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    pub fn naming(&self) -> &TableNaming {
        &self.naming
    }

    pub fn tracked_types(&self) -> impl Iterator<Item = &str> {
        self.configs.keys().map(String::as_str)
    }

    pub fn configs(&self) -> impl Iterator<Item = &ShadowConfig> {
        self.configs.values()
    }
}
