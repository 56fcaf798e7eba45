//! Storage layer for shadow-trail
//!
//! The bundled store keeps records in one JSON document and every shadow
//! table in its own append-only JSONL file. [`Storage`] implements both host
//! ports the shadow hooks need.

pub mod file_io;
pub mod records;
pub mod shadow_table;

pub use file_io::{read_json, write_json_atomic};
pub use records::RecordRepository;
pub use shadow_table::ShadowTableFile;

use chrono::Utc;
use tracing::info;

use crate::config::paths::ShadowPaths;
use crate::error::ShadowResult;
use crate::models::{Entity, FieldMap, RecordId, ShadowId};
use crate::shadow::{
    AssociationShadow, AttributeShadow, RecordSource, ShadowConfig, ShadowKind, ShadowSink,
    TableLayout,
};
use crate::shadow::rows::{PendingAssociationShadow, PendingAttributeShadow};

/// Main storage coordinator
pub struct Storage {
    paths: ShadowPaths,
    pub records: RecordRepository,
}

impl Storage {
    /// Create a new Storage instance
    pub fn new(paths: ShadowPaths) -> ShadowResult<Self> {
        paths.ensure_directories()?;

        Ok(Self {
            records: RecordRepository::new(paths.records_file()),
            paths,
        })
    }

    pub fn paths(&self) -> &ShadowPaths {
        &self.paths
    }

    /// Load all records from disk
    pub fn load_all(&self) -> ShadowResult<()> {
        self.records.load()
    }

    /// Save all records to disk
    pub fn save_all(&self) -> ShadowResult<()> {
        self.records.save()
    }

    fn table<R>(&self, layout: &TableLayout) -> ShadowTableFile<R>
    where
        R: serde::Serialize + serde::de::DeserializeOwned,
    {
        ShadowTableFile::new(layout.name.clone(), self.paths.table_file(&layout.name))
    }

    pub fn attribute_table(&self, config: &ShadowConfig) -> ShadowTableFile<AttributeShadow> {
        self.table(&config.attribute_table)
    }

    pub fn association_table(&self, config: &ShadowConfig) -> ShadowTableFile<AssociationShadow> {
        self.table(&config.association_table)
    }

    /// Whether a type's shadow table of the given kind exists
    pub fn table_exists(&self, config: &ShadowConfig, kind: ShadowKind) -> bool {
        self.paths.table_file(&config.table(kind).name).exists()
    }

    /// Create (or recreate, emptying) both shadow tables of a type
    pub fn create_shadow_tables(&self, config: &ShadowConfig) -> ShadowResult<()> {
        self.attribute_table(config).create()?;
        self.association_table(config).create()?;
        info!(
            entity_type = %config.entity_type,
            attribute_table = %config.attribute_table.name,
            association_table = %config.association_table.name,
            "created shadow tables"
        );
        Ok(())
    }

    /// Drop both shadow tables of a type
    pub fn drop_shadow_tables(&self, config: &ShadowConfig) -> ShadowResult<()> {
        self.attribute_table(config).drop_table()?;
        self.association_table(config).drop_table()?;
        info!(entity_type = %config.entity_type, "dropped shadow tables");
        Ok(())
    }

    /// All attribute shadows of a type, oldest first
    pub fn attribute_shadows(&self, config: &ShadowConfig) -> ShadowResult<Vec<AttributeShadow>> {
        self.attribute_table(config).read_all()
    }

    /// All association shadows of a type, oldest first
    pub fn association_shadows(
        &self,
        config: &ShadowConfig,
    ) -> ShadowResult<Vec<AssociationShadow>> {
        self.association_table(config).read_all()
    }

    /// Attribute shadows belonging to one owner
    pub fn attribute_shadows_for(
        &self,
        config: &ShadowConfig,
        owner: RecordId,
    ) -> ShadowResult<Vec<AttributeShadow>> {
        let key = &config.attribute_table.owner_key;
        Ok(self
            .attribute_shadows(config)?
            .into_iter()
            .filter(|row| row.key(key) == Some(owner))
            .collect())
    }

    /// Association shadows belonging to one owner
    pub fn association_shadows_for(
        &self,
        config: &ShadowConfig,
        owner: RecordId,
    ) -> ShadowResult<Vec<AssociationShadow>> {
        let key = &config.association_table.owner_key;
        Ok(self
            .association_shadows(config)?
            .into_iter()
            .filter(|row| row.key(key) == Some(owner))
            .collect())
    }
}

impl RecordSource for Storage {
    fn find_projection(
        &self,
        entity_type: &str,
        id: RecordId,
        fields: &[String],
    ) -> ShadowResult<Option<FieldMap>> {
        self.records.projection(entity_type, id, fields)
    }

    fn find_record(&self, entity_type: &str, id: RecordId) -> ShadowResult<Option<Entity>> {
        self.records.get(entity_type, id)
    }

    fn find_version(
        &self,
        entity_type: &str,
        id: RecordId,
        version: i64,
    ) -> ShadowResult<Option<Entity>> {
        self.records.version(entity_type, id, version)
    }
}

impl ShadowSink for Storage {
    fn insert_attribute_shadow(
        &self,
        layout: &TableLayout,
        pending: PendingAttributeShadow,
    ) -> ShadowResult<AttributeShadow> {
        let table: ShadowTableFile<AttributeShadow> = self.table(layout);
        let id = ShadowId::new(table.row_count()? as i64 + 1);
        let row = AttributeShadow::from_pending(id, pending, Utc::now());
        table.append(&row)?;
        Ok(row)
    }

    fn insert_association_shadow(
        &self,
        layout: &TableLayout,
        pending: PendingAssociationShadow,
    ) -> ShadowResult<AssociationShadow> {
        let table: ShadowTableFile<AssociationShadow> = self.table(layout);
        let id = ShadowId::new(table.row_count()? as i64 + 1);
        let row = AssociationShadow::from_pending(id, pending, Utc::now());
        table.append(&row)?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntitySchema, SchemaCatalog};
    use crate::shadow::rows::{ForeignKeys, ShadowAction};
    use crate::shadow::{ShadowOptions, TableNaming};
    use tempfile::TempDir;

    fn setup() -> (TempDir, Storage, ShadowConfig) {
        let temp_dir = TempDir::new().unwrap();
        let paths = ShadowPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        let catalog = SchemaCatalog::new()
            .with(
                EntitySchema::new("Invoice")
                    .columns(["id", "amount"])
                    .has_many("line_items"),
            )
            .with(EntitySchema::new("LineItem"));
        let config =
            ShadowConfig::resolve("Invoice", &ShadowOptions::new(), &catalog, &TableNaming::default())
                .unwrap();
        (temp_dir, storage, config)
    }

    fn owner_keys(owner: i64) -> ForeignKeys {
        let mut keys = ForeignKeys::new();
        keys.insert("invoice_id".into(), RecordId::new(owner));
        keys
    }

    fn pending_attribute(owner: i64) -> PendingAttributeShadow {
        PendingAttributeShadow {
            updated_attributes: vec!["amount".into()],
            version: None,
            keys: owner_keys(owner),
        }
    }

    #[test]
    fn test_storage_creation() {
        let (temp_dir, _storage, _config) = setup();
        assert!(temp_dir.path().join("data").join("tables").exists());
    }

    #[test]
    fn test_insert_requires_created_table() {
        let (_temp_dir, storage, config) = setup();
        assert!(storage
            .insert_attribute_shadow(&config.attribute_table, pending_attribute(1))
            .is_err());
    }

    #[test]
    fn test_rows_get_sequential_ids() {
        let (_temp_dir, storage, config) = setup();
        storage.create_shadow_tables(&config).unwrap();

        let first = storage
            .insert_attribute_shadow(&config.attribute_table, pending_attribute(1))
            .unwrap();
        let second = storage
            .insert_attribute_shadow(&config.attribute_table, pending_attribute(2))
            .unwrap();

        assert_eq!(first.id, ShadowId::new(1));
        assert_eq!(second.id, ShadowId::new(2));
        assert_eq!(storage.attribute_shadows(&config).unwrap().len(), 2);
    }

    #[test]
    fn test_owner_scoped_queries() {
        let (_temp_dir, storage, config) = setup();
        storage.create_shadow_tables(&config).unwrap();

        storage
            .insert_attribute_shadow(&config.attribute_table, pending_attribute(1))
            .unwrap();
        storage
            .insert_attribute_shadow(&config.attribute_table, pending_attribute(2))
            .unwrap();
        storage
            .insert_association_shadow(
                &config.association_table,
                PendingAssociationShadow {
                    association: "line_items".into(),
                    action: ShadowAction::Added,
                    record_id: RecordId::new(9),
                    record_version: None,
                    keys: owner_keys(2),
                },
            )
            .unwrap();

        assert_eq!(
            storage
                .attribute_shadows_for(&config, RecordId::new(1))
                .unwrap()
                .len(),
            1
        );
        assert!(storage
            .association_shadows_for(&config, RecordId::new(1))
            .unwrap()
            .is_empty());
        assert_eq!(
            storage
                .association_shadows_for(&config, RecordId::new(2))
                .unwrap()[0]
                .record_id,
            RecordId::new(9)
        );
    }

    #[test]
    fn test_drop_tables() {
        let (_temp_dir, storage, config) = setup();
        assert!(storage.drop_shadow_tables(&config).is_err());

        storage.create_shadow_tables(&config).unwrap();
        assert!(storage.table_exists(&config, ShadowKind::Attribute));

        storage.drop_shadow_tables(&config).unwrap();
        assert!(!storage.table_exists(&config, ShadowKind::Association));
    }
}
