//! Record repository for JSON storage
//!
//! Manages loading and saving entities and their version snapshots to
//! records.json

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::{ShadowError, ShadowResult};
use crate::models::{Entity, FieldMap, Record, RecordId};

use super::file_io::{read_json, write_json_atomic};

type RecordKey = (String, RecordId);
type VersionKey = (String, RecordId, i64);

/// Serializable record data structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RecordData {
    #[serde(default)]
    next_id: BTreeMap<String, i64>,
    #[serde(default)]
    records: Vec<Entity>,
    #[serde(default)]
    versions: Vec<Entity>,
}

#[derive(Debug, Default)]
struct RecordTables {
    next_id: BTreeMap<String, i64>,
    live: HashMap<RecordKey, Entity>,
    versions: HashMap<VersionKey, Entity>,
}

/// Repository for record persistence
pub struct RecordRepository {
    path: PathBuf,
    data: RwLock<RecordTables>,
}

impl RecordRepository {
    /// Create a new record repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(RecordTables::default()),
        }
    }

    /// Load records from disk
    pub fn load(&self) -> ShadowResult<()> {
        let file_data: RecordData = read_json(&self.path)?;

        let mut data = self
            .data
            .write()
            .map_err(|e| ShadowError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        data.live.clear();
        data.versions.clear();
        data.next_id = file_data.next_id;

        for record in file_data.records {
            if let Some(id) = record.id {
                data.live.insert((record.entity_type.clone(), id), record);
            }
        }
        for snapshot in file_data.versions {
            if let (Some(id), Some(version)) = (snapshot.id, snapshot.version) {
                data.versions
                    .insert((snapshot.entity_type.clone(), id, version), snapshot);
            }
        }

        Ok(())
    }

    /// Save records to disk
    pub fn save(&self) -> ShadowResult<()> {
        let data = self
            .data
            .read()
            .map_err(|e| ShadowError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut records: Vec<Entity> = data.live.values().cloned().collect();
        records.sort_by(|a, b| a.entity_type.cmp(&b.entity_type).then(a.id.cmp(&b.id)));

        let mut versions: Vec<Entity> = data.versions.values().cloned().collect();
        versions.sort_by(|a, b| {
            a.entity_type
                .cmp(&b.entity_type)
                .then(a.id.cmp(&b.id))
                .then(a.version.cmp(&b.version))
        });

        let file_data = RecordData {
            next_id: data.next_id.clone(),
            records,
            versions,
        };

        write_json_atomic(&self.path, &file_data)
    }

    /// Get a live record by type and id
    pub fn get(&self, entity_type: &str, id: RecordId) -> ShadowResult<Option<Entity>> {
        let data = self
            .data
            .read()
            .map_err(|e| ShadowError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.live.get(&(entity_type.to_string(), id)).cloned())
    }

    /// Get all live records of a type, ordered by id
    pub fn get_all(&self, entity_type: &str) -> ShadowResult<Vec<Entity>> {
        let data = self
            .data
            .read()
            .map_err(|e| ShadowError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut records: Vec<Entity> = data
            .live
            .values()
            .filter(|r| r.entity_type == entity_type)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.id);
        Ok(records)
    }

    /// Durable values of the named fields, as last saved
    pub fn projection(
        &self,
        entity_type: &str,
        id: RecordId,
        fields: &[String],
    ) -> ShadowResult<Option<FieldMap>> {
        Ok(self.get(entity_type, id)?.map(|record| {
            fields
                .iter()
                .filter_map(|name| record.get(name).map(|value| (name.clone(), value)))
                .collect()
        }))
    }

    /// Get the snapshot of a record at a version
    pub fn version(
        &self,
        entity_type: &str,
        id: RecordId,
        version: i64,
    ) -> ShadowResult<Option<Entity>> {
        let data = self
            .data
            .read()
            .map_err(|e| ShadowError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data
            .versions
            .get(&(entity_type.to_string(), id, version))
            .cloned())
    }

    /// Insert a new record, assigning the next id for its type
    pub fn insert(&self, record: &mut Entity) -> ShadowResult<RecordId> {
        if record.id.is_some() {
            return Err(ShadowError::Validation(format!(
                "{} {} is already persisted",
                record.entity_type,
                record.id.map(|id| id.to_string()).unwrap_or_default()
            )));
        }

        let mut data = self
            .data
            .write()
            .map_err(|e| ShadowError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        let next = data.next_id.entry(record.entity_type.clone()).or_insert(0);
        *next += 1;
        let id = RecordId::new(*next);

        record.id = Some(id);
        Self::store(&mut data, record);
        Ok(id)
    }

    /// Replace an existing record
    pub fn update(&self, record: &Entity) -> ShadowResult<()> {
        let id = record
            .id
            .ok_or_else(|| ShadowError::Validation(format!("{} has no id", record.entity_type)))?;

        let mut data = self
            .data
            .write()
            .map_err(|e| ShadowError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        if !data.live.contains_key(&(record.entity_type.clone(), id)) {
            return Err(ShadowError::not_found(record.entity_type.clone(), id.to_string()));
        }

        Self::store(&mut data, record);
        Ok(())
    }

    /// Replace the stored links of a record, leaving its fields untouched
    pub fn update_links(
        &self,
        entity_type: &str,
        id: RecordId,
        links: &BTreeMap<String, Vec<RecordId>>,
    ) -> ShadowResult<()> {
        let mut data = self
            .data
            .write()
            .map_err(|e| ShadowError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        let record = data
            .live
            .get_mut(&(entity_type.to_string(), id))
            .ok_or_else(|| ShadowError::not_found(entity_type, id.to_string()))?;
        record.links = links.clone();
        Ok(())
    }

    /// Count live records of a type
    pub fn count(&self, entity_type: &str) -> ShadowResult<usize> {
        let data = self
            .data
            .read()
            .map_err(|e| ShadowError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.live.keys().filter(|(t, _)| t == entity_type).count())
    }

    fn store(data: &mut RecordTables, record: &Entity) {
        let Some(id) = record.id else {
            return;
        };
        let snapshot = record.snapshot();
        if let Some(version) = snapshot.version {
            data.versions
                .insert((snapshot.entity_type.clone(), id, version), snapshot.clone());
        }
        data.live.insert((snapshot.entity_type.clone(), id), snapshot);
    }
}
