//! Shadow record resolvers
//!
//! Wrap a persisted shadow row with lazy, cached lookups of the record it
//! describes. A version stamp resolves to that historical snapshot instead of
//! the live record.

use std::cell::OnceCell;

use super::backend::RecordSource;
use super::config::ShadowConfig;
use super::rows::{AssociationShadow, AttributeShadow};
use crate::error::{ShadowError, ShadowResult};
use crate::models::schema::classify;
use crate::models::{Entity, RecordId};

/// Resolve a record id, optionally at a version, failing with `NotFound`
pub fn resolve_record(
    source: &dyn RecordSource,
    entity_type: &str,
    id: RecordId,
    version: Option<i64>,
) -> ShadowResult<Entity> {
    match version {
        None => source
            .find_record(entity_type, id)?
            .ok_or_else(|| ShadowError::not_found(entity_type, id.to_string())),
        Some(version) => source
            .find_version(entity_type, id, version)?
            .ok_or_else(|| ShadowError::not_found(entity_type, format!("{}@v{}", id, version))),
    }
}

fn cached<'c>(
    cell: &'c OnceCell<Entity>,
    load: impl FnOnce() -> ShadowResult<Entity>,
) -> ShadowResult<&'c Entity> {
    if let Some(entity) = cell.get() {
        return Ok(entity);
    }
    let entity = load()?;
    Ok(cell.get_or_init(|| entity))
}

/// An attribute shadow row with its owner resolvable on demand
#[derive(Debug)]
pub struct ResolvedAttributeShadow {
    row: AttributeShadow,
    owner_type: String,
    owner_key: String,
    owner: OnceCell<Entity>,
}

impl ResolvedAttributeShadow {
    pub fn new(row: AttributeShadow, config: &ShadowConfig) -> Self {
        Self {
            row,
            owner_type: config.entity_type.clone(),
            owner_key: config.attribute_table.owner_key.clone(),
            owner: OnceCell::new(),
        }
    }

    pub fn row(&self) -> &AttributeShadow {
        &self.row
    }

    pub fn into_row(self) -> AttributeShadow {
        self.row
    }

    pub fn owner_id(&self) -> Option<RecordId> {
        self.row.key(&self.owner_key)
    }

    /// The owner, at the row's version when it carries one
    pub fn owner(&self, source: &dyn RecordSource) -> ShadowResult<&Entity> {
        cached(&self.owner, || {
            let id = self.owner_id().ok_or_else(|| {
                ShadowError::Storage(format!(
                    "{} has no {} column",
                    self.row.id, self.owner_key
                ))
            })?;
            resolve_record(source, &self.owner_type, id, self.row.version)
        })
    }
}

/// An association shadow row with its related record and owner resolvable on demand
#[derive(Debug)]
pub struct ResolvedAssociationShadow {
    row: AssociationShadow,
    owner_type: String,
    owner_key: String,
    related_type: String,
    record: OnceCell<Entity>,
    owner: OnceCell<Entity>,
}

impl ResolvedAssociationShadow {
    pub fn new(row: AssociationShadow, config: &ShadowConfig) -> Self {
        let related_type = config
            .tracked_association(&row.association)
            .map(|a| a.target.clone())
            .unwrap_or_else(|| classify(&row.association));

        Self {
            row,
            owner_type: config.entity_type.clone(),
            owner_key: config.association_table.owner_key.clone(),
            related_type,
            record: OnceCell::new(),
            owner: OnceCell::new(),
        }
    }

    pub fn row(&self) -> &AssociationShadow {
        &self.row
    }

    pub fn into_row(self) -> AssociationShadow {
        self.row
    }

    pub fn related_type(&self) -> &str {
        &self.related_type
    }

    pub fn owner_id(&self) -> Option<RecordId> {
        self.row.key(&self.owner_key)
    }

    /// The related record, at the row's record version when it carries one
    pub fn record(&self, source: &dyn RecordSource) -> ShadowResult<&Entity> {
        cached(&self.record, || {
            resolve_record(
                source,
                &self.related_type,
                self.row.record_id,
                self.row.record_version,
            )
        })
    }

    /// The live owner
    pub fn owner(&self, source: &dyn RecordSource) -> ShadowResult<&Entity> {
        cached(&self.owner, || {
            let id = self.owner_id().ok_or_else(|| {
                ShadowError::Storage(format!(
                    "{} has no {} column",
                    self.row.id, self.owner_key
                ))
            })?;
            resolve_record(source, &self.owner_type, id, None)
        })
    }
}
