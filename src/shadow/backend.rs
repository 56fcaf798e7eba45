//! Ports the host storage must provide

use super::rows::{
    AssociationShadow, AttributeShadow, PendingAssociationShadow, PendingAttributeShadow,
};
use super::table::TableLayout;
use crate::error::ShadowResult;
use crate::models::{Entity, FieldMap, RecordId};

/// Read access to durable records
pub trait RecordSource {
    /// Reload the persisted values of `fields` for one record, bypassing caches
    fn find_projection(
        &self,
        entity_type: &str,
        id: RecordId,
        fields: &[String],
    ) -> ShadowResult<Option<FieldMap>>;

    /// Current live record
    fn find_record(&self, entity_type: &str, id: RecordId) -> ShadowResult<Option<Entity>>;

    /// Historical snapshot of a record at `version`
    fn find_version(
        &self,
        entity_type: &str,
        id: RecordId,
        version: i64,
    ) -> ShadowResult<Option<Entity>>;
}

/// Append-only persistence for shadow rows
pub trait ShadowSink {
    fn insert_attribute_shadow(
        &self,
        table: &TableLayout,
        row: PendingAttributeShadow,
    ) -> ShadowResult<AttributeShadow>;

    fn insert_association_shadow(
        &self,
        table: &TableLayout,
        row: PendingAssociationShadow,
    ) -> ShadowResult<AssociationShadow>;
}
