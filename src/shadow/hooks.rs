//! Lifecycle hooks
//!
//! The entry points a host calls around saves and association mutations.
//! Types or associations without a shadow configuration pass through
//! untouched.

use tracing::debug;

use super::association_writer::store_association_shadow;
use super::attribute_writer::store_attribute_shadow;
use super::backend::{RecordSource, ShadowSink};
use super::detector::detect_changes;
use super::registry::ShadowRegistry;
use super::rows::{AssociationShadow, AttributeShadow, ShadowAction};
use crate::error::ShadowResult;
use crate::models::{Record, Tracked};

/// Drives detection and shadow writes for one unit of work
pub struct Shadower<'a> {
    registry: &'a ShadowRegistry,
    source: &'a dyn RecordSource,
    sink: &'a dyn ShadowSink,
}

impl<'a> Shadower<'a> {
    pub fn new(
        registry: &'a ShadowRegistry,
        source: &'a dyn RecordSource,
        sink: &'a dyn ShadowSink,
    ) -> Self {
        Self {
            registry,
            source,
            sink,
        }
    }

    /// Capture the change set before the host persists `record`
    pub fn before_save<T: Tracked>(&self, record: &mut T) -> ShadowResult<()> {
        let Some(config) = self.registry.config(record.entity_type()) else {
            return Ok(());
        };
        let changes = detect_changes(config, &*record, self.source)?;
        record.shadow_state_mut().record_changes(changes);
        Ok(())
    }

    /// Write the attribute shadow once the host has persisted `record`
    pub fn after_save<T: Tracked>(&self, record: &T) -> ShadowResult<Option<AttributeShadow>> {
        let Some(config) = self.registry.config(record.entity_type()) else {
            return Ok(None);
        };
        let Some(changes) = record.shadow_state().updated_attributes() else {
            debug!(
                entity_type = record.entity_type(),
                "after_save without before_save; nothing to shadow"
            );
            return Ok(None);
        };
        store_attribute_shadow(config, record, changes, self.sink)
    }

    /// Record that `related` was added to `owner`'s association
    pub fn after_add<T: Tracked>(
        &self,
        owner: &mut T,
        association: &str,
        related: &dyn Record,
    ) -> ShadowResult<Option<AssociationShadow>> {
        self.mutated(owner, association, ShadowAction::Added, related)
    }

    /// Record that `related` was removed from `owner`'s association
    pub fn after_remove<T: Tracked>(
        &self,
        owner: &mut T,
        association: &str,
        related: &dyn Record,
    ) -> ShadowResult<Option<AssociationShadow>> {
        self.mutated(owner, association, ShadowAction::Removed, related)
    }

    fn mutated<T: Tracked>(
        &self,
        owner: &mut T,
        association: &str,
        action: ShadowAction,
        related: &dyn Record,
    ) -> ShadowResult<Option<AssociationShadow>> {
        let Some(config) = self.registry.config(owner.entity_type()) else {
            return Ok(None);
        };
        let Some(tracked) = config.tracked_association(association) else {
            return Ok(None);
        };
        store_association_shadow(config, owner, tracked, action, related, self.sink)
    }
}
