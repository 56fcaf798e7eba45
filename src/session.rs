//! Unit-of-work driver for the bundled store
//!
//! `Session` plays the host ORM: it persists entities and links, and calls
//! the shadow hooks around every save and association mutation in the order
//! they expect.

use tracing::debug;

use crate::config::{Settings, ShadowPaths};
use crate::error::{ShadowError, ShadowResult};
use crate::models::{Entity, RecordId};
use crate::shadow::{
    AssociationShadow, AttributeShadow, ResolvedAssociationShadow, ResolvedAttributeShadow,
    ShadowRegistry, Shadower,
};
use crate::storage::Storage;

/// Registry plus storage, driving saves and association mutations
pub struct Session {
    registry: ShadowRegistry,
    storage: Storage,
}

impl Session {
    pub fn new(registry: ShadowRegistry, storage: Storage) -> Self {
        Self { registry, storage }
    }

    /// Open the store at `paths` using the settings saved there
    pub fn open(paths: ShadowPaths) -> ShadowResult<Self> {
        let settings = Settings::load_or_create(&paths)?;
        let registry = settings.registry()?;
        let storage = Storage::new(paths)?;
        storage.load_all()?;
        Ok(Self::new(registry, storage))
    }

    pub fn registry(&self) -> &ShadowRegistry {
        &self.registry
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    fn shadower(&self) -> Shadower<'_> {
        Shadower::new(&self.registry, &self.storage, &self.storage)
    }

    /// A new, unsaved entity with its attachment slots open
    pub fn new_entity(&self, entity_type: &str) -> ShadowResult<Entity> {
        self.registry.catalog().require(entity_type)?;
        let mut entity = Entity::new(entity_type);
        self.registry.prepare(&mut entity);
        Ok(entity)
    }

    /// Load a persisted entity with its attachment slots open
    pub fn find(&self, entity_type: &str, id: RecordId) -> ShadowResult<Entity> {
        let mut entity = self
            .storage
            .records
            .get(entity_type, id)?
            .ok_or_else(|| ShadowError::not_found(entity_type, id.to_string()))?;
        self.registry.prepare(&mut entity);
        Ok(entity)
    }

    /// Persist an entity, shadowing its tracked attribute changes
    ///
    /// Versioned types start at version 1 and move up by one on every save.
    pub fn save(&self, entity: &mut Entity) -> ShadowResult<Option<AttributeShadow>> {
        let schema = self.registry.catalog().require(&entity.entity_type)?;
        for field in entity.fields.keys() {
            if field == "id" || field == "version" || !schema.has_column(field) {
                return Err(ShadowError::Validation(format!(
                    "{} has no writable column '{}'",
                    entity.entity_type, field
                )));
            }
        }
        let versioned = schema.versioned;

        let shadower = self.shadower();
        shadower.before_save(entity)?;

        if versioned {
            entity.version = Some(entity.version.map_or(1, |v| v + 1));
        }
        match entity.id {
            None => {
                self.storage.records.insert(entity)?;
            }
            Some(_) => self.storage.records.update(entity)?,
        }
        self.storage.save_all()?;

        debug!(
            entity_type = %entity.entity_type,
            id = ?entity.id,
            version = ?entity.version,
            "saved entity"
        );

        shadower.after_save(&*entity)
    }

    /// Add `related` to `owner`'s association
    pub fn add(
        &self,
        owner: &mut Entity,
        association: &str,
        related: &Entity,
    ) -> ShadowResult<Option<AssociationShadow>> {
        self.check_association(owner, association, related)?;
        if let Some(id) = related.id {
            if owner.link(association, id) {
                self.persist_links(owner)?;
            }
        }
        self.shadower().after_add(owner, association, related)
    }

    /// Remove `related` from `owner`'s association
    pub fn remove(
        &self,
        owner: &mut Entity,
        association: &str,
        related: &Entity,
    ) -> ShadowResult<Option<AssociationShadow>> {
        self.check_association(owner, association, related)?;
        if let Some(id) = related.id {
            if owner.unlink(association, id) {
                self.persist_links(owner)?;
            }
        }
        self.shadower().after_remove(owner, association, related)
    }

    /// Attribute shadows written for `owner`, oldest first
    pub fn attribute_updates(&self, owner: &Entity) -> ShadowResult<Vec<ResolvedAttributeShadow>> {
        let config = self.registry.require(&owner.entity_type)?;
        let id = persisted_id(owner)?;
        Ok(self
            .storage
            .attribute_shadows_for(config, id)?
            .into_iter()
            .map(|row| ResolvedAttributeShadow::new(row, config))
            .collect())
    }

    /// Association shadows written for `owner`, oldest first
    pub fn association_updates(
        &self,
        owner: &Entity,
    ) -> ShadowResult<Vec<ResolvedAssociationShadow>> {
        let config = self.registry.require(&owner.entity_type)?;
        let id = persisted_id(owner)?;
        Ok(self
            .storage
            .association_shadows_for(config, id)?
            .into_iter()
            .map(|row| ResolvedAssociationShadow::new(row, config))
            .collect())
    }

    fn check_association(
        &self,
        owner: &Entity,
        association: &str,
        related: &Entity,
    ) -> ShadowResult<()> {
        let schema = self.registry.catalog().require(&owner.entity_type)?;
        let declared = schema.association(association).ok_or_else(|| {
            ShadowError::Validation(format!(
                "{} has no association '{}'",
                owner.entity_type, association
            ))
        })?;
        let target = declared.target();
        if related.entity_type != target {
            return Err(ShadowError::Validation(format!(
                "{}.{} holds {} records, not {}",
                owner.entity_type, association, target, related.entity_type
            )));
        }
        Ok(())
    }

    /// Persist only the links, leaving unsaved field edits in memory
    fn persist_links(&self, owner: &Entity) -> ShadowResult<()> {
        let Some(id) = owner.id else {
            return Ok(());
        };
        self.storage
            .records
            .update_links(&owner.entity_type, id, &owner.links)?;
        self.storage.save_all()
    }
}

fn persisted_id(owner: &Entity) -> ShadowResult<RecordId> {
    owner
        .id
        .ok_or_else(|| ShadowError::Validation(format!("{} is not saved", owner.entity_type)))
}
