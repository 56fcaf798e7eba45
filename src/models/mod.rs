//! Core data models for shadow-trail
//!
//! Host-facing record abstractions, the dynamic entity used by the bundled
//! store, schema introspection data, ids and field values.

pub mod entity;
pub mod ids;
pub mod record;
pub mod schema;
pub mod value;

pub use entity::Entity;
pub use ids::{RecordId, ShadowId};
pub use record::{AttachmentRef, AttachmentSlots, Record, Tracked, Versionable};
pub use schema::{AssociationSchema, EntitySchema, SchemaCatalog};
pub use value::FieldMap;
