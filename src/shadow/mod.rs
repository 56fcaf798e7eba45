//! Attribute and association shadowing
//!
//! A shadowed entity type gets two append-only tables: one row per save that
//! changed tracked attributes, and one row per add/remove on a tracked
//! association. Every row carries the ids of the configured attachments.
//!
//! Registration happens once through [`RegistryBuilder`]; the host then
//! drives a [`Shadower`] around its saves and association mutations.

pub mod association_writer;
pub mod attribute_writer;
pub mod backend;
pub mod binder;
pub mod config;
pub mod detector;
pub mod hooks;
pub mod options;
pub mod registry;
pub mod resolver;
pub mod rows;
pub mod state;
pub mod table;

pub use backend::{RecordSource, ShadowSink};
pub use binder::{AccessorKind, AttachmentBinding};
pub use config::{Attachment, ShadowConfig, TrackedAssociation};
pub use detector::{AttributeChange, ChangeSet};
pub use hooks::Shadower;
pub use options::{Selection, ShadowOptions};
pub use registry::{RegistryBuilder, ShadowRegistry};
pub use resolver::{ResolvedAssociationShadow, ResolvedAttributeShadow};
pub use rows::{AssociationShadow, AttributeShadow, ShadowAction};
pub use state::ShadowState;
pub use table::{ShadowKind, TableLayout, TableNaming};
