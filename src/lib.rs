//! shadow-trail - attribute and association shadowing for persisted records
//!
//! When enabled on an entity type, every save that changes tracked fields
//! writes one attribute shadow row, and every add/remove on a tracked
//! association writes one association shadow row. Each row carries the ids
//! of the type's configured attachments (e.g. the editor responsible).
//!
//! # Architecture
//!
//! - `shadow`: configuration resolver, attachment binder, change detector,
//!   shadow writers, record resolvers and the lifecycle hooks
//! - `models`: host record traits, the dynamic entity, schemas, ids, values
//! - `storage`: JSON record store and JSONL shadow tables
//! - `session`: drives the hooks around saves and association mutations
//! - `config`: path resolution and persisted settings
//! - `cli`, `display`: the `shadow` command line
//! - `error`: custom error types
//!
//! # Example
//!
//! ```rust,ignore
//! use shadow_trail::config::{ShadowPaths, Settings};
//! use shadow_trail::session::Session;
//!
//! let paths = ShadowPaths::new()?;
//! Settings::sample().save(&paths)?;
//! let session = Session::open(paths)?;
//! ```

pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod models;
pub mod session;
pub mod shadow;
pub mod storage;

pub use error::{ShadowError, ShadowResult};
