//! Configuration module for shadow-trail
//!
//! Path resolution for the bundled store and the persisted settings that
//! declare entity schemas and which types are shadowed.

pub mod paths;
pub mod settings;

pub use paths::ShadowPaths;
pub use settings::Settings;
