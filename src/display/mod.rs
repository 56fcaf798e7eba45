//! Display formatting for CLI output
//!
//! Plain-text tables for shadow rows and table layouts.

pub mod shadows;

pub use shadows::{
    format_association_shadows, format_attribute_shadows, format_shadow_config,
    format_table_layout,
};
