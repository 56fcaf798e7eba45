//! CLI command handlers
//!
//! Bridges clap argument parsing with the session and storage layers.

pub mod log;
pub mod record;
pub mod tables;

pub use log::{handle_log_command, LogCommands};
pub use record::{handle_record_command, RecordCommands};
pub use tables::{handle_tables_command, TablesCommands};

use serde_json::Value;

use crate::error::{ShadowError, ShadowResult};
use crate::models::value::parse_literal;
use crate::models::AttachmentRef;

/// Parse `field=value`; the value is read as JSON when it parses, else as a string
pub fn parse_assignment(raw: &str) -> ShadowResult<(String, Value)> {
    let (field, value) = raw.split_once('=').ok_or_else(|| {
        ShadowError::Validation(format!("Expected field=value, got '{}'", raw))
    })?;
    let field = field.trim();
    if field.is_empty() {
        return Err(ShadowError::Validation(format!("Missing field name in '{}'", raw)));
    }
    Ok((field.to_string(), parse_literal(value)))
}

/// Parse `name=Type#id` (e.g. `editor=User#7`)
pub fn parse_attachment(raw: &str) -> ShadowResult<(String, AttachmentRef)> {
    let invalid = || {
        ShadowError::Validation(format!(
            "Invalid attachment '{}'. Use name=Type#id, e.g. editor=User#7",
            raw
        ))
    };
    let (name, reference) = raw.split_once('=').ok_or_else(invalid)?;
    let attachment = AttachmentRef::parse(reference).ok_or_else(invalid)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(invalid());
    }
    Ok((name.to_string(), attachment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordId;
    use serde_json::json;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(parse_assignment("amount=150").unwrap(), ("amount".into(), json!(150)));
        assert_eq!(parse_assignment("status=paid").unwrap(), ("status".into(), json!("paid")));
        assert_eq!(parse_assignment("notes=").unwrap(), ("notes".into(), json!("")));
        assert!(parse_assignment("amount").is_err());
        assert!(parse_assignment("=1").is_err());
    }

    #[test]
    fn test_parse_attachment() {
        let (name, attachment) = parse_attachment("editor=User#7").unwrap();
        assert_eq!(name, "editor");
        assert_eq!(attachment.entity_type, "User");
        assert_eq!(attachment.id, Some(RecordId::new(7)));

        assert!(parse_attachment("editor=User").is_err());
        assert!(parse_attachment("User#7").is_err());
    }
}
