//! Change detection
//!
//! Reloads the durable projection of a record's tracked attributes and diffs
//! it against the in-memory values, comparing by stable text form.

use serde_json::Value;
use tracing::debug;

use super::backend::RecordSource;
use super::config::ShadowConfig;
use crate::error::{ShadowError, ShadowResult};
use crate::models::value::{format_value, same_text, FieldMap};
use crate::models::Record;

/// One tracked attribute whose value differs from the persisted state
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeChange {
    pub name: String,
    pub before: Value,
    pub after: Value,
}

/// Changed tracked attributes for one save cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    new_record: bool,
    changes: Vec<AttributeChange>,
}

impl ChangeSet {
    pub fn new(new_record: bool, changes: Vec<AttributeChange>) -> Self {
        Self {
            new_record,
            changes,
        }
    }

    /// Whether the record had no durable row when the change set was taken
    pub fn is_new_record(&self) -> bool {
        self.new_record
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn changes(&self) -> &[AttributeChange] {
        &self.changes
    }

    /// Changed attribute names, in tracked-attribute order
    pub fn changed_attributes(&self) -> Vec<String> {
        self.changes.iter().map(|c| c.name.clone()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.changes.iter().any(|c| c.name == name)
    }

    /// Human-readable summary (`amount: 100 -> 150, status: "open" -> "paid"`)
    pub fn summary(&self) -> Option<String> {
        if self.changes.is_empty() {
            return None;
        }

        let parts: Vec<String> = self
            .changes
            .iter()
            .map(|c| {
                if self.new_record {
                    format!("{}: (added) -> {}", c.name, format_value(&c.after))
                } else {
                    format!(
                        "{}: {} -> {}",
                        c.name,
                        format_value(&c.before),
                        format_value(&c.after)
                    )
                }
            })
            .collect();

        Some(parts.join(", "))
    }
}

/// Diff a record's tracked attributes against its persisted projection
///
/// New records diff against an empty projection. Existing records are
/// reloaded through `source`, bypassing any in-memory state.
///
/// # Errors
///
/// Returns `NotFound` if the record has an id but no durable row, or any
/// error raised by the source.
pub fn detect_changes(
    config: &ShadowConfig,
    record: &dyn Record,
    source: &dyn RecordSource,
) -> ShadowResult<ChangeSet> {
    let (new_record, before) = match record.id() {
        None => (true, FieldMap::new()),
        Some(_) if config.tracked_attributes.is_empty() => (false, FieldMap::new()),
        Some(id) => {
            let projection = source
                .find_projection(record.entity_type(), id, &config.tracked_attributes)?
                .ok_or_else(|| ShadowError::not_found(record.entity_type(), id.to_string()))?;
            (false, projection)
        }
    };

    let changes = diff_projection(&config.tracked_attributes, &before, record);
    let change_set = ChangeSet::new(new_record, changes);

    debug!(
        entity_type = record.entity_type(),
        new_record,
        changed = ?change_set.changed_attributes(),
        "detected attribute changes"
    );

    Ok(change_set)
}

/// Compare tracked attributes between a prior projection and current values
pub fn diff_projection(
    tracked: &[String],
    before: &FieldMap,
    record: &dyn Record,
) -> Vec<AttributeChange> {
    tracked
        .iter()
        .filter_map(|name| {
            let prior = before.get(name);
            let current = record.get(name);
            if same_text(prior, current.as_ref()) {
                None
            } else {
                Some(AttributeChange {
                    name: name.clone(),
                    before: prior.cloned().unwrap_or(Value::Null),
                    after: current.unwrap_or(Value::Null),
                })
            }
        })
        .collect()
}
