//! Shadow row data structures
//!
//! Rows serialize to flat JSON objects matching the shadow table layout: the
//! owner key and one key per attachment sit beside the fixed columns.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{RecordId, ShadowId};

/// Foreign keys carried by a shadow row (owner key plus attachment keys)
pub type ForeignKeys = BTreeMap<String, RecordId>;

/// Kind of association mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShadowAction {
    /// A related record was added
    Added,
    /// A related record was removed
    Removed,
}

impl fmt::Display for ShadowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShadowAction::Added => write!(f, "added"),
            ShadowAction::Removed => write!(f, "removed"),
        }
    }
}

/// Attribute shadow built by the writer, not yet persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAttributeShadow {
    pub updated_attributes: Vec<String>,
    pub version: Option<i64>,
    pub keys: ForeignKeys,
}

/// Association shadow built by the writer, not yet persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAssociationShadow {
    pub association: String,
    pub action: ShadowAction,
    pub record_id: RecordId,
    pub record_version: Option<i64>,
    pub keys: ForeignKeys,
}

/// A persisted attribute shadow row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeShadow {
    pub id: ShadowId,

    /// Changed attribute names, in tracked order
    #[serde(default)]
    pub updated_attributes: Vec<String>,

    /// Version of the owner at write time, for versioned types
    #[serde(default)]
    pub version: Option<i64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(flatten)]
    pub keys: ForeignKeys,
}

impl AttributeShadow {
    /// Materialize a pending row
    pub fn from_pending(id: ShadowId, pending: PendingAttributeShadow, at: DateTime<Utc>) -> Self {
        Self {
            id,
            updated_attributes: pending.updated_attributes,
            version: pending.version,
            created_at: at,
            updated_at: at,
            keys: pending.keys,
        }
    }

    /// Value of a foreign key column
    pub fn key(&self, column: &str) -> Option<RecordId> {
        self.keys.get(column).copied()
    }
}

/// A persisted association shadow row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationShadow {
    pub id: ShadowId,
    pub association: String,
    pub action: ShadowAction,
    pub record_id: RecordId,

    /// Version of the related record at write time, for versioned types
    #[serde(default)]
    pub record_version: Option<i64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(flatten)]
    pub keys: ForeignKeys,
}

impl AssociationShadow {
    /// Materialize a pending row
    pub fn from_pending(
        id: ShadowId,
        pending: PendingAssociationShadow,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            association: pending.association,
            action: pending.action,
            record_id: pending.record_id,
            record_version: pending.record_version,
            created_at: at,
            updated_at: at,
            keys: pending.keys,
        }
    }

    /// Value of a foreign key column
    pub fn key(&self, column: &str) -> Option<RecordId> {
        self.keys.get(column).copied()
    }
}
