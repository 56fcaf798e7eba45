//! Schema introspection data supplied by the host
//!
//! Each entity type declares its persisted columns, its named associations
//! (and their target types) and any attachment accessors it already defines.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ShadowError, ShadowResult};

/// A declared association of an entity type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationSchema {
    /// Association name (e.g., "line_items")
    pub name: String,

    /// Explicit target type; defaults to the classified association name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
}

impl AssociationSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class_name: None,
        }
    }

    pub fn with_class_name(name: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class_name: Some(class_name.into()),
        }
    }

    /// The related entity type
    pub fn target(&self) -> String {
        self.class_name
            .clone()
            .unwrap_or_else(|| classify(&self.name))
    }
}

/// Introspectable shape of one entity type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    /// Type name (e.g., "Invoice")
    pub name: String,

    /// Persisted column names, in table order
    #[serde(default)]
    pub columns: Vec<String>,

    /// Declared associations
    #[serde(default)]
    pub associations: Vec<AssociationSchema>,

    /// Names the type already exposes a reader/writer pair for
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accessors: Vec<String>,

    /// Whether the type keeps a version history
    #[serde(default)]
    pub versioned: bool,
}

impl EntitySchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            associations: Vec::new(),
            accessors: Vec::new(),
            versioned: false,
        }
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn has_many(mut self, name: impl Into<String>) -> Self {
        self.associations.push(AssociationSchema::new(name));
        self
    }

    pub fn has_many_of(mut self, name: impl Into<String>, class_name: impl Into<String>) -> Self {
        self.associations
            .push(AssociationSchema::with_class_name(name, class_name));
        self
    }

    pub fn accessor(mut self, name: impl Into<String>) -> Self {
        self.accessors.push(name.into());
        self
    }

    pub fn versioned(mut self) -> Self {
        self.versioned = true;
        self
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn has_accessor(&self, name: &str) -> bool {
        self.accessors.iter().any(|a| a == name)
    }

    pub fn association(&self, name: &str) -> Option<&AssociationSchema> {
        self.associations.iter().find(|a| a.name == name)
    }
}

/// All entity schemas known to the host, keyed by type name
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    schemas: BTreeMap<String, EntitySchema>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a schema
    pub fn insert(&mut self, schema: EntitySchema) {
        self.schemas.insert(schema.name.clone(), schema);
    }

    pub fn with(mut self, schema: EntitySchema) -> Self {
        self.insert(schema);
        self
    }

    pub fn get(&self, name: &str) -> Option<&EntitySchema> {
        self.schemas.get(name)
    }

    /// Look up a schema, failing with a configuration error if it is unknown
    pub fn require(&self, name: &str) -> ShadowResult<&EntitySchema> {
        self.get(name)
            .ok_or_else(|| ShadowError::Config(format!("unknown entity type '{}'", name)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntitySchema> {
        self.schemas.values()
    }
}

impl FromIterator<EntitySchema> for SchemaCatalog {
    fn from_iter<T: IntoIterator<Item = EntitySchema>>(iter: T) -> Self {
        let mut catalog = Self::new();
        for schema in iter {
            catalog.insert(schema);
        }
        catalog
    }
}

/// Convert a CamelCase type name to snake_case (`LineItem` -> `line_item`)
pub fn underscore(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch.is_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
            prev_lower = false;
        } else {
            out.push(ch);
            prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        }
    }
    out
}

/// Foreign key column for a type (`Invoice` -> `invoice_id`)
pub fn foreign_key(type_name: &str) -> String {
    format!("{}_id", underscore(type_name))
}

/// Convert a (possibly plural) snake_case name to a type name (`line_items` -> `LineItem`)
pub fn classify(name: &str) -> String {
    singularize(name)
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

fn singularize(name: &str) -> String {
    if let Some(stem) = name.strip_suffix("ies") {
        format!("{}y", stem)
    } else if name.ends_with("sses") || name.ends_with("xes") || name.ends_with("ches") {
        name[..name.len() - 2].to_string()
    } else if name.ends_with("ss") {
        name.to_string()
    } else if let Some(stem) = name.strip_suffix('s') {
        stem.to_string()
    } else {
        name.to_string()
    }
}
