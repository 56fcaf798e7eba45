//! Declarative shadow options
//!
//! `ShadowOptions` is what a host declares per entity type. It deserializes
//! from the settings file, so `attach` accepts either a single name or a list.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Which fields or associations a type tracks
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selection {
    /// Everything the schema declares, minus skips (default)
    #[default]
    All,
    /// Nothing
    None,
    /// An explicit list, minus skips
    Only(Vec<String>),
}

/// Options accepted by a shadow declaration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShadowOptions {
    #[serde(default)]
    pub attributes: Selection,

    #[serde(default)]
    pub associations: Selection,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skip_attributes: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skip_associations: Vec<String>,

    /// Attachment names required on every shadow row
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub attach: Vec<String>,

    /// Entity type per attachment, when it differs from the classified name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attachment_types: BTreeMap<String, String>,
}

impl ShadowOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track only the given attributes
    pub fn attributes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = Selection::Only(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn no_attributes(mut self) -> Self {
        self.attributes = Selection::None;
        self
    }

    /// Track only the given associations
    pub fn associations<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.associations = Selection::Only(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn no_associations(mut self) -> Self {
        self.associations = Selection::None;
        self
    }

    pub fn skip_attribute(mut self, name: impl Into<String>) -> Self {
        self.skip_attributes.push(name.into());
        self
    }

    pub fn skip_association(mut self, name: impl Into<String>) -> Self {
        self.skip_associations.push(name.into());
        self
    }

    /// Require an attachment whose type is the classified name
    pub fn attach(mut self, name: impl Into<String>) -> Self {
        self.attach.push(name.into());
        self
    }

    /// Require an attachment of an explicit entity type
    pub fn attach_as(mut self, name: impl Into<String>, entity_type: impl Into<String>) -> Self {
        let name = name.into();
        self.attachment_types.insert(name.clone(), entity_type.into());
        self.attach.push(name);
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(name) => vec![name],
        OneOrMany::Many(names) => names,
    })
}
