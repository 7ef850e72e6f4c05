//! Wire model of a memorial document as the backend stores it.
//!
//! Parsing is deliberately forgiving: optional strings may arrive as
//! `null` or be missing entirely and land here as `""`, collections may be
//! absent and land as empty lists, and unknown fields are ignored. The
//! canonical in-memory shape is what change detection compares against,
//! so a lenient parse never manufactures a phantom diff.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::collections::{
    FamilyMember, Favorite, MemoryPost, ServiceInfo, TimelineEvent, string_or_empty,
};

/// Identity of a memorial document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A whole memorial page: profile scalars plus the editable collections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemorialDocument {
    pub id: DocumentId,

    #[serde(default, deserialize_with = "string_or_empty")]
    pub name: String,

    #[serde(default)]
    pub born: Option<NaiveDate>,

    #[serde(default)]
    pub died: Option<NaiveDate>,

    #[serde(default, deserialize_with = "string_or_empty")]
    pub location: String,

    #[serde(default, deserialize_with = "string_or_empty")]
    pub biography: String,

    #[serde(default)]
    pub timeline: Vec<TimelineEvent>,

    #[serde(default)]
    pub family: Vec<FamilyMember>,

    #[serde(default)]
    pub favorites: Vec<Favorite>,

    #[serde(default)]
    pub memory_wall: Vec<MemoryPost>,

    #[serde(default)]
    pub service: ServiceInfo,
}

impl MemorialDocument {
    pub fn new(id: DocumentId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Self::default()
        }
    }
}
