//! Profile: the core identity fields of the memorial page.
//!
//! Unlike the list collections, the profile fields live at the top level
//! of the document, so persistence replaces the whole document rather
//! than one collection path.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::client::PersistenceClient;
use crate::collections::{require_field, string_or_empty, SyncCollection};
use crate::core::{Result, SyncError};
use crate::document::MemorialDocument;
use crate::editor::CollectionEditor;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFields {
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
}

impl ProfileFields {
    pub fn validate(&self) -> Result<()> {
        require_field("Name", &self.name)?;
        if let (Some(born), Some(died)) = (self.born, self.died) {
            if died < born {
                return Err(SyncError::Validation(format!(
                    "Date of death {died} precedes date of birth {born}"
                )));
            }
        }
        Ok(())
    }

    fn filled_fields(&self) -> usize {
        [&self.name, &self.location, &self.biography]
            .iter()
            .filter(|s| !s.trim().is_empty())
            .count()
            + usize::from(self.born.is_some())
            + usize::from(self.died.is_some())
    }
}

/// Derived completion statistics for the profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileStats {
    pub filled_fields: usize,
    pub total_fields: usize,
}

impl ProfileStats {
    pub fn completion(&self) -> f32 {
        if self.total_fields == 0 {
            return 0.0;
        }
        self.filled_fields as f32 / self.total_fields as f32
    }
}

/// Profile plugin for the sync engine.
pub struct ProfileSync;

#[async_trait]
impl SyncCollection for ProfileSync {
    type State = ProfileFields;
    type Stats = ProfileStats;

    const SLUG: &'static str = "profile";
    const PERSISTS_DOCUMENT: bool = true;

    fn extract(document: &MemorialDocument) -> Self::State {
        ProfileFields {
            name: document.name.clone(),
            born: document.born,
            died: document.died,
            location: document.location.clone(),
            biography: document.biography.clone(),
        }
    }

    fn store(document: &mut MemorialDocument, state: &Self::State) {
        document.name = state.name.clone();
        document.born = state.born;
        document.died = state.died;
        document.location = state.location.clone();
        document.biography = state.biography.clone();
    }

    fn stats(state: &Self::State) -> Self::Stats {
        ProfileStats {
            filled_fields: state.filled_fields(),
            total_fields: 5,
        }
    }

    /// The engine hands over the retained document with this state already
    /// stored into it, so the replace carries the edited fields.
    async fn persist(
        client: &dyn PersistenceClient,
        document: &MemorialDocument,
        _state: &Self::State,
    ) -> Result<()> {
        client.replace_document(document).await
    }
}

/// Editor for the profile fields.
pub type ProfileEditor = CollectionEditor<ProfileSync>;

impl CollectionEditor<ProfileSync> {
    /// Edits the profile fields. The edited form is re-validated; a
    /// failing edit leaves the working copy untouched.
    pub async fn edit_profile(&self, apply: impl FnOnce(&mut ProfileFields) + Send) -> Result<()> {
        self.mutate(move |profile| {
            apply(profile);
            profile.validate()
        })
        .await
    }
}
