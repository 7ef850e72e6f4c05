//! Family circle: relatives and close people of the departed.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::collections::{
    confirm_tokens_in, pending_tokens_of, record_position, require_field, string_or_empty,
    SyncCollection, SyncRecord,
};
use crate::core::{RecordId, Result, SyncError};
use crate::document::MemorialDocument;
use crate::editor::CollectionEditor;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyMember {
    pub id: RecordId,

    #[serde(default, deserialize_with = "string_or_empty")]
    pub name: String,

    /// Free-form relation label, e.g. "daughter" or "lifelong friend".
    #[serde(default, deserialize_with = "string_or_empty")]
    pub relation: String,

    #[serde(default)]
    pub birth_year: Option<i32>,

    #[serde(default)]
    pub death_year: Option<i32>,

    #[serde(default, deserialize_with = "string_or_empty")]
    pub note: String,
}

impl FamilyMember {
    pub fn new(name: impl Into<String>, relation: impl Into<String>) -> Self {
        Self {
            id: RecordId::fresh(),
            name: name.into(),
            relation: relation.into(),
            birth_year: None,
            death_year: None,
            note: String::new(),
        }
    }

    pub fn years(mut self, birth: Option<i32>, death: Option<i32>) -> Self {
        self.birth_year = birth;
        self.death_year = death;
        self
    }
}

impl SyncRecord for FamilyMember {
    fn id(&self) -> &RecordId {
        &self.id
    }

    fn id_mut(&mut self) -> &mut RecordId {
        &mut self.id
    }

    fn validate(&self) -> Result<()> {
        require_field("Member name", &self.name)?;
        if let (Some(birth), Some(death)) = (self.birth_year, self.death_year) {
            if death < birth {
                return Err(SyncError::Validation(format!(
                    "Death year {death} precedes birth year {birth} for '{}'",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// Derived family statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyStats {
    pub members: usize,
    /// Distinct relation labels in use.
    pub relations: usize,
    /// Members carrying at least one year.
    pub dated: usize,
}

/// Family plugin for the sync engine.
pub struct FamilySync;

impl SyncCollection for FamilySync {
    type State = Vec<FamilyMember>;
    type Stats = FamilyStats;

    const SLUG: &'static str = "family";

    fn extract(document: &MemorialDocument) -> Self::State {
        document.family.clone()
    }

    fn store(document: &mut MemorialDocument, state: &Self::State) {
        document.family = state.clone();
    }

    fn stats(state: &Self::State) -> Self::Stats {
        let relations: BTreeSet<&str> = state
            .iter()
            .map(|member| member.relation.trim())
            .filter(|relation| !relation.is_empty())
            .collect();
        FamilyStats {
            members: state.len(),
            relations: relations.len(),
            dated: state
                .iter()
                .filter(|member| member.birth_year.is_some() || member.death_year.is_some())
                .count(),
        }
    }

    fn pending_tokens(state: &Self::State) -> Vec<String> {
        pending_tokens_of(state)
    }

    fn confirm_tokens(state: &mut Self::State, tokens: &[String]) {
        confirm_tokens_in(state, tokens);
    }
}

/// Editor for the family circle.
pub type FamilyEditor = CollectionEditor<FamilySync>;

impl CollectionEditor<FamilySync> {
    pub async fn add_member(&self, member: FamilyMember) -> Result<RecordId> {
        member.validate()?;
        let id = member.id.clone();
        self.mutate(move |members| {
            members.push(member);
            Ok(())
        })
        .await?;
        Ok(id)
    }

    pub async fn update_member(
        &self,
        id: &RecordId,
        apply: impl FnOnce(&mut FamilyMember) + Send,
    ) -> Result<()> {
        let id = id.clone();
        self.mutate(move |members| {
            let position = record_position(members, &id).ok_or_else(|| {
                SyncError::Validation(format!("Unknown family member '{id}'"))
            })?;
            apply(&mut members[position]);
            members[position].validate()
        })
        .await
    }

    pub async fn remove_member(&self, id: &RecordId) -> Result<()> {
        let id = id.clone();
        self.mutate(move |members| {
            let position = record_position(members, &id).ok_or_else(|| {
                SyncError::Validation(format!("Unknown family member '{id}'"))
            })?;
            members.remove(position);
            Ok(())
        })
        .await
    }
}
