//! Memory wall: short messages left by visitors, curated by the owner.

use std::collections::BTreeSet;

use chrono::NaiveDate;
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
pub struct MemoryPost {
    pub id: RecordId,

    #[serde(default, deserialize_with = "string_or_empty")]
    pub author: String,

    #[serde(default, deserialize_with = "string_or_empty")]
    pub message: String,

    #[serde(default)]
    pub posted_on: Option<NaiveDate>,
}

impl MemoryPost {
    pub fn new(author: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: RecordId::fresh(),
            author: author.into(),
            message: message.into(),
            posted_on: None,
        }
    }

    pub fn posted_on(mut self, date: NaiveDate) -> Self {
        self.posted_on = Some(date);
        self
    }
}

impl SyncRecord for MemoryPost {
    fn id(&self) -> &RecordId {
        &self.id
    }

    fn id_mut(&mut self) -> &mut RecordId {
        &mut self.id
    }

    fn validate(&self) -> Result<()> {
        require_field("Post author", &self.author)?;
        require_field("Post message", &self.message)
    }
}

/// Derived memory wall statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WallStats {
    pub posts: usize,
    /// Distinct author names.
    pub contributors: usize,
}

/// Memory wall plugin for the sync engine.
pub struct WallSync;

impl SyncCollection for WallSync {
    type State = Vec<MemoryPost>;
    type Stats = WallStats;

    const SLUG: &'static str = "memory-wall";

    fn extract(document: &MemorialDocument) -> Self::State {
        document.memory_wall.clone()
    }

    fn store(document: &mut MemorialDocument, state: &Self::State) {
        document.memory_wall = state.clone();
    }

    fn stats(state: &Self::State) -> Self::Stats {
        let contributors: BTreeSet<&str> = state
            .iter()
            .map(|post| post.author.trim())
            .filter(|author| !author.is_empty())
            .collect();
        WallStats {
            posts: state.len(),
            contributors: contributors.len(),
        }
    }

    fn pending_tokens(state: &Self::State) -> Vec<String> {
        pending_tokens_of(state)
    }

    fn confirm_tokens(state: &mut Self::State, tokens: &[String]) {
        confirm_tokens_in(state, tokens);
    }
}

/// Editor for the memory wall.
pub type WallEditor = CollectionEditor<WallSync>;

impl CollectionEditor<WallSync> {
    pub async fn add_post(&self, post: MemoryPost) -> Result<RecordId> {
        post.validate()?;
        let id = post.id.clone();
        self.mutate(move |posts| {
            posts.push(post);
            Ok(())
        })
        .await?;
        Ok(id)
    }

    /// Removes a post, the moderation action of the page owner.
    pub async fn remove_post(&self, id: &RecordId) -> Result<()> {
        let id = id.clone();
        self.mutate(move |posts| {
            let position = record_position(posts, &id)
                .ok_or_else(|| SyncError::Validation(format!("Unknown post '{id}'")))?;
            posts.remove(position);
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_requires_author_and_message() {
        assert!(MemoryPost::new("Nieves", "We miss you").validate().is_ok());
        assert!(MemoryPost::new("", "We miss you").validate().is_err());
        assert!(MemoryPost::new("Nieves", "  ").validate().is_err());
    }

    #[test]
    fn stats_count_distinct_contributors() {
        let posts = vec![
            MemoryPost::new("Nieves", "We miss you"),
            MemoryPost::new("Nieves", "Thinking of the family"),
            MemoryPost::new("Tom", "A wonderful neighbour"),
        ];
        let stats = WallSync::stats(&posts);
        assert_eq!(stats.posts, 3);
        assert_eq!(stats.contributors, 2);
    }
}
