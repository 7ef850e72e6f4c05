//! Life timeline: dated milestones shown as a chronology.

use serde::{Deserialize, Serialize};

use crate::collections::{
    confirm_tokens_in, move_record, pending_tokens_of, record_position, require_field,
    string_or_empty, SyncCollection, SyncRecord,
};
use crate::core::{RecordId, Result, SyncError};
use crate::document::MemorialDocument;
use crate::editor::CollectionEditor;

/// A single milestone on the life timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEvent {
    pub id: RecordId,

    #[serde(default, deserialize_with = "string_or_empty")]
    pub title: String,

    #[serde(default)]
    pub year: Option<i32>,

    #[serde(default, deserialize_with = "string_or_empty")]
    pub detail: String,
}

impl TimelineEvent {
    pub fn new(title: impl Into<String>, year: Option<i32>, detail: impl Into<String>) -> Self {
        Self {
            id: RecordId::fresh(),
            title: title.into(),
            year,
            detail: detail.into(),
        }
    }
}

impl SyncRecord for TimelineEvent {
    fn id(&self) -> &RecordId {
        &self.id
    }

    fn id_mut(&mut self) -> &mut RecordId {
        &mut self.id
    }

    fn validate(&self) -> Result<()> {
        require_field("Event title", &self.title)
    }
}

/// Chronological view of the events: dated ones by year, undated ones
/// after them, both keeping their stored order among themselves. The
/// stored list itself stays insertion-ordered.
pub fn display_order(events: &[TimelineEvent]) -> Vec<&TimelineEvent> {
    let mut ordered: Vec<&TimelineEvent> = events.iter().collect();
    ordered.sort_by_key(|event| match event.year {
        Some(year) => (0, year),
        None => (1, 0),
    });
    ordered
}

/// Derived timeline statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineStats {
    pub events: usize,
    pub dated: usize,
    pub earliest: Option<i32>,
    pub latest: Option<i32>,
}

/// Timeline plugin for the sync engine.
pub struct TimelineSync;

impl SyncCollection for TimelineSync {
    type State = Vec<TimelineEvent>;
    type Stats = TimelineStats;

    const SLUG: &'static str = "timeline";

    fn extract(document: &MemorialDocument) -> Self::State {
        document.timeline.clone()
    }

    fn store(document: &mut MemorialDocument, state: &Self::State) {
        document.timeline = state.clone();
    }

    fn stats(state: &Self::State) -> Self::Stats {
        let years: Vec<i32> = state.iter().filter_map(|event| event.year).collect();
        TimelineStats {
            events: state.len(),
            dated: years.len(),
            earliest: years.iter().min().copied(),
            latest: years.iter().max().copied(),
        }
    }

    fn pending_tokens(state: &Self::State) -> Vec<String> {
        pending_tokens_of(state)
    }

    fn confirm_tokens(state: &mut Self::State, tokens: &[String]) {
        confirm_tokens_in(state, tokens);
    }
}

/// Editor for the life timeline.
pub type TimelineEditor = CollectionEditor<TimelineSync>;

impl CollectionEditor<TimelineSync> {
    /// Adds a validated event to the end of the stored list.
    pub async fn add_event(&self, event: TimelineEvent) -> Result<RecordId> {
        event.validate()?;
        let id = event.id.clone();
        self.mutate(move |events| {
            events.push(event);
            Ok(())
        })
        .await?;
        Ok(id)
    }

    /// Edits an event in place. The edited record is re-validated; a
    /// failing edit leaves the working copy untouched.
    pub async fn update_event(
        &self,
        id: &RecordId,
        apply: impl FnOnce(&mut TimelineEvent) + Send,
    ) -> Result<()> {
        let id = id.clone();
        self.mutate(move |events| {
            let position = record_position(events, &id).ok_or_else(|| {
                SyncError::Validation(format!("Unknown timeline event '{id}'"))
            })?;
            apply(&mut events[position]);
            events[position].validate()
        })
        .await
    }

    pub async fn remove_event(&self, id: &RecordId) -> Result<()> {
        let id = id.clone();
        self.mutate(move |events| {
            let position = record_position(events, &id).ok_or_else(|| {
                SyncError::Validation(format!("Unknown timeline event '{id}'"))
            })?;
            events.remove(position);
            Ok(())
        })
        .await
    }

    /// Moves an event to a new stored position.
    pub async fn move_event(&self, id: &RecordId, to: usize) -> Result<()> {
        let id = id.clone();
        self.mutate(move |events| {
            let from = record_position(events, &id).ok_or_else(|| {
                SyncError::Validation(format!("Unknown timeline event '{id}'"))
            })?;
            move_record(events, from, to)
        })
        .await
    }
}
