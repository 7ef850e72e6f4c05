//! Collection contracts and the six concrete editor domains.
//!
//! Each editable area of a memorial page plugs into the engine through
//! [`SyncCollection`]: how its state is carved out of the document, how a
//! fetched snapshot is normalized, which statistics it derives, and how it
//! is written back. List-shaped collections additionally implement
//! [`SyncRecord`] per element for identity and admission validation.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::client::PersistenceClient;
use crate::core::{RecordId, Result, SyncError};
use crate::document::MemorialDocument;

pub mod family;
pub mod favorites;
pub mod profile;
pub mod service;
pub mod timeline;
pub mod wall;

pub use family::{FamilyEditor, FamilyMember, FamilyStats, FamilySync};
pub use favorites::{Favorite, FavoriteCategory, FavoriteStats, FavoritesEditor, FavoritesSync};
pub use profile::{ProfileEditor, ProfileFields, ProfileStats, ProfileSync};
pub use service::{ServiceEditor, ServiceInfo, ServiceStats, ServiceSync};
pub use timeline::{TimelineEditor, TimelineEvent, TimelineStats, TimelineSync};
pub use wall::{MemoryPost, WallEditor, WallStats, WallSync};

/// One element of a list-shaped collection.
pub trait SyncRecord {
    fn id(&self) -> &RecordId;

    fn id_mut(&mut self) -> &mut RecordId;

    /// Gate a record must pass before it is accepted into the working copy.
    fn validate(&self) -> Result<()>;
}

/// A synchronizable slice of the memorial document.
///
/// Implementations are unit structs; every method is an associated
/// function, so the collection acts as a type-level plugin rather than a
/// value the engine has to carry around.
#[async_trait]
pub trait SyncCollection: Send + Sync + 'static {
    /// The editable state, cloned freely between working copy and baseline.
    type State: Clone + Serialize + Send + Sync + 'static;

    /// Derived read-only statistics for host UI.
    type Stats: Send;

    /// Path segment of the collection in the backend API.
    const SLUG: &'static str;

    /// Whether [`persist`](Self::persist) already writes the whole
    /// document, making a separate confirmation write redundant.
    const PERSISTS_DOCUMENT: bool = false;

    /// Carves the collection state out of a fetched document.
    fn extract(document: &MemorialDocument) -> Self::State;

    /// Writes confirmed state back into the retained document.
    fn store(document: &mut MemorialDocument, state: &Self::State);

    /// Backfills and migrates a freshly fetched snapshot in place.
    ///
    /// Returns true when the shape changed, which schedules an immediate
    /// autosave so the healed form reaches the backend.
    fn normalize(_state: &mut Self::State) -> bool {
        false
    }

    fn stats(state: &Self::State) -> Self::Stats;

    /// Tokens of records in `state` still awaiting backend acknowledgment.
    fn pending_tokens(_state: &Self::State) -> Vec<String> {
        Vec::new()
    }

    /// Promotes the listed pending records to persisted identity.
    fn confirm_tokens(_state: &mut Self::State, _tokens: &[String]) {}

    /// Writes the state to the backend. The default is a whole-collection
    /// replace under [`SLUG`](Self::SLUG).
    async fn persist(
        client: &dyn PersistenceClient,
        document: &MemorialDocument,
        state: &Self::State,
    ) -> Result<()> {
        let payload = serde_json::to_value(state)?;
        client
            .replace_collection(&document.id, Self::SLUG, payload)
            .await
    }
}

/// Collects the pending tokens of a record list.
pub fn pending_tokens_of<R: SyncRecord>(records: &[R]) -> Vec<String> {
    records
        .iter()
        .filter(|record| record.id().is_pending())
        .map(|record| record.id().token().to_string())
        .collect()
}

/// Promotes every listed pending record in place. Records created after
/// the token list was captured keep their pending identity.
pub fn confirm_tokens_in<R: SyncRecord>(records: &mut [R], tokens: &[String]) {
    for record in records {
        if record.id().is_pending() && tokens.iter().any(|t| t == record.id().token()) {
            record.id_mut().confirm();
        }
    }
}

/// Position of a record by identity, tolerant of a promotion that landed
/// between the caller taking the id and the lookup.
pub fn record_position<R: SyncRecord>(records: &[R], id: &RecordId) -> Option<usize> {
    records.iter().position(|record| record.id().same_record(id))
}

/// Moves a record to a new position, shifting the records in between.
pub fn move_record<R>(records: &mut Vec<R>, from: usize, to: usize) -> Result<()> {
    if from >= records.len() || to >= records.len() {
        return Err(SyncError::Validation(format!(
            "Move {from} -> {to} is out of bounds for {} records",
            records.len()
        )));
    }
    let record = records.remove(from);
    records.insert(to, record);
    Ok(())
}

/// Deserializes a nullable wire string into its canonical empty form.
pub(crate) fn string_or_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

/// Requires a non-blank value for a named field.
pub(crate) fn require_field(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SyncError::Validation(format!("{field} is required")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Item {
        id: RecordId,
    }

    impl SyncRecord for Item {
        fn id(&self) -> &RecordId {
            &self.id
        }

        fn id_mut(&mut self) -> &mut RecordId {
            &mut self.id
        }

        fn validate(&self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn confirm_skips_records_created_after_capture() {
        let mut items = vec![
            Item {
                id: RecordId::fresh(),
            },
            Item {
                id: RecordId::persisted("old"),
            },
        ];
        let captured = pending_tokens_of(&items);
        assert_eq!(captured.len(), 1);

        // A record added while the captured write was in flight.
        items.push(Item {
            id: RecordId::fresh(),
        });

        confirm_tokens_in(&mut items, &captured);
        assert!(!items[0].id.is_pending());
        assert!(!items[1].id.is_pending());
        assert!(items[2].id.is_pending());
    }

    #[test]
    fn move_record_shifts_neighbours() {
        let mut items = vec![1, 2, 3, 4];
        move_record(&mut items, 0, 2).unwrap();
        assert_eq!(items, vec![2, 3, 1, 4]);

        move_record(&mut items, 3, 0).unwrap();
        assert_eq!(items, vec![4, 2, 3, 1]);

        assert!(move_record(&mut items, 0, 9).is_err());
    }

    #[test]
    fn record_position_matches_across_promotion() {
        let pending = RecordId::fresh();
        let mut items = vec![Item {
            id: pending.clone(),
        }];
        items[0].id_mut().confirm();

        // The caller still holds the pending form of the id.
        assert_eq!(record_position(&items, &pending), Some(0));
    }
}
