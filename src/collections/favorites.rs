//! Favorite things: question and answer cards grouped by category.
//!
//! Early versions of the product keyed categories by a raw emoji. Those
//! documents still exist, so a fetched snapshot is normalized to the
//! canonical category slugs before editing starts; the healed shape is
//! then persisted through the ordinary autosave path.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::collections::{
    confirm_tokens_in, pending_tokens_of, record_position, require_field, string_or_empty,
    SyncCollection, SyncRecord,
};
use crate::core::{RecordId, Result, SyncError};
use crate::document::MemorialDocument;
use crate::editor::CollectionEditor;

/// Canonical favorite categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FavoriteCategory {
    Music,
    Food,
    Books,
    Film,
    Places,
    Pastimes,
    Other,
}

impl FavoriteCategory {
    pub const ALL: [FavoriteCategory; 7] = [
        Self::Music,
        Self::Food,
        Self::Books,
        Self::Film,
        Self::Places,
        Self::Pastimes,
        Self::Other,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Self::Music => "music",
            Self::Food => "food",
            Self::Books => "books",
            Self::Film => "film",
            Self::Places => "places",
            Self::Pastimes => "pastimes",
            Self::Other => "other",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.slug() == slug)
    }

    /// Maps a stored category key to its canonical slug. Handles current
    /// slugs, the legacy emoji keys, and falls back to `other` for
    /// anything unrecognized.
    fn canonical_key(raw: &str) -> &'static str {
        if let Some(category) = Self::from_slug(raw) {
            return category.slug();
        }
        match raw {
            "🎵" => Self::Music.slug(),
            "🍲" => Self::Food.slug(),
            "📚" => Self::Books.slug(),
            "🎬" => Self::Film.slug(),
            "🌍" => Self::Places.slug(),
            "🎨" => Self::Pastimes.slug(),
            _ => Self::Other.slug(),
        }
    }
}

/// One favorite-things card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: RecordId,

    /// Stored category key. Canonical after normalization; kept as a raw
    /// string so legacy documents parse without loss.
    #[serde(default, deserialize_with = "string_or_empty")]
    pub category: String,

    #[serde(default, deserialize_with = "string_or_empty")]
    pub question: String,

    #[serde(default, deserialize_with = "string_or_empty")]
    pub answer: String,
}

impl Favorite {
    pub fn new(
        category: FavoriteCategory,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            id: RecordId::fresh(),
            category: category.slug().to_string(),
            question: question.into(),
            answer: answer.into(),
        }
    }

    pub fn category(&self) -> FavoriteCategory {
        FavoriteCategory::from_slug(&self.category).unwrap_or(FavoriteCategory::Other)
    }
}

impl SyncRecord for Favorite {
    fn id(&self) -> &RecordId {
        &self.id
    }

    fn id_mut(&mut self) -> &mut RecordId {
        &mut self.id
    }

    fn validate(&self) -> Result<()> {
        require_field("Favorite question", &self.question)?;
        require_field("Favorite answer", &self.answer)
    }
}

/// Derived favorites statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteStats {
    pub total: usize,
    /// Non-empty category buckets in canonical order.
    pub per_category: Vec<(FavoriteCategory, usize)>,
}

/// Favorites plugin for the sync engine.
pub struct FavoritesSync;

impl SyncCollection for FavoritesSync {
    type State = Vec<Favorite>;
    type Stats = FavoriteStats;

    const SLUG: &'static str = "favorites";

    fn extract(document: &MemorialDocument) -> Self::State {
        document.favorites.clone()
    }

    fn store(document: &mut MemorialDocument, state: &Self::State) {
        document.favorites = state.clone();
    }

    fn normalize(state: &mut Self::State) -> bool {
        let mut changed = false;
        for favorite in state.iter_mut() {
            let canonical = FavoriteCategory::canonical_key(&favorite.category);
            if favorite.category != canonical {
                // The emoji map never yields "other", so landing there
                // means the key was unrecognized.
                if canonical == FavoriteCategory::Other.slug() {
                    warn!(
                        "Unknown favorite category '{}' folded into '{canonical}'",
                        favorite.category
                    );
                }
                favorite.category = canonical.to_string();
                changed = true;
            }
        }
        changed
    }

    fn stats(state: &Self::State) -> Self::Stats {
        let per_category = FavoriteCategory::ALL
            .iter()
            .filter_map(|category| {
                let count = state.iter().filter(|f| f.category() == *category).count();
                (count > 0).then_some((*category, count))
            })
            .collect();
        FavoriteStats {
            total: state.len(),
            per_category,
        }
    }

    fn pending_tokens(state: &Self::State) -> Vec<String> {
        pending_tokens_of(state)
    }

    fn confirm_tokens(state: &mut Self::State, tokens: &[String]) {
        confirm_tokens_in(state, tokens);
    }
}

/// Editor for the favorite things cards.
pub type FavoritesEditor = CollectionEditor<FavoritesSync>;

impl CollectionEditor<FavoritesSync> {
    pub async fn add_favorite(&self, favorite: Favorite) -> Result<RecordId> {
        favorite.validate()?;
        let id = favorite.id.clone();
        self.mutate(move |favorites| {
            favorites.push(favorite);
            Ok(())
        })
        .await?;
        Ok(id)
    }

    pub async fn update_favorite(
        &self,
        id: &RecordId,
        apply: impl FnOnce(&mut Favorite) + Send,
    ) -> Result<()> {
        let id = id.clone();
        self.mutate(move |favorites| {
            let position = record_position(favorites, &id)
                .ok_or_else(|| SyncError::Validation(format!("Unknown favorite '{id}'")))?;
            apply(&mut favorites[position]);
            favorites[position].validate()
        })
        .await
    }

    pub async fn remove_favorite(&self, id: &RecordId) -> Result<()> {
        let id = id.clone();
        self.mutate(move |favorites| {
            let position = record_position(favorites, &id)
                .ok_or_else(|| SyncError::Validation(format!("Unknown favorite '{id}'")))?;
            favorites.remove(position);
            Ok(())
        })
        .await
    }
}
