// ============================================================================
// memoriasync Library
// ============================================================================

pub mod client;
pub mod collections;
pub mod config;
pub mod core;
pub mod document;
pub mod editor;

// Re-export main types for convenience
pub use config::SyncConfig;
pub use core::{
    EditorPhase, RecordId, Result, SaveErrorKind, SaveStatus, SyncError,
};
pub use document::{DocumentId, MemorialDocument};
pub use editor::{CollectionEditor, InitializeOutcome, ManualSaveOutcome};

// Re-export persistence API
pub use client::{
    CredentialProvider, HttpPersistenceClient, PersistenceClient, StaticCredential,
};

// Re-export the collection editors
pub use collections::{
    FamilyEditor, FamilyMember, FamilyStats, FamilySync, Favorite, FavoriteCategory,
    FavoriteStats, FavoritesEditor, FavoritesSync, MemoryPost, ProfileEditor, ProfileFields,
    ProfileStats, ProfileSync, ServiceEditor, ServiceInfo, ServiceStats, ServiceSync,
    SyncCollection, SyncRecord, TimelineEditor, TimelineEvent, TimelineStats, TimelineSync,
    WallEditor, WallStats, WallSync,
};

use std::sync::Arc;

// ============================================================================
// High-level editor suite
// ============================================================================

/// All six editors of one memorial page.
///
/// Each editor synchronizes independently, exactly as the page sections
/// do; the suite only bundles construction and teardown.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use memoriasync::{
///     DocumentId, HttpPersistenceClient, MemorialEditors, StaticCredential, SyncConfig,
/// };
///
/// # #[tokio::main]
/// # async fn main() -> memoriasync::Result<()> {
/// let client = Arc::new(HttpPersistenceClient::new(
///     "https://api.example.com",
///     Arc::new(StaticCredential::new("session-token")),
/// ));
///
/// let editors = MemorialEditors::new(client, DocumentId::new("mem-42"), SyncConfig::default())?;
/// editors.timeline.initialize().await?;
///
/// let event = memoriasync::TimelineEvent::new("Born in Seville", Some(1941), "");
/// editors.timeline.add_event(event).await?;
/// # Ok(())
/// # }
/// ```
pub struct MemorialEditors {
    pub timeline: TimelineEditor,
    pub family: FamilyEditor,
    pub favorites: FavoritesEditor,
    pub wall: WallEditor,
    pub service: ServiceEditor,
    pub profile: ProfileEditor,
}

impl MemorialEditors {
    /// Creates the six editors against one shared client.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(
        client: Arc<dyn PersistenceClient>,
        document_id: DocumentId,
        config: SyncConfig,
    ) -> Result<Self> {
        Ok(Self {
            timeline: CollectionEditor::new(client.clone(), document_id.clone(), config.clone())?,
            family: CollectionEditor::new(client.clone(), document_id.clone(), config.clone())?,
            favorites: CollectionEditor::new(client.clone(), document_id.clone(), config.clone())?,
            wall: CollectionEditor::new(client.clone(), document_id.clone(), config.clone())?,
            service: CollectionEditor::new(client.clone(), document_id.clone(), config.clone())?,
            profile: CollectionEditor::new(client, document_id, config)?,
        })
    }

    /// Loads the snapshots of all editors, one after another.
    pub async fn initialize_all(&self) -> Result<()> {
        self.timeline.initialize().await?;
        self.family.initialize().await?;
        self.favorites.initialize().await?;
        self.wall.initialize().await?;
        self.service.initialize().await?;
        self.profile.initialize().await?;
        Ok(())
    }

    /// Shuts down all editors.
    pub async fn close_all(self) -> Result<()> {
        self.timeline.close().await?;
        self.family.close().await?;
        self.favorites.close().await?;
        self.wall.close().await?;
        self.service.close().await?;
        self.profile.close().await?;
        Ok(())
    }
}
