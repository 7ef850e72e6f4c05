//! Persistence contract against the memorial backend.
//!
//! The engine only ever talks to [`PersistenceClient`]; the HTTP
//! implementation lives in [`http`] and tests substitute their own.

use async_trait::async_trait;
use serde_json::Value;

use crate::core::Result;
use crate::document::{DocumentId, MemorialDocument};

pub mod http;

pub use http::HttpPersistenceClient;

/// The three wire operations the engine needs.
#[async_trait]
pub trait PersistenceClient: Send + Sync {
    /// Loads the current server snapshot of a document.
    async fn fetch_document(&self, id: &DocumentId) -> Result<MemorialDocument>;

    /// Replaces one collection of a document with the given payload.
    async fn replace_collection(
        &self,
        id: &DocumentId,
        slug: &str,
        payload: Value,
    ) -> Result<()>;

    /// Replaces the whole document.
    async fn replace_document(&self, document: &MemorialDocument) -> Result<()>;
}

/// Source of the bearer credential attached to every request.
///
/// Returning `None` means the session currently has no credential; the
/// operation fails fast without touching the network.
pub trait CredentialProvider: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// A fixed token, the common case for an authenticated session.
pub struct StaticCredential(String);

impl StaticCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl CredentialProvider for StaticCredential {
    fn bearer_token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}
