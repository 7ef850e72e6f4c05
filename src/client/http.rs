//! HTTP implementation of the persistence contract using [`reqwest`].

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};
use serde_json::Value;

use crate::client::{CredentialProvider, PersistenceClient};
use crate::core::{Result, SyncError};
use crate::document::{DocumentId, MemorialDocument};

/// Client for the memorial REST backend.
pub struct HttpPersistenceClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpPersistenceClient {
    /// Create a client for the given API base URL, e.g.
    /// `https://api.example.com`.
    pub fn new(base_url: impl Into<String>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, credentials)
    }

    /// Create a client reusing an existing [`reqwest::Client`] so several
    /// editors share one connection pool.
    pub fn with_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            credentials,
        }
    }

    fn document_url(&self, id: &DocumentId) -> String {
        format!("{}/memorials/{}", self.base_url, id)
    }

    fn collection_url(&self, id: &DocumentId, slug: &str) -> String {
        format!("{}/memorials/{}/collections/{}", self.base_url, id, slug)
    }

    /// The credential check runs before any request is built; a missing
    /// token must never reach the network as an anonymous call.
    fn bearer(&self, operation: &str) -> Result<String> {
        self.credentials
            .bearer_token()
            .ok_or_else(|| SyncError::MissingCredential(operation.to_string()))
    }

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let code = status.as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        warn!("Backend rejected request: HTTP {code}: {body}");

        if code == 401 || code == 403 {
            return Err(SyncError::Unauthorized(code));
        }
        Err(SyncError::Backend(code))
    }
}

#[async_trait]
impl PersistenceClient for HttpPersistenceClient {
    async fn fetch_document(&self, id: &DocumentId) -> Result<MemorialDocument> {
        let token = self.bearer("fetch document")?;
        let url = self.document_url(id);
        debug!("GET {url}");

        let response = self.http.get(&url).bearer_auth(token).send().await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.json().await?)
    }

    async fn replace_collection(
        &self,
        id: &DocumentId,
        slug: &str,
        payload: Value,
    ) -> Result<()> {
        let token = self.bearer(slug)?;
        let url = self.collection_url(id, slug);
        debug!("PUT {url}");

        let response = self
            .http
            .put(&url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn replace_document(&self, document: &MemorialDocument) -> Result<()> {
        let token = self.bearer("replace document")?;
        let url = self.document_url(&document.id);
        debug!("PUT {url}");

        let response = self
            .http
            .put(&url)
            .bearer_auth(token)
            .json(document)
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }
}
