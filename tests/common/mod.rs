#![allow(dead_code)]

//! Shared test backend: a scripted in-memory stand-in for the memorial
//! API. Calls are recorded for assertions, failures and latencies are
//! queued per operation, and everything runs on virtual time.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use memoriasync::{
    CollectionEditor, DocumentId, MemorialDocument, PersistenceClient, Result, SyncCollection,
    SyncConfig, SyncError,
};

/// One wire call observed by the mock backend.
#[derive(Debug, Clone)]
pub enum BackendCall {
    Fetch,
    ReplaceCollection { slug: String, payload: Value },
    ReplaceDocument { name: String },
}

pub struct MockBackend {
    document: Mutex<MemorialDocument>,
    calls: Mutex<Vec<BackendCall>>,
    fetch_failures: Mutex<VecDeque<SyncError>>,
    replace_failures: Mutex<VecDeque<SyncError>>,
    fetch_delay: Mutex<Option<Duration>>,
    replace_delay: Mutex<Option<Duration>>,
}

impl MockBackend {
    pub fn new(document: MemorialDocument) -> Arc<Self> {
        Arc::new(Self {
            document: Mutex::new(document),
            calls: Mutex::new(Vec::new()),
            fetch_failures: Mutex::new(VecDeque::new()),
            replace_failures: Mutex::new(VecDeque::new()),
            fetch_delay: Mutex::new(None),
            replace_delay: Mutex::new(None),
        })
    }

    pub async fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().await.clone()
    }

    /// Payloads of every collection replace for one slug, oldest first.
    pub async fn replace_payloads(&self, slug: &str) -> Vec<Value> {
        self.calls
            .lock()
            .await
            .iter()
            .filter_map(|call| match call {
                BackendCall::ReplaceCollection { slug: s, payload } if s == slug => {
                    Some(payload.clone())
                }
                _ => None,
            })
            .collect()
    }

    pub async fn replace_count(&self, slug: &str) -> usize {
        self.replace_payloads(slug).await.len()
    }

    pub async fn document_replace_count(&self) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|call| matches!(call, BackendCall::ReplaceDocument { .. }))
            .count()
    }

    pub async fn fetch_count(&self) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|call| matches!(call, BackendCall::Fetch))
            .count()
    }

    /// Queues an error for the next fetch.
    pub async fn fail_next_fetch(&self, err: SyncError) {
        self.fetch_failures.lock().await.push_back(err);
    }

    /// Queues an error for the next replace (collection or document).
    pub async fn fail_next_replace(&self, err: SyncError) {
        self.replace_failures.lock().await.push_back(err);
    }

    pub async fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock().await = Some(delay);
    }

    pub async fn set_replace_delay(&self, delay: Duration) {
        *self.replace_delay.lock().await = Some(delay);
    }

    pub async fn clear_replace_delay(&self) {
        *self.replace_delay.lock().await = None;
    }

    pub async fn set_document(&self, document: MemorialDocument) {
        *self.document.lock().await = document;
    }
}

#[async_trait]
impl PersistenceClient for MockBackend {
    async fn fetch_document(&self, _id: &DocumentId) -> Result<MemorialDocument> {
        let delay = *self.fetch_delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.lock().await.push(BackendCall::Fetch);
        if let Some(err) = self.fetch_failures.lock().await.pop_front() {
            return Err(err);
        }
        Ok(self.document.lock().await.clone())
    }

    async fn replace_collection(
        &self,
        _id: &DocumentId,
        slug: &str,
        payload: Value,
    ) -> Result<()> {
        let delay = *self.replace_delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.lock().await.push(BackendCall::ReplaceCollection {
            slug: slug.to_string(),
            payload,
        });
        if let Some(err) = self.replace_failures.lock().await.pop_front() {
            return Err(err);
        }
        Ok(())
    }

    async fn replace_document(&self, document: &MemorialDocument) -> Result<()> {
        let delay = *self.replace_delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.lock().await.push(BackendCall::ReplaceDocument {
            name: document.name.clone(),
        });
        if let Some(err) = self.replace_failures.lock().await.pop_front() {
            return Err(err);
        }
        Ok(())
    }
}

pub fn sample_document() -> MemorialDocument {
    MemorialDocument::new(DocumentId::new("mem-1"), "Rosa Delgado")
}

pub fn editor<C: SyncCollection>(backend: &Arc<MockBackend>) -> CollectionEditor<C> {
    editor_with_config(backend, SyncConfig::default())
}

pub fn editor_with_config<C: SyncCollection>(
    backend: &Arc<MockBackend>,
    config: SyncConfig,
) -> CollectionEditor<C> {
    CollectionEditor::new(backend.clone(), DocumentId::new("mem-1"), config)
        .expect("editor construction")
}

/// Sleeps past the default debounce window plus one worker heartbeat.
pub async fn run_past_debounce() {
    tokio::time::sleep(Duration::from_millis(1700)).await;
}
