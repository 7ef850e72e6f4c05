//! The collection editor: optimistic editing with debounced autosave.
//!
//! A [`CollectionEditor`] owns the working copy of one collection, the
//! baseline it is diffed against, and a background worker that turns
//! quiet periods into persistence calls. Hosts mutate through closures
//! (or the typed operations each collection adds), read snapshots, and
//! watch the save status; everything else is automatic.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::time::Instant;

use crate::client::PersistenceClient;
use crate::collections::SyncCollection;
use crate::config::SyncConfig;
use crate::core::{EditorPhase, Result, SaveStatus, SyncError};
use crate::document::{DocumentId, MemorialDocument};

mod state;
mod worker;

use state::{EditorState, ManualSaveBegin, PersistJob};
use worker::{spawn_autosave_worker, AutosaveWorker};

/// What [`CollectionEditor::initialize`] found when it ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitializeOutcome {
    /// The snapshot was fetched and the editor is now ready.
    Loaded,
    /// A prior initialize already completed; nothing was touched.
    AlreadyReady,
}

/// What [`CollectionEditor::save_now`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualSaveOutcome {
    /// A write ran and was confirmed.
    Saved,
    /// The working copy matched the baseline; no network call was made.
    NoChanges,
    /// Another write was already in flight; no network call was made.
    AlreadySaving,
}

/// Editor for one collection of one memorial document.
///
/// The editor is a single-owner handle: dropping it aborts the background
/// worker, [`close`](Self::close) shuts it down cleanly. Observers take a
/// [`subscribe_status`](Self::subscribe_status) receiver instead of
/// sharing the editor itself.
pub struct CollectionEditor<C: SyncCollection> {
    state: Arc<Mutex<EditorState<C>>>,
    client: Arc<dyn PersistenceClient>,
    config: SyncConfig,
    document_id: DocumentId,
    status_rx: watch::Receiver<SaveStatus>,
    worker: Option<AutosaveWorker>,
}

impl<C: SyncCollection> CollectionEditor<C> {
    /// Creates an editor and starts its autosave worker.
    ///
    /// Must be called from within a Tokio runtime. The editor accepts no
    /// edits until [`initialize`](Self::initialize) has loaded the server
    /// snapshot.
    pub fn new(
        client: Arc<dyn PersistenceClient>,
        document_id: DocumentId,
        config: SyncConfig,
    ) -> Result<Self> {
        config.validate().map_err(SyncError::Config)?;

        let (status_tx, status_rx) = watch::channel(SaveStatus::Idle);
        let state = Arc::new(Mutex::new(EditorState::new(config.clone(), status_tx)));
        let worker = spawn_autosave_worker(state.clone(), client.clone(), config.clone());

        Ok(Self {
            state,
            client,
            config,
            document_id,
            status_rx,
            worker: Some(worker),
        })
    }

    /// Fetches the server snapshot and seeds baseline and working copy.
    ///
    /// Runs at most once: a second call after a successful load returns
    /// [`InitializeOutcome::AlreadyReady`] without touching editor state,
    /// and a call racing an in-flight load fails with
    /// [`SyncError::InitializeInFlight`]. A failed fetch leaves the
    /// editor uninitialized so the host may try again.
    pub async fn initialize(&self) -> Result<InitializeOutcome> {
        {
            let mut guard = self.state.lock().await;
            if !guard.begin_initialize()? {
                return Ok(InitializeOutcome::AlreadyReady);
            }
        }

        let fetched = run_bounded(
            self.config.persist_timeout,
            self.client.fetch_document(&self.document_id),
        )
        .await;

        let mut guard = self.state.lock().await;
        match fetched {
            Ok(document) => {
                guard.complete_initialize(document, Instant::now());
                Ok(InitializeOutcome::Loaded)
            }
            Err(err) => {
                guard.abort_initialize();
                Err(err)
            }
        }
    }

    /// Applies one mutation to the working copy and re-arms the debounce
    /// window. The closure runs against a scratch clone, so a failing
    /// closure leaves the working copy untouched and schedules nothing.
    pub async fn mutate(
        &self,
        f: impl FnOnce(&mut C::State) -> Result<()> + Send,
    ) -> Result<()> {
        let mut guard = self.state.lock().await;
        guard.mutate(f, Instant::now())
    }

    /// Persists right now, bypassing the debounce window.
    ///
    /// A clean copy or an already-running write short-circuits to a
    /// no-op outcome. A failed write surfaces its error here as well as
    /// through the status channel; manual failures schedule no retry of
    /// their own.
    pub async fn save_now(&self) -> Result<ManualSaveOutcome> {
        let begin = {
            let mut guard = self.state.lock().await;
            guard.begin_manual_save(Instant::now())?
        };

        let job = match begin {
            ManualSaveBegin::AlreadySaving => return Ok(ManualSaveOutcome::AlreadySaving),
            ManualSaveBegin::NoChanges => return Ok(ManualSaveOutcome::NoChanges),
            ManualSaveBegin::Job(job) => job,
        };

        let confirm = self.config.confirm_document_on_manual_save;
        let outcome = execute_job::<C>(self.client.as_ref(), &self.config, &job, confirm).await;

        let mut guard = self.state.lock().await;
        match outcome {
            Ok(()) => {
                guard.finish_persist(job, None, true, Instant::now());
                Ok(ManualSaveOutcome::Saved)
            }
            Err(err) => {
                guard.finish_persist(job, Some(&err), true, Instant::now());
                Err(err)
            }
        }
    }

    /// A clone of the current working copy.
    pub async fn state(&self) -> Result<C::State> {
        self.state.lock().await.state_snapshot()
    }

    /// A clone of the retained document, reflecting the last confirmed
    /// state of this collection.
    pub async fn document(&self) -> Result<MemorialDocument> {
        self.state.lock().await.document_snapshot()
    }

    /// Derived statistics over the current working copy.
    pub async fn stats(&self) -> Result<C::Stats> {
        self.state.lock().await.stats()
    }

    /// Whether the working copy differs from the last confirmed baseline.
    pub async fn has_unsaved_changes(&self) -> Result<bool> {
        self.state.lock().await.has_unsaved_changes()
    }

    pub async fn status(&self) -> SaveStatus {
        self.state.lock().await.current_status(Instant::now())
    }

    /// A receiver that observes every save-status transition.
    pub fn subscribe_status(&self) -> watch::Receiver<SaveStatus> {
        self.status_rx.clone()
    }

    pub async fn phase(&self) -> EditorPhase {
        self.state.lock().await.phase()
    }

    pub fn document_id(&self) -> &DocumentId {
        &self.document_id
    }

    /// Stops the autosave worker and refuses further edits. The outcome
    /// of a write still in flight is discarded.
    pub async fn close(mut self) -> Result<()> {
        {
            let mut guard = self.state.lock().await;
            guard.close();
        }
        if let Some(worker) = self.worker.take() {
            worker.stop().await?;
        }
        Ok(())
    }
}

/// Runs a persist step under the configured time bound. The confirmation
/// write is skipped for collections whose persist already replaces the
/// whole document.
pub(crate) async fn execute_job<C: SyncCollection>(
    client: &dyn PersistenceClient,
    config: &SyncConfig,
    job: &PersistJob<C>,
    confirm_document: bool,
) -> Result<()> {
    run_bounded(
        config.persist_timeout,
        C::persist(client, &job.document, &job.staged),
    )
    .await?;

    if confirm_document && !C::PERSISTS_DOCUMENT {
        run_bounded(
            config.persist_timeout,
            client.replace_document(&job.document),
        )
        .await?;
    }
    Ok(())
}

async fn run_bounded<T>(limit: Duration, operation: impl Future<Output = Result<T>>) -> Result<T> {
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => Err(SyncError::Timeout(limit)),
    }
}
