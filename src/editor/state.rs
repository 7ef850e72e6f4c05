//! The synchronization state machine of one collection editor.
//!
//! Everything here is synchronous and runs under the editor mutex; all
//! timing enters through `now` parameters. Deadlines for the debounce
//! window and the status revert are plain state, consumed by [`tick`]
//! (called from the background worker), never spawned timers. That makes
//! cancellation a field write and leaves nothing behind to fire stale.
//!
//! A persist is split into a begin step that stages the payload under the
//! lock and a finish step that applies the outcome; the network call in
//! between runs without the lock, so editing stays responsive while a
//! write is in flight.
//!
//! [`tick`]: EditorState::tick

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{event, Level};

use crate::collections::SyncCollection;
use crate::config::SyncConfig;
use crate::core::detect;
use crate::core::{EditorPhase, Result, SaveErrorKind, SaveStatus, StatusTracker, SyncError};
use crate::document::MemorialDocument;

/// A staged write, built under the lock and executed without it.
pub(crate) struct PersistJob<C: SyncCollection> {
    /// The state this write carries. Becomes the baseline on success.
    pub(crate) staged: C::State,
    /// Tokens of pending records included in the write.
    pub(crate) confirmed: Vec<String>,
    /// The retained document with `staged` already stored into it.
    pub(crate) document: MemorialDocument,
}

/// Outcome of the guarded manual-save entry.
pub(crate) enum ManualSaveBegin<C: SyncCollection> {
    AlreadySaving,
    NoChanges,
    Job(PersistJob<C>),
}

pub(crate) struct EditorState<C: SyncCollection> {
    config: SyncConfig,
    phase: EditorPhase,
    /// Retained server document; collection state is read through
    /// [`SyncCollection::extract`] and written back on confirmed saves.
    document: Option<MemorialDocument>,
    /// What the user edits.
    working: Option<C::State>,
    /// Last state confirmed by the backend. Advances only on success.
    baseline: Option<C::State>,
    status: StatusTracker,
    status_tx: watch::Sender<SaveStatus>,
    /// When the armed debounce window elapses. `None` means disarmed.
    autosave_at: Option<Instant>,
    /// Single-flight guard across autosave and manual save.
    in_flight: bool,
}

impl<C: SyncCollection> EditorState<C> {
    pub(crate) fn new(config: SyncConfig, status_tx: watch::Sender<SaveStatus>) -> Self {
        Self {
            config,
            phase: EditorPhase::Uninitialized,
            document: None,
            working: None,
            baseline: None,
            status: StatusTracker::new(),
            status_tx,
            autosave_at: None,
            in_flight: false,
        }
    }

    pub(crate) fn phase(&self) -> EditorPhase {
        self.phase
    }

    pub(crate) fn current_status(&mut self, now: Instant) -> SaveStatus {
        if self.status.poll(now) {
            self.publish_status();
        }
        self.status.current()
    }

    fn publish_status(&self) {
        let _ = self.status_tx.send(self.status.current());
    }

    fn guard_ready(&self) -> Result<()> {
        match self.phase {
            EditorPhase::Ready => Ok(()),
            EditorPhase::Closed => Err(SyncError::Closed(C::SLUG.to_string())),
            _ => Err(SyncError::NotReady(C::SLUG.to_string())),
        }
    }

    fn working_ref(&self) -> Result<&C::State> {
        self.working
            .as_ref()
            .ok_or_else(|| SyncError::NotReady(C::SLUG.to_string()))
    }

    /// Claims the initialize slot. `Ok(true)` means the caller owns the
    /// fetch; `Ok(false)` means the editor is already ready and a late
    /// call must not disturb it.
    pub(crate) fn begin_initialize(&mut self) -> Result<bool> {
        match self.phase {
            EditorPhase::Uninitialized => {
                self.phase = EditorPhase::Initializing;
                Ok(true)
            }
            EditorPhase::Ready => Ok(false),
            EditorPhase::Initializing => Err(SyncError::InitializeInFlight(C::SLUG.to_string())),
            EditorPhase::Closed => Err(SyncError::Closed(C::SLUG.to_string())),
        }
    }

    /// Returns the editor to Uninitialized after a failed fetch so a
    /// later initialize can try again.
    pub(crate) fn abort_initialize(&mut self) {
        if self.phase == EditorPhase::Initializing {
            self.phase = EditorPhase::Uninitialized;
        }
    }

    /// Seeds baseline and working copy from the fetched snapshot.
    ///
    /// The baseline is the snapshot exactly as parsed. Normalization may
    /// then migrate the working copy; if it changed anything, an
    /// immediate autosave is armed so the healed shape reaches the
    /// backend through the ordinary persist path. Should that write
    /// fail, the as-fetched baseline keeps the copy dirty and the heal
    /// is retried like any other edit.
    pub(crate) fn complete_initialize(&mut self, document: MemorialDocument, now: Instant) -> bool {
        if self.phase != EditorPhase::Initializing {
            return false;
        }

        let mut working = C::extract(&document);
        let baseline = working.clone();
        let healed = C::normalize(&mut working);

        self.document = Some(document);
        self.working = Some(working);
        self.baseline = Some(baseline);
        self.phase = EditorPhase::Ready;

        if healed {
            self.autosave_at = Some(now);
            event!(
                Level::INFO,
                editor = C::SLUG,
                "snapshot normalized, scheduling self-heal write"
            );
        }
        healed
    }

    /// Applies one mutation and re-arms the debounce window.
    ///
    /// The closure runs against a scratch clone; if it fails, the working
    /// copy is untouched and no window is armed.
    pub(crate) fn mutate<F>(&mut self, f: F, now: Instant) -> Result<()>
    where
        F: FnOnce(&mut C::State) -> Result<()>,
    {
        self.guard_ready()?;
        let working = self
            .working
            .as_mut()
            .ok_or_else(|| SyncError::NotReady(C::SLUG.to_string()))?;

        let mut next = working.clone();
        f(&mut next)?;
        *working = next;

        self.autosave_at = Some(now + self.config.debounce_window);
        Ok(())
    }

    pub(crate) fn has_unsaved_changes(&self) -> Result<bool> {
        if self.phase != EditorPhase::Ready {
            return Ok(false);
        }
        detect::has_changes(self.working_ref()?, self.baseline.as_ref())
    }

    /// Stages a write: pending records are promoted in the payload so the
    /// backend stores bare tokens, and the promoted state is what the
    /// baseline will become once the write is confirmed.
    fn build_job(&self) -> Result<PersistJob<C>> {
        let working = self.working_ref()?;
        let document = self
            .document
            .as_ref()
            .ok_or_else(|| SyncError::NotReady(C::SLUG.to_string()))?;

        let confirmed = C::pending_tokens(working);
        let mut staged = working.clone();
        C::confirm_tokens(&mut staged, &confirmed);

        let mut document = document.clone();
        C::store(&mut document, &staged);

        Ok(PersistJob {
            staged,
            confirmed,
            document,
        })
    }

    /// One worker heartbeat: apply a due status revert, then start a due
    /// autosave. Returns the staged job if a persist should run now.
    ///
    /// The deadline is consumed before the dirty re-check, so an armed
    /// window whose edits were undone in the meantime fires as a no-op.
    pub(crate) fn tick(&mut self, now: Instant) -> Option<PersistJob<C>> {
        if self.status.poll(now) {
            self.publish_status();
        }

        if self.phase != EditorPhase::Ready || self.in_flight {
            return None;
        }
        match self.autosave_at {
            Some(at) if now >= at => {}
            _ => return None,
        }
        self.autosave_at = None;

        match self.has_unsaved_changes() {
            Ok(true) => {}
            Ok(false) => {
                event!(
                    Level::DEBUG,
                    editor = C::SLUG,
                    "autosave window elapsed with no changes"
                );
                return None;
            }
            Err(err) => {
                event!(
                    Level::ERROR,
                    editor = C::SLUG,
                    error = %err,
                    "change detection failed"
                );
                return None;
            }
        }

        match self.build_job() {
            Ok(job) => {
                self.in_flight = true;
                self.status.begin_saving();
                self.publish_status();
                event!(Level::DEBUG, editor = C::SLUG, "autosave persist started");
                Some(job)
            }
            Err(err) => {
                event!(
                    Level::ERROR,
                    editor = C::SLUG,
                    error = %err,
                    "could not stage autosave payload"
                );
                None
            }
        }
    }

    /// The guarded manual-save entry: a clean copy or a write already in
    /// flight short-circuits without touching the network.
    pub(crate) fn begin_manual_save(&mut self, _now: Instant) -> Result<ManualSaveBegin<C>> {
        self.guard_ready()?;
        if self.in_flight {
            return Ok(ManualSaveBegin::AlreadySaving);
        }
        if !self.has_unsaved_changes()? {
            return Ok(ManualSaveBegin::NoChanges);
        }

        let job = self.build_job()?;
        self.in_flight = true;
        // The manual save supersedes any armed window.
        self.autosave_at = None;
        self.status.begin_saving();
        self.publish_status();
        event!(Level::DEBUG, editor = C::SLUG, "manual persist started");
        Ok(ManualSaveBegin::Job(job))
    }

    /// Applies a persist outcome.
    ///
    /// Success: promote the carried pending records in the live working
    /// copy, advance the baseline to the staged state, store it into the
    /// retained document, then re-check for edits that landed while the
    /// write was in flight.
    ///
    /// Failure: the baseline stays where it was. A transient autosave
    /// failure re-arms the window so the edits retry on their own; a
    /// precondition failure and a manual failure do not schedule anything.
    pub(crate) fn finish_persist(
        &mut self,
        job: PersistJob<C>,
        error: Option<&SyncError>,
        manual: bool,
        now: Instant,
    ) {
        self.in_flight = false;
        if self.phase == EditorPhase::Closed {
            event!(
                Level::DEBUG,
                editor = C::SLUG,
                "discarding persist outcome after close"
            );
            return;
        }

        match error {
            None => {
                if let Some(working) = self.working.as_mut() {
                    C::confirm_tokens(working, &job.confirmed);
                }
                self.document = Some(job.document);
                self.baseline = Some(job.staged);
                self.status.finish_success(now, self.config.success_hold);
                self.publish_status();
                event!(
                    Level::DEBUG,
                    editor = C::SLUG,
                    manual,
                    "persist confirmed, baseline advanced"
                );

                // Trailing re-check: edits made during the flight keep (or
                // get) a window; a clean copy disarms any stale one.
                match self.has_unsaved_changes() {
                    Ok(true) => {
                        if self.autosave_at.is_none() {
                            self.autosave_at = Some(now + self.config.debounce_window);
                        }
                    }
                    Ok(false) => {
                        self.autosave_at = None;
                    }
                    Err(_) => {}
                }
            }
            Some(err) => {
                let kind = if err.is_transient() {
                    SaveErrorKind::Transient
                } else {
                    SaveErrorKind::Precondition
                };
                self.status.finish_error(kind, now, self.config.error_hold);
                self.publish_status();
                event!(
                    Level::WARN,
                    editor = C::SLUG,
                    error = %err,
                    manual,
                    "persist failed"
                );

                if !manual && kind == SaveErrorKind::Transient {
                    self.autosave_at = Some(now + self.config.debounce_window);
                }
            }
        }
    }

    pub(crate) fn close(&mut self) {
        self.phase = EditorPhase::Closed;
        self.autosave_at = None;
    }

    pub(crate) fn state_snapshot(&self) -> Result<C::State> {
        self.guard_ready()?;
        Ok(self.working_ref()?.clone())
    }

    pub(crate) fn document_snapshot(&self) -> Result<MemorialDocument> {
        self.guard_ready()?;
        self.document
            .clone()
            .ok_or_else(|| SyncError::NotReady(C::SLUG.to_string()))
    }

    pub(crate) fn stats(&self) -> Result<C::Stats> {
        self.guard_ready()?;
        Ok(C::stats(self.working_ref()?))
    }
}
