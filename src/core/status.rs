use tokio::time::Instant;

/// Classes of persist failure surfaced to the status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveErrorKind {
    /// Network or server trouble. The engine keeps retrying on its own.
    Transient,
    /// A failed precondition, such as a missing credential. No retry is
    /// scheduled; the host has to resolve it.
    Precondition,
}

/// What the save indicator should show right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Success,
    Error(SaveErrorKind),
}

impl SaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Saving => "saving",
            Self::Success => "success",
            Self::Error(_) => "error",
        }
    }
}

/// Lifecycle phase of a collection editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorPhase {
    #[default]
    Uninitialized,
    Initializing,
    Ready,
    Closed,
}

/// Tracks the save indicator and its pending revert deadline.
///
/// Success and Error are held for a configured duration and then fall back
/// to Idle. The revert is not a spawned timer: it is a deadline stored here
/// and applied by [`poll`](Self::poll). Every transition overwrites the
/// deadline, so a newer transition always wins over a stale revert.
///
/// # Examples
///
/// ```
/// # use std::time::Duration;
/// # tokio_test::block_on(async {
/// use memoriasync::core::StatusTracker;
/// use tokio::time::Instant;
///
/// let mut tracker = StatusTracker::new();
/// tracker.begin_saving();
/// tracker.finish_success(Instant::now(), Duration::from_secs(2));
/// assert_eq!(tracker.current().as_str(), "success");
/// # });
/// ```
#[derive(Debug)]
pub struct StatusTracker {
    status: SaveStatus,
    revert_at: Option<Instant>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self {
            status: SaveStatus::Idle,
            revert_at: None,
        }
    }

    pub fn current(&self) -> SaveStatus {
        self.status
    }

    /// A persist attempt has started. Saving never reverts on its own.
    pub fn begin_saving(&mut self) {
        self.status = SaveStatus::Saving;
        self.revert_at = None;
    }

    pub fn finish_success(&mut self, now: Instant, hold: std::time::Duration) {
        self.status = SaveStatus::Success;
        self.revert_at = Some(now + hold);
    }

    pub fn finish_error(&mut self, kind: SaveErrorKind, now: Instant, hold: std::time::Duration) {
        self.status = SaveStatus::Error(kind);
        self.revert_at = Some(now + hold);
    }

    /// Applies a due revert. Returns true if the status changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.revert_at {
            Some(at) if now >= at => {
                self.status = SaveStatus::Idle;
                self.revert_at = None;
                true
            }
            _ => false,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.revert_at
    }
}

impl Default for StatusTracker {
    fn default() -> Self {
        Self::new()
    }
}
