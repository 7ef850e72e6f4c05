use std::time::Duration;

/// Timing and policy knobs for a collection editor
///
/// The defaults match the tuned product behavior: quiet typists get one
/// coalesced write about 1.5s after their last keystroke, and the save
/// indicator clears itself a moment after showing the outcome.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Quiet period after the last mutation before an autosave fires
    pub debounce_window: Duration,

    /// How long the Success status is shown before reverting to Idle
    pub success_hold: Duration,

    /// How long the Error status is shown before reverting to Idle
    pub error_hold: Duration,

    /// Upper bound on any single persistence call
    pub persist_timeout: Duration,

    /// Poll interval of the background autosave worker
    pub worker_tick: Duration,

    /// Confirm a manual save with a whole-document write once the
    /// collection write succeeds
    pub confirm_document_on_manual_save: bool,
}

impl SyncConfig {
    /// Create a configuration with the product defaults
    pub fn new() -> Self {
        Self {
            debounce_window: Duration::from_millis(1500),
            success_hold: Duration::from_secs(2),
            error_hold: Duration::from_secs(5),
            persist_timeout: Duration::from_secs(30),
            worker_tick: Duration::from_millis(50),
            confirm_document_on_manual_save: false,
        }
    }

    /// Set the debounce window
    pub fn debounce_window(mut self, window: Duration) -> Self {
        self.debounce_window = window;
        self
    }

    /// Set the success hold
    pub fn success_hold(mut self, hold: Duration) -> Self {
        self.success_hold = hold;
        self
    }

    /// Set the error hold
    pub fn error_hold(mut self, hold: Duration) -> Self {
        self.error_hold = hold;
        self
    }

    /// Set the persist timeout
    pub fn persist_timeout(mut self, timeout: Duration) -> Self {
        self.persist_timeout = timeout;
        self
    }

    /// Set the worker tick
    pub fn worker_tick(mut self, tick: Duration) -> Self {
        self.worker_tick = tick;
        self
    }

    /// Enable the whole-document confirmation write on manual save
    pub fn confirm_document_on_manual_save(mut self, confirm: bool) -> Self {
        self.confirm_document_on_manual_save = confirm;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.debounce_window.is_zero() {
            return Err("debounce_window must be > 0".to_string());
        }

        if self.persist_timeout.is_zero() {
            return Err("persist_timeout must be > 0".to_string());
        }

        if self.worker_tick.is_zero() {
            return Err("worker_tick must be > 0".to_string());
        }

        if self.worker_tick > self.debounce_window {
            return Err("worker_tick cannot exceed debounce_window".to_string());
        }

        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}
