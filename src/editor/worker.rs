//! Background worker driving debounce, retries, and status reverts.

use std::sync::Arc;

use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};

use crate::client::PersistenceClient;
use crate::collections::SyncCollection;
use crate::config::SyncConfig;
use crate::core::{Result, SyncError};
use crate::editor::execute_job;
use crate::editor::state::EditorState;

/// Handle to the autosave loop of one editor.
pub(crate) struct AutosaveWorker {
    stop_tx: Option<oneshot::Sender<()>>,
    join_handle: Option<JoinHandle<()>>,
}

impl AutosaveWorker {
    /// Signals the worker to stop and waits for it to finish.
    pub(crate) async fn stop(mut self) -> Result<()> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }

        if let Some(join_handle) = self.join_handle.take() {
            join_handle
                .await
                .map_err(|err| SyncError::Internal(format!("autosave worker join: {err}")))?;
        }
        Ok(())
    }
}

impl Drop for AutosaveWorker {
    fn drop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(join_handle) = self.join_handle.take() {
            join_handle.abort();
        }
    }
}

/// Spawns the autosave loop for an editor.
///
/// Each heartbeat runs one state tick under the lock; if the tick stages
/// a job, the network call runs with the lock released and the outcome is
/// applied afterwards.
pub(crate) fn spawn_autosave_worker<C: SyncCollection>(
    state: Arc<Mutex<EditorState<C>>>,
    client: Arc<dyn PersistenceClient>,
    config: SyncConfig,
) -> AutosaveWorker {
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
    let tick = config.worker_tick;

    let join_handle = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = &mut stop_rx => {
                    break;
                }
                _ = sleep(tick) => {
                    let job = {
                        let mut guard = state.lock().await;
                        guard.tick(Instant::now())
                    };

                    if let Some(job) = job {
                        let outcome =
                            execute_job::<C>(client.as_ref(), &config, &job, false).await;
                        let mut guard = state.lock().await;
                        guard.finish_persist(job, outcome.err().as_ref(), false, Instant::now());
                    }
                }
            }
        }
    });

    AutosaveWorker {
        stop_tx: Some(stop_tx),
        join_handle: Some(join_handle),
    }
}
