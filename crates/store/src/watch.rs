//! File-change reaction for the game database.
//!
//! Adrenaline rewrites `gmdb.blb` several times in quick succession during a
//! single logical update, so reloading on every OS notification would read
//! half-written states. Notifications are coalesced instead: each one
//! restarts a quiet period, and the store reloads once the file has been
//! quiet for that long.

use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use adrenaline_common::StoreError;
use notify::{EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::engine::GameDatabaseStore;
use crate::io::parent_dir;

/// Keeps an OS watch alive. Dropping it stops notifications.
pub type WatchGuard = Box<dyn Send>;

/// Source of "file changed" notifications.
pub trait ChangeWatcher: Send + Sync {
    /// Start watching `path`, sending `()` on `changes` for every change.
    fn watch(&self, path: &Path, changes: mpsc::UnboundedSender<()>) -> Result<WatchGuard, StoreError>;
}

/// OS file watching through `notify`.
///
/// Watches the parent directory non-recursively and forwards create and
/// modify events whose path names the database file.
#[derive(Clone, Copy, Debug, Default)]
pub struct NotifyWatcher;

impl ChangeWatcher for NotifyWatcher {
    fn watch(&self, path: &Path, changes: mpsc::UnboundedSender<()>) -> Result<WatchGuard, StoreError> {
        let file_name: OsString = path
            .file_name()
            .ok_or_else(|| StoreError::Watch(format!("not a file path: {}", path.display())))?
            .to_os_string();
        let dir = parent_dir(path);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
            Ok(event) => {
                let relevant = matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
                    && event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == Some(file_name.as_os_str()));
                if relevant {
                    let _ = changes.send(());
                }
            }
            Err(e) => warn!(error = %e, "file watch error"),
        })
        .map_err(|e| StoreError::Watch(e.to_string()))?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| StoreError::Watch(format!("failed to watch {}: {e}", dir.display())))?;

        debug!(dir = %dir.display(), "watching for database changes");
        Ok(Box::new(watcher))
    }
}

/// A running watch: the OS watch plus the debounce task.
pub struct WatchHandle {
    _guard: WatchGuard,
    task: JoinHandle<()>,
    cancel: CancellationToken,
}

impl WatchHandle {
    /// Stop reacting to changes and wait for the debounce task to finish.
    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}

impl GameDatabaseStore {
    /// Reload whenever `watcher` reports a change, debounced by the
    /// configured quiet period.
    pub fn watch(
        self: &Arc<Self>,
        watcher: &dyn ChangeWatcher,
        cancel: CancellationToken,
    ) -> Result<WatchHandle, StoreError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let guard = watcher.watch(self.path(), tx)?;
        let task = spawn_debounced_reload(self.clone(), rx, self.config().debounce, cancel.clone());
        Ok(WatchHandle {
            _guard: guard,
            task,
            cancel,
        })
    }
}

/// Coalesce notifications from `changes` into reloads of `store`.
///
/// The first notification opens a quiet period of `quiet`; each further
/// notification restarts it. When it elapses the store reloads once.
/// Notifications that arrive while the reload runs are dropped. The task
/// ends when `cancel` fires or every sender is gone.
pub fn spawn_debounced_reload(
    store: Arc<GameDatabaseStore>,
    mut changes: mpsc::UnboundedReceiver<()>,
    quiet: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                change = changes.recv() => if change.is_none() { return },
            }

            let mut deadline = Instant::now() + quiet;
            debug!(?quiet, "database change detected, waiting for writes to settle");
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = sleep_until(deadline) => break,
                    change = changes.recv() => match change {
                        Some(()) => deadline = Instant::now() + quiet,
                        None => {
                            sleep_until(deadline).await;
                            break;
                        }
                    },
                }
            }

            store.reload().await;
            while changes.try_recv().is_ok() {}
        }
    })
}
