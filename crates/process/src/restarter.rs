use std::sync::Arc;
use std::time::Duration;

use adrenaline_common::{AdrenalineProcess, RestartError};
use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{same_executable, ProcessEntry, ProcessTable, RestartConfig};

/// Kills every running Adrenaline instance installed at the configured path,
/// launches a fresh one and waits for its window.
///
/// Process table calls block (a full process scan, window enumeration), so
/// they run on the blocking pool.
pub struct Restarter<T> {
    config: RestartConfig,
    table: Arc<T>,
    cancel: CancellationToken,
}

impl<T: ProcessTable + 'static> Restarter<T> {
    pub fn new(config: RestartConfig, table: T) -> Self {
        Self {
            config,
            table: Arc::new(table),
            cancel: CancellationToken::new(),
        }
    }

    /// Abort waits with [`RestartError::Cancelled`] once `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &RestartConfig {
        &self.config
    }

    fn is_ours(&self, entry: &ProcessEntry) -> bool {
        entry
            .exe
            .as_deref()
            .is_some_and(|exe| same_executable(exe, &self.config.executable_path))
    }

    async fn on_table<R, F>(&self, call: F) -> Result<R, RestartError>
    where
        R: Send + 'static,
        F: FnOnce(&T) -> R + Send + 'static,
    {
        let table = self.table.clone();
        match tokio::task::spawn_blocking(move || call(&table)).await {
            Ok(value) => Ok(value),
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => Err(RestartError::Cancelled),
        }
    }

    async fn find(&self) -> Result<Vec<ProcessEntry>, RestartError> {
        let name = self.config.process_name.clone();
        self.on_table(move |table| table.find(&name)).await
    }

    async fn stop_running(&self) -> Result<(), RestartError> {
        for entry in self.find().await? {
            if !self.is_ours(&entry) {
                debug!(pid = entry.pid, exe = ?entry.exe, "skipping process from another location");
                continue;
            }

            let pid = entry.pid;
            info!(pid, "stopping Adrenaline");
            self.on_table(move |table| table.kill(pid))
                .await?
                .map_err(|source| RestartError::Kill { pid, source })?;

            let deadline = Instant::now() + self.config.timeout;
            while self.on_table(move |table| table.is_running(pid)).await? {
                if Instant::now() >= deadline {
                    return Err(RestartError::ExitTimeout { pid });
                }
                self.pause(self.config.poll_interval).await?;
            }
        }
        Ok(())
    }

    async fn window_ready(&self) -> Result<bool, RestartError> {
        Ok(self
            .find()
            .await?
            .iter()
            .any(|entry| entry.has_window && self.is_ours(entry)))
    }

    async fn pause(&self, period: Duration) -> Result<(), RestartError> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(RestartError::Cancelled),
            _ = tokio::time::sleep(period) => Ok(()),
        }
    }
}

#[async_trait]
impl<T: ProcessTable + 'static> AdrenalineProcess for Restarter<T> {
    async fn restart(&self) -> Result<bool, RestartError> {
        self.stop_running().await?;

        let path = self.config.executable_path.clone();
        info!(path = %path.display(), "launching Adrenaline");
        let launch_path = path.clone();
        self.on_table(move |table| table.launch(&launch_path))
            .await?
            .map_err(|source| RestartError::Launch {
                path: path.display().to_string(),
                source,
            })?;

        let deadline = Instant::now() + self.config.timeout;
        loop {
            if self.window_ready().await? {
                info!("Adrenaline is back up");
                return Ok(true);
            }
            if Instant::now() >= deadline {
                warn!(timeout = ?self.config.timeout, "Adrenaline window did not appear");
                return Ok(false);
            }
            self.pause(self.config.poll_interval).await?;
        }
    }
}
