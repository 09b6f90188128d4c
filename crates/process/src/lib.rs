//! Restart control over the Adrenaline (Radeon Software) process.

pub mod restarter;
pub mod table;

use std::path::{Path, PathBuf};
use std::time::Duration;

pub use restarter::Restarter;
pub use table::SysinfoProcessTable;

/// Where Adrenaline lives and how long to wait for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RestartConfig {
    pub executable_path: PathBuf,
    /// Process name without extension.
    pub process_name: String,
    pub poll_interval: Duration,
    /// Applies to each wait: old instances exiting, then the new window.
    pub timeout: Duration,
}

impl Default for RestartConfig {
    fn default() -> Self {
        Self {
            executable_path: PathBuf::from(r"C:\Program Files\AMD\CNext\CNext\RadeonSoftware.exe"),
            process_name: "RadeonSoftware".to_string(),
            poll_interval: Duration::from_millis(500),
            timeout: Duration::from_secs(30),
        }
    }
}

/// A running process as seen by a [`ProcessTable`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    /// Full executable path, when the OS lets us read it.
    pub exe: Option<PathBuf>,
    /// Whether the process owns a visible top-level window.
    pub has_window: bool,
}

/// The operating system's process list.
pub trait ProcessTable: Send + Sync {
    /// Processes whose name (extension ignored) equals `name`, ignoring case.
    fn find(&self, name: &str) -> Vec<ProcessEntry>;

    /// Ask `pid` to terminate. A process that is already gone is not an error.
    fn kill(&self, pid: u32) -> std::io::Result<()>;

    fn is_running(&self, pid: u32) -> bool;

    /// Start `path` detached.
    fn launch(&self, path: &Path) -> std::io::Result<()>;
}

/// Windows paths compare without regard to case.
pub fn same_executable(a: &Path, b: &Path) -> bool {
    a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase()
}
