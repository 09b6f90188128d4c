use std::path::PathBuf;
use std::time::Duration;

/// Relative location of the vendor database under the local app-data dir.
pub const DATABASE_DIR: &[&str] = &["AMD", "CN"];
pub const DATABASE_FILE_NAME: &str = "gmdb.blb";

/// How mutations write the database back to disk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Write a sibling temp file, sync it, then rename it over the target.
    #[default]
    Atomic,
    /// Truncate and overwrite the target directly.
    InPlace,
}

/// Configuration for a [`crate::GameDatabaseStore`].
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Full path of `gmdb.blb`.
    pub database_path: PathBuf,
    /// Quiet period after the last change notification before reloading.
    pub debounce: Duration,
    pub write_mode: WriteMode,
    /// Upper bound on identifier draws when adding a game.
    pub max_id_attempts: usize,
}

impl StoreConfig {
    pub fn with_path(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            ..Self::default()
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            debounce: Duration::from_secs(1),
            write_mode: WriteMode::default(),
            max_id_attempts: 64,
        }
    }
}

/// `<local app data>/AMD/CN/gmdb.blb`, falling back to a relative path when
/// the platform has no local data directory.
pub fn default_database_path() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_default();
    path.extend(DATABASE_DIR);
    path.push(DATABASE_FILE_NAME);
    path
}
