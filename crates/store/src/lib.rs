pub mod config;
pub mod engine;
pub mod identity;
pub mod io;
pub mod watch;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{StoreConfig, WriteMode};
pub use engine::GameDatabaseStore;
pub use identity::{IdSource, RandomIdSource};
pub use io::{DatabaseIo, FsDatabaseIo};
pub use watch::{spawn_debounced_reload, ChangeWatcher, NotifyWatcher, WatchGuard, WatchHandle};
