use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use adrenaline_codec::{reader, writer, RawDocument};
use adrenaline_common::{
    AdrenalineProcess, GameDatabase, GameId, GameInfo, StoreError, StoreEvent,
};
use arc_swap::ArcSwap;
use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

use crate::config::StoreConfig;
use crate::identity::{self, IdSource};
use crate::io::DatabaseIo;

const EVENT_CAPACITY: usize = 64;

/// Owner of the Adrenaline game database file.
///
/// Holds the last successfully loaded snapshot of visible games and the
/// restart-required flag, and serialises add/save against the file.
///
/// The snapshot is replaced wholesale by a single pointer swap, so readers
/// never see a partially built list. Mutations take `mutation`, which also
/// guards the identifier source, so two concurrent adds cannot both read the
/// same file contents and lose one of the writes.
pub struct GameDatabaseStore {
    config: StoreConfig,
    io: Arc<dyn DatabaseIo>,
    games: ArcSwap<Vec<GameInfo>>,
    loaded: AtomicBool,
    restart_required: AtomicBool,
    mutation: Mutex<Box<dyn IdSource>>,
    events: broadcast::Sender<StoreEvent>,
}

impl GameDatabaseStore {
    /// Build a store without touching the file. The snapshot starts empty.
    pub fn new(config: StoreConfig, io: Arc<dyn DatabaseIo>, ids: Box<dyn IdSource>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            config,
            io,
            games: ArcSwap::from_pointee(Vec::new()),
            loaded: AtomicBool::new(false),
            restart_required: AtomicBool::new(false),
            mutation: Mutex::new(ids),
            events,
        }
    }

    /// Build a store and perform the initial load.
    pub async fn open(config: StoreConfig, io: Arc<dyn DatabaseIo>, ids: Box<dyn IdSource>) -> Self {
        let store = Self::new(config, io, ids);
        store.reload().await;
        store
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.config.database_path
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Whether at least one reload has succeeded.
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// Re-read the file and replace the snapshot.
    ///
    /// Failures are logged and leave the current snapshot in place. Returns
    /// whether the snapshot was replaced.
    pub async fn reload(&self) -> bool {
        match self.read_games().await {
            Ok(games) => {
                let count = games.len();
                self.games.store(Arc::new(games));
                self.loaded.store(true, Ordering::Release);
                debug!(path = %self.path().display(), games = count, "reloaded Adrenaline games data");
                self.notify(StoreEvent::GamesChanged);
                true
            }
            Err(err) => {
                error!(path = %self.path().display(), error = %err, "failed to update Adrenaline games data");
                false
            }
        }
    }

    async fn read_games(&self) -> Result<Vec<GameInfo>, StoreError> {
        let bytes = self.io.read(self.path()).await?;
        let decoded = reader::decode(&bytes)?;
        Ok(decoded
            .records
            .into_iter()
            .filter(|record| record.is_visible())
            .map(|record| record.into_game_info())
            .collect())
    }

    async fn read_document(&self) -> Result<RawDocument, StoreError> {
        let bytes = self.io.read(self.path()).await?;
        Ok(reader::decode_raw(&bytes)?)
    }

    async fn write_document(&self, document: RawDocument) -> Result<(), StoreError> {
        let bytes = writer::encode(document)?;
        self.io.write(self.path(), bytes).await?;
        Ok(())
    }

    /// Append a new game built from the default vendor template.
    ///
    /// The stored identifier is `game.id` unless that is nil or already in
    /// the file, in which case a fresh one is allocated. Returns the stored
    /// identifier.
    pub async fn add(&self, game: GameInfo) -> Result<GameId, StoreError> {
        let mut ids = self.mutation.lock().await;

        let mut document = self.read_document().await?;
        let existing = identity::existing_ids(document.games());
        let id = identity::allocate(&existing, game.id, &mut **ids, self.config.max_id_attempts)?;
        if id != game.id {
            debug!(requested = %game.id, allocated = %id, "replaced unusable game identifier");
        }

        document.games_mut().push(writer::new_record(&game, id));
        self.write_document(document).await?;

        info!(id = %id, title = %game.display_name, "added game to Adrenaline data file");
        self.set_restart_required(true);
        Ok(id)
    }

    /// Update the title, image, command line, executable, manual and hidden
    /// fields of the record with `game.id`. All other fields are untouched.
    pub async fn save(&self, game: GameInfo) -> Result<(), StoreError> {
        let _guard = self.mutation.lock().await;

        let mut document = self.read_document().await?;
        let record = writer::find_record_mut(document.games_mut(), game.id)
            .ok_or(StoreError::GameNotFound(game.id))?;
        writer::update_record(record, &game);
        self.write_document(document).await?;

        info!(id = %game.id, title = %game.display_name, "updated game in Adrenaline data file");
        self.set_restart_required(true);
        Ok(())
    }

    /// Restart Adrenaline so it picks up written changes.
    ///
    /// Never fails: errors are logged and reported as `false`. The
    /// restart-required flag is cleared whenever the relaunch went through,
    /// even if no window showed up in time: the new instance reads the file.
    pub async fn restart_adrenaline(&self, process: &dyn AdrenalineProcess) -> bool {
        match process.restart().await {
            Ok(true) => {
                info!("restarted Adrenaline");
                self.set_restart_required(false);
                true
            }
            Ok(false) => {
                warn!("Adrenaline did not show a window before the restart timeout");
                self.set_restart_required(false);
                false
            }
            Err(err) => {
                error!(error = %err, "something went wrong while trying to restart Adrenaline");
                false
            }
        }
    }

    pub fn games(&self) -> Arc<Vec<GameInfo>> {
        self.games.load_full()
    }

    pub fn is_restart_required(&self) -> bool {
        self.restart_required.load(Ordering::Acquire)
    }

    fn set_restart_required(&self, value: bool) {
        if self.restart_required.swap(value, Ordering::AcqRel) != value {
            self.notify(StoreEvent::RestartRequiredChanged);
        }
    }

    fn notify(&self, event: StoreEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl GameDatabase for GameDatabaseStore {
    fn games(&self) -> Arc<Vec<GameInfo>> {
        GameDatabaseStore::games(self)
    }

    fn is_restart_required(&self) -> bool {
        GameDatabaseStore::is_restart_required(self)
    }

    async fn add(&self, game: GameInfo) -> Result<GameId, StoreError> {
        GameDatabaseStore::add(self, game).await
    }

    async fn save(&self, game: GameInfo) -> Result<(), StoreError> {
        GameDatabaseStore::save(self, game).await
    }
}
