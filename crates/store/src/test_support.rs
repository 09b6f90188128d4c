use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use adrenaline_common::GameId;
use async_trait::async_trait;

use crate::identity::IdSource;
use crate::io::DatabaseIo;

/// In-memory database file that counts reads and writes.
#[derive(Default)]
pub struct MemoryIo {
    contents: Mutex<Option<Vec<u8>>>,
    fail_writes: Mutex<bool>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryIo {
    pub fn with_contents(contents: impl Into<Vec<u8>>) -> Self {
        let io = Self::default();
        io.set_contents(contents);
        io
    }

    /// A file that does not exist: every read fails with `NotFound`.
    pub fn missing() -> Self {
        Self::default()
    }

    pub fn set_contents(&self, contents: impl Into<Vec<u8>>) {
        *self.contents.lock().unwrap() = Some(contents.into());
    }

    pub fn contents(&self) -> Vec<u8> {
        self.contents.lock().unwrap().clone().unwrap_or_default()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.contents()).unwrap()
    }

    pub fn fail_writes(&self) {
        *self.fail_writes.lock().unwrap() = true;
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DatabaseIo for MemoryIo {
    async fn read(&self, _path: &Path) -> std::io::Result<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.contents
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound))
    }

    async fn write(&self, _path: &Path, contents: Vec<u8>) -> std::io::Result<()> {
        if *self.fail_writes.lock().unwrap() {
            return Err(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        *self.contents.lock().unwrap() = Some(contents);
        Ok(())
    }
}

/// Hands out a fixed sequence of identifiers, then random ones.
pub struct SequenceIdSource {
    ids: VecDeque<GameId>,
}

impl SequenceIdSource {
    pub fn new(ids: Vec<GameId>) -> Self {
        Self { ids: ids.into() }
    }
}

impl IdSource for SequenceIdSource {
    fn next_id(&mut self) -> GameId {
        self.ids.pop_front().unwrap_or_else(GameId::new_random)
    }
}
