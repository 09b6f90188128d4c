use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::config::WriteMode;

/// File access used by the store. Swapped for an in-memory double in tests.
#[async_trait]
pub trait DatabaseIo: Send + Sync {
    /// Read the whole file. Must not block other writers of the file.
    async fn read(&self, path: &Path) -> std::io::Result<Vec<u8>>;

    /// Replace the whole file with `contents`.
    async fn write(&self, path: &Path, contents: Vec<u8>) -> std::io::Result<()>;
}

/// Real file system access. Blocking calls run on the blocking pool.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsDatabaseIo {
    write_mode: WriteMode,
}

impl FsDatabaseIo {
    pub fn new(write_mode: WriteMode) -> Self {
        Self { write_mode }
    }
}

#[async_trait]
impl DatabaseIo for FsDatabaseIo {
    async fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || read_shared(&path))
            .await
            .map_err(std::io::Error::other)?
    }

    async fn write(&self, path: &Path, contents: Vec<u8>) -> std::io::Result<()> {
        let path = path.to_path_buf();
        let mode = self.write_mode;
        tokio::task::spawn_blocking(move || match mode {
            WriteMode::Atomic => write_atomic(&path, &contents),
            WriteMode::InPlace => write_in_place(&path, &contents),
        })
        .await
        .map_err(std::io::Error::other)?
    }
}

/// Open for reading while letting Adrenaline keep writing.
fn read_shared(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut options = OpenOptions::new();
    options.read(true);

    #[cfg(windows)]
    {
        use std::os::windows::fs::OpenOptionsExt;
        const FILE_SHARE_READ: u32 = 0x1;
        const FILE_SHARE_WRITE: u32 = 0x2;
        const FILE_SHARE_DELETE: u32 = 0x4;
        options.share_mode(FILE_SHARE_READ | FILE_SHARE_WRITE | FILE_SHARE_DELETE);
    }

    let mut file = options.open(path)?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(buf)
}

fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = parent_dir(path);
    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    debug!(path = %path.display(), bytes = contents.len(), "replaced database file");
    Ok(())
}

fn write_in_place(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file: File = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    file.write_all(contents)?;
    file.sync_all()?;
    debug!(path = %path.display(), bytes = contents.len(), "overwrote database file");
    Ok(())
}

/// Directory holding `path`; `.` for a bare file name.
pub(crate) fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_read_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let io = FsDatabaseIo::default();
        let err = io.read(&dir.path().join("gmdb.blb")).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_atomic_write_replaces_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gmdb.blb");
        std::fs::write(&path, b"old contents that are longer").unwrap();

        let io = FsDatabaseIo::new(WriteMode::Atomic);
        io.write(&path, b"new".to_vec()).await.unwrap();

        assert_eq!(io.read(&path).await.unwrap(), b"new");
        // no temp files left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_in_place_write_truncates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gmdb.blb");
        std::fs::write(&path, b"old contents that are longer").unwrap();

        let io = FsDatabaseIo::new(WriteMode::InPlace);
        io.write(&path, b"new".to_vec()).await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_read_while_open_for_writing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gmdb.blb");
        std::fs::write(&path, b"{}").unwrap();

        let _writer = OpenOptions::new().write(true).open(&path).unwrap();
        let io = FsDatabaseIo::default();
        assert_eq!(io.read(&path).await.unwrap(), b"{}");
    }

    #[test]
    fn test_parent_dir_of_bare_file_name() {
        assert_eq!(parent_dir(Path::new("gmdb.blb")), PathBuf::from("."));
        assert_eq!(parent_dir(Path::new("/a/gmdb.blb")), PathBuf::from("/a"));
    }
}
