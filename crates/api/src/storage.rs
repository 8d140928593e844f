//! Local storage for downloaded model files.
//!
//! All assets live directly under one root directory. Files are created
//! once and never rewritten; every client-supplied name is validated
//! before it is joined onto the root.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use meshforge_core::error::CoreError;
use meshforge_core::naming::validate_asset_filename;
use tokio::io::AsyncWriteExt;

/// Errors from asset reads and writes.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The filename could escape the asset root.
    #[error(transparent)]
    InvalidName(#[from] CoreError),

    /// No regular file by that name exists under the root.
    #[error("Asset not found: {0}")]
    NotFound(String),

    /// Any other filesystem failure.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Flat directory of generated model files.
#[derive(Debug, Clone)]
pub struct AssetStorage {
    root: PathBuf,
}

impl AssetStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if it does not exist yet.
    pub async fn ensure_root(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StorageError::Io {
                path: self.root.clone(),
                source,
            })
    }

    /// Map a client-supplied filename to a path inside the root.
    pub fn resolve(&self, filename: &str) -> Result<PathBuf, StorageError> {
        validate_asset_filename(filename)?;
        Ok(self.root.join(filename))
    }

    /// Write a new asset. Fails if a file by that name already exists.
    ///
    /// Bytes go to a hidden staging file first and are renamed into place
    /// once synced, so a served name never points at a partial model.
    pub async fn write_new(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, StorageError> {
        let path = self.resolve(filename)?;
        let io_err = |source| StorageError::Io {
            path: path.clone(),
            source,
        };

        if tokio::fs::try_exists(&path).await.map_err(io_err)? {
            return Err(io_err(std::io::Error::new(
                ErrorKind::AlreadyExists,
                "asset already exists",
            )));
        }

        let staging = self.root.join(staging_name(filename));
        let written = match write_synced(&staging, bytes).await {
            Ok(()) => tokio::fs::rename(&staging, &path).await.map_err(io_err),
            Err(source) => Err(StorageError::Io {
                path: staging.clone(),
                source,
            }),
        };

        if written.is_err() {
            if let Err(e) = tokio::fs::remove_file(&staging).await {
                if e.kind() != ErrorKind::NotFound {
                    tracing::warn!(path = %staging.display(), error = %e, "Failed to remove staging file");
                }
            }
        }

        written.map(|()| path)
    }

    /// Read a whole asset into memory.
    pub async fn read(&self, filename: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(filename)?;

        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(StorageError::NotFound(filename.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(filename.to_string()))
            }
            Err(source) => return Err(StorageError::Io { path, source }),
        }

        tokio::fs::read(&path)
            .await
            .map_err(|source| StorageError::Io { path, source })
    }
}

/// Hidden sibling used while an asset is being written. The leading dot
/// keeps it out of reach of [`AssetStorage::read`].
fn staging_name(filename: &str) -> String {
    format!(".{filename}.part")
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[tokio::test]
    async fn write_then_read_round_trips_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let storage = AssetStorage::new(dir.path());

        let path = storage.write_new("job_1_preview.glb", b"glb").await.unwrap();

        assert_eq!(path, dir.path().join("job_1_preview.glb"));
        assert_eq!(storage.read("job_1_preview.glb").await.unwrap(), b"glb");
    }

    #[tokio::test]
    async fn existing_asset_is_never_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let storage = AssetStorage::new(dir.path());
        storage.write_new("a.glb", b"first").await.unwrap();

        assert_matches!(
            storage.write_new("a.glb", b"second").await,
            Err(StorageError::Io { .. })
        );
        assert_eq!(storage.read("a.glb").await.unwrap(), b"first");
    }

    #[tokio::test]
    async fn successful_write_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = AssetStorage::new(dir.path());

        storage.write_new("job_1_refined.glb", b"glb").await.unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["job_1_refined.glb".to_string()]);
    }

    #[tokio::test]
    async fn interrupted_write_is_never_served() {
        let dir = tempfile::tempdir().unwrap();
        let storage = AssetStorage::new(dir.path());
        // What an aborted write leaves behind.
        std::fs::write(dir.path().join(".job_1_preview.glb.part"), b"gl").unwrap();

        assert_matches!(
            storage.read("job_1_preview.glb").await,
            Err(StorageError::NotFound(_))
        );
        assert_matches!(
            storage.read(".job_1_preview.glb.part").await,
            Err(StorageError::InvalidName(_))
        );

        // A later write replaces the stale staging file.
        storage.write_new("job_1_preview.glb", b"glb-full").await.unwrap();
        assert_eq!(storage.read("job_1_preview.glb").await.unwrap(), b"glb-full");
        assert!(!dir.path().join(".job_1_preview.glb.part").exists());
    }

    #[tokio::test]
    async fn failed_write_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let storage = AssetStorage::new(dir.path().join("missing-root"));

        assert_matches!(
            storage.write_new("job_1_preview.glb", b"glb").await,
            Err(StorageError::Io { .. })
        );
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn missing_asset_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = AssetStorage::new(dir.path());

        assert_matches!(storage.read("nope.glb").await, Err(StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn directories_are_not_served() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        let storage = AssetStorage::new(dir.path());

        assert_matches!(storage.read("sub").await, Err(StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn traversal_rejected_even_when_target_exists() {
        let outer = tempfile::tempdir().unwrap();
        std::fs::write(outer.path().join("secret.txt"), b"top secret").unwrap();
        let root = outer.path().join("assets");
        std::fs::create_dir(&root).unwrap();
        let storage = AssetStorage::new(&root);

        assert_matches!(
            storage.read("../secret.txt").await,
            Err(StorageError::InvalidName(CoreError::Validation(_)))
        );
        assert_matches!(
            storage.write_new("../evil.glb", b"x").await,
            Err(StorageError::InvalidName(_))
        );
        assert!(!outer.path().join("evil.glb").exists());
    }

    #[tokio::test]
    async fn ensure_root_creates_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let storage = AssetStorage::new(dir.path().join("a").join("b"));

        storage.ensure_root().await.unwrap();

        assert!(storage.root().is_dir());
    }
}
