//! Directory record store
//!
//! One file per record, directly under the root:
//! ```text
//! root/
//! ├── weights_tensor    # raw bytes
//! ├── weights_shape     # "(2,3)"
//! └── weights_dtype     # "float32"
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, trace};

use super::{RecordStore, StoreResult};
use crate::error::StoreError;
use crate::pattern;

/// Filesystem-backed record store
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Open an existing directory
    pub async fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref();
        let meta = fs::metadata(root).await?;
        if !meta.is_dir() {
            return Err(StoreError::Io(std::io::Error::new(
                ErrorKind::NotADirectory,
                format!("{} is not a directory", root.display()),
            )));
        }

        debug!(root = %root.display(), "Opened directory store");
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Create the directory (and parents) if needed, then open it
    pub async fn create(root: impl AsRef<Path>) -> StoreResult<Self> {
        fs::create_dir_all(root.as_ref()).await?;
        Self::open(root).await
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a record, rejecting names that would escape the root
    fn record_path(&self, name: &str) -> StoreResult<PathBuf> {
        let invalid = name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(['/', '\\', '\0']);
        if invalid {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl RecordStore for DirStore {
    async fn put(&self, name: &str, payload: Bytes) -> StoreResult<()> {
        let path = self.record_path(name)?;
        trace!(path = %path.display(), size = payload.len(), "Writing record");

        let mut file = fs::File::create(&path).await?;
        file.write_all(&payload).await?;
        file.flush().await?;
        Ok(())
    }

    async fn get(&self, name: &str) -> StoreResult<Option<Bytes>> {
        let path = self.record_path(name)?;
        trace!(path = %path.display(), "Reading record");

        match fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;

        while let Some(entry) = entries.next_entry().await? {
            let Ok(file_type) = entry.file_type().await else {
                continue;
            };
            if !file_type.is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                trace!(path = %entry.path().display(), "Skipping non UTF-8 file name");
                continue;
            };
            if pattern::matches(pattern, &name) {
                names.push(name);
            }
        }

        Ok(names)
    }

    fn describe(&self) -> String {
        format!("dir:{}", self.root.display())
    }
}
