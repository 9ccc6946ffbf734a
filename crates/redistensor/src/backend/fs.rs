//! Filesystem tensor backend

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, info};

use super::{TensorBackend, list_keys, read_text, write_triple};
use crate::codec::{self, Dtype, RecordKind};
use crate::config::{DirectoryConfig, DtypeNames};
use crate::error::{TensorError, TensorResult};
use crate::store::{DirStore, RecordStore};
use crate::tensor::Tensor;

/// Tensor backend over a directory, one file per record
///
/// Every read failure, including a tensor that was never stored, is reported
/// as [`TensorError::Read`] with the cause attached.
#[derive(Debug, Clone)]
pub struct FsBackend {
    store: DirStore,
    dtype_names: DtypeNames,
}

impl FsBackend {
    /// Open the configured directory
    ///
    /// Fails with [`TensorError::Init`] if the directory does not exist,
    /// unless `create_missing` is set.
    pub async fn open(config: DirectoryConfig) -> TensorResult<Self> {
        let result = if config.create_missing {
            DirStore::create(&config.path).await
        } else {
            DirStore::open(&config.path).await
        };
        let store = result.map_err(|source| TensorError::Init {
            target: config.path.display().to_string(),
            reason: "directory is not accessible".to_string(),
            source: Some(source),
        })?;

        info!(root = %store.root().display(), dtype_names = ?config.dtype_names, "Opened filesystem backend");
        Ok(Self {
            store,
            dtype_names: config.dtype_names,
        })
    }

    /// Directory holding the records
    pub fn root(&self) -> &Path {
        self.store.root()
    }

    fn parse_dtype(&self, name: &str) -> TensorResult<Dtype> {
        match self.dtype_names {
            DtypeNames::Exact => Dtype::from_name(name),
            DtypeNames::Lenient => Dtype::parse_lenient(name),
        }
    }

    async fn read_triple(&self, key: &str) -> TensorResult<Tensor> {
        let dtype_text = read_text(&self.store, &RecordKind::Dtype.record_name(key)).await?;
        let dtype = self.parse_dtype(&dtype_text)?;

        let tensor_name = RecordKind::Tensor.record_name(key);
        let data = self
            .store
            .get(&tensor_name)
            .await?
            .ok_or(TensorError::MissingRecord(tensor_name))?;

        let shape_text = read_text(&self.store, &RecordKind::Shape.record_name(key)).await?;
        let shape = codec::decode_shape(&shape_text)?;

        Tensor::reshape(dtype, shape, data)
    }
}

#[async_trait]
impl TensorBackend for FsBackend {
    async fn set(&self, key: &str, tensor: &Tensor) -> TensorResult<()> {
        write_triple(&self.store, key, tensor).await
    }

    async fn get(&self, key: &str) -> TensorResult<Tensor> {
        let tensor = self
            .read_triple(key)
            .await
            .map_err(|e| TensorError::read(key, e))?;
        debug!(key, dtype = %tensor.dtype(), shape = ?tensor.shape(), "Loaded tensor");
        Ok(tensor)
    }

    async fn names_matching(&self, pattern: &str) -> TensorResult<Vec<String>> {
        list_keys(&self.store, pattern).await
    }

    fn describe(&self) -> String {
        self.store.describe()
    }
}
