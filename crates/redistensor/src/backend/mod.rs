//! Tensor backend trait and implementations
//!
//! A `TensorBackend` splits a tensor into its record triple on `set` and
//! reassembles it on `get`. The two backends share the wire format but differ
//! in how failures on the read path are reported:
//!
//! | Situation               | `FsBackend`   | `KvBackend`    |
//! |-------------------------|---------------|----------------|
//! | `_tensor` record absent | `Read`        | `NotFound`     |
//! | unknown dtype name      | `Read`        | `UnknownDtype` |
//! | anything else           | `Read`        | `Read`         |

mod fs;
mod kv;

pub use fs::FsBackend;
pub use kv::{KvBackend, RedisBackend};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::codec::{self, DEFAULT_PATTERN, RecordKind};
use crate::config::BackendConfig;
use crate::error::{TensorError, TensorResult};
use crate::store::RecordStore;
use crate::tensor::Tensor;

/// Core tensor backend trait
#[async_trait]
pub trait TensorBackend: Send + Sync {
    /// Store `tensor` under `key`, overwriting any previous triple
    async fn set(&self, key: &str, tensor: &Tensor) -> TensorResult<()>;

    /// Load the tensor stored under `key`
    async fn get(&self, key: &str) -> TensorResult<Tensor>;

    /// Logical keys whose `_tensor` record name matches `pattern`
    async fn names_matching(&self, pattern: &str) -> TensorResult<Vec<String>>;

    /// All logical keys
    async fn names(&self) -> TensorResult<Vec<String>> {
        self.names_matching(DEFAULT_PATTERN).await
    }

    /// Shape of the tensor under `key`
    ///
    /// Loads the whole tensor so that a missing or corrupt data or dtype
    /// record fails exactly as [`TensorBackend::get`] would.
    async fn shape(&self, key: &str) -> TensorResult<Vec<usize>> {
        let tensor = self.get(key).await?;
        let (_, shape, _) = tensor.into_parts();
        Ok(shape)
    }

    /// Human-readable location, used in logs
    fn describe(&self) -> String;
}

/// Open the backend described by `config`
pub async fn open(config: &BackendConfig) -> TensorResult<Box<dyn TensorBackend>> {
    match config {
        BackendConfig::Directory(dir) => Ok(Box::new(FsBackend::open(dir.clone()).await?)),
        BackendConfig::Redis(redis) => Ok(Box::new(RedisBackend::connect(redis).await?)),
    }
}

/// Encode the record triple for `key`, in write order
pub(crate) fn encode_triple(key: &str, tensor: &Tensor) -> Vec<(String, Bytes)> {
    RecordKind::WRITE_ORDER
        .iter()
        .map(|kind| {
            let payload = match kind {
                RecordKind::Tensor => tensor.data().clone(),
                RecordKind::Shape => Bytes::from(codec::encode_shape(tensor.shape())),
                RecordKind::Dtype => Bytes::from_static(tensor.dtype().name().as_bytes()),
            };
            (kind.record_name(key), payload)
        })
        .collect()
}

/// Write the record triple for `key`: data, then shape, then dtype
pub(crate) async fn write_triple<S: RecordStore>(
    store: &S,
    key: &str,
    tensor: &Tensor,
) -> TensorResult<()> {
    store
        .put_many(encode_triple(key, tensor))
        .await
        .map_err(|e| TensorError::write(key, e))?;

    debug!(
        key,
        dtype = %tensor.dtype(),
        shape = %codec::encode_shape(tensor.shape()),
        size = tensor.size_bytes(),
        store = %store.describe(),
        "Stored tensor"
    );
    Ok(())
}

/// Logical keys of `_tensor` records matching `pattern`
pub(crate) async fn list_keys<S: RecordStore>(store: &S, pattern: &str) -> TensorResult<Vec<String>> {
    let records = store.list(pattern).await.map_err(|source| TensorError::List {
        pattern: pattern.to_string(),
        source,
    })?;
    Ok(codec::logical_keys(records))
}

/// Fetch a text record that must exist
pub(crate) async fn read_text<S: RecordStore>(store: &S, name: &str) -> TensorResult<String> {
    decode_text(name, store.get(name).await?)
}

/// Text of a fetched record that must exist
pub(crate) fn decode_text(name: &str, value: Option<Bytes>) -> TensorResult<String> {
    let bytes = value.ok_or_else(|| TensorError::MissingRecord(name.to_string()))?;
    String::from_utf8(bytes.to_vec()).map_err(|_| TensorError::Encoding(name.to_string()))
}
