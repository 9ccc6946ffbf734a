//! Key-value tensor backend

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use super::{TensorBackend, decode_text, list_keys, write_triple};
use crate::codec::{self, Dtype, RecordKind};
use crate::config::RedisConfig;
use crate::error::{TensorError, TensorResult};
use crate::store::{RecordStore, RedisStore};
use crate::tensor::Tensor;

/// Tensor backend over any flat key-value [`RecordStore`]
///
/// An absent `_tensor` record is reported as [`TensorError::NotFound`] and an
/// unrecognized dtype name as [`TensorError::UnknownDtype`]; every other read
/// failure is wrapped in [`TensorError::Read`].
#[derive(Debug, Clone)]
pub struct KvBackend<S> {
    store: S,
}

/// Backend on a Redis server
pub type RedisBackend = KvBackend<RedisStore>;

impl<S: RecordStore> KvBackend<S> {
    /// Wrap an already-open store
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Underlying record store
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl KvBackend<RedisStore> {
    /// Connect to the configured server
    pub async fn connect(config: &RedisConfig) -> TensorResult<Self> {
        let store = RedisStore::connect(config)
            .await
            .map_err(|source| TensorError::Init {
                target: config.address(),
                reason: "could not connect to redis".to_string(),
                source: Some(source),
            })?;
        Ok(Self::new(store))
    }
}

/// Assemble a tensor from its fetched dtype and shape records
fn decode_records(
    key: &str,
    data: Bytes,
    dtype: Option<Bytes>,
    shape: Option<Bytes>,
) -> TensorResult<Tensor> {
    let dtype_text = decode_text(&RecordKind::Dtype.record_name(key), dtype)?;
    let dtype = Dtype::from_name(&dtype_text)?;

    let shape_text = decode_text(&RecordKind::Shape.record_name(key), shape)?;
    let shape = codec::decode_shape(&shape_text)?;

    Tensor::reshape(dtype, shape, data)
}

#[async_trait]
impl<S: RecordStore> TensorBackend for KvBackend<S> {
    async fn set(&self, key: &str, tensor: &Tensor) -> TensorResult<()> {
        write_triple(&self.store, key, tensor).await
    }

    async fn get(&self, key: &str) -> TensorResult<Tensor> {
        // One multi-key read so the triple comes from a single write
        let names = [RecordKind::Tensor, RecordKind::Dtype, RecordKind::Shape]
            .map(|kind| kind.record_name(key));
        let values = self
            .store
            .get_many(&names)
            .await
            .map_err(|e| TensorError::read(key, e.into()))?;

        let mut values = values.into_iter();
        let (data, dtype, shape) = (
            values.next().flatten(),
            values.next().flatten(),
            values.next().flatten(),
        );
        let data = data.ok_or_else(|| TensorError::NotFound(key.to_string()))?;

        let tensor = decode_records(key, data, dtype, shape).map_err(|e| match e {
            TensorError::UnknownDtype(_) => e,
            other => TensorError::read(key, other),
        })?;

        debug!(key, dtype = %tensor.dtype(), shape = ?tensor.shape(), store = %self.store.describe(), "Loaded tensor");
        Ok(tensor)
    }

    async fn names_matching(&self, pattern: &str) -> TensorResult<Vec<String>> {
        list_keys(&self.store, pattern).await
    }

    fn describe(&self) -> String {
        self.store.describe()
    }
}
