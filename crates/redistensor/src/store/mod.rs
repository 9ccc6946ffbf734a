//! Record store trait and implementations
//!
//! A `RecordStore` is the byte-addressable medium beneath a tensor backend. It
//! knows nothing about tensors: it stores named payloads, returns them (or
//! reports them absent) and lists names matching a glob pattern.

mod dir;
mod memory;
mod remote;

pub use dir::DirStore;
pub use memory::MemoryStore;
pub use remote::RedisStore;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreError;

/// Result type for record store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Core record store trait
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// Create or overwrite a record
    async fn put(&self, name: &str, payload: Bytes) -> StoreResult<()>;

    /// Fetch a record, `None` if it does not exist
    async fn get(&self, name: &str) -> StoreResult<Option<Bytes>>;

    /// Names of all records matching a glob pattern, in no particular order
    async fn list(&self, pattern: &str) -> StoreResult<Vec<String>>;

    /// Write several records
    ///
    /// The default issues one `put` per record in order and stops at the
    /// first failure, leaving earlier records in place.
    async fn put_many(&self, records: Vec<(String, Bytes)>) -> StoreResult<()> {
        for (name, payload) in records {
            self.put(&name, payload).await?;
        }
        Ok(())
    }

    /// Fetch several records, one slot per name in the same order
    ///
    /// The default issues one `get` per name, so records may come from
    /// different writes; stores with a multi-key read override it.
    async fn get_many(&self, names: &[String]) -> StoreResult<Vec<Option<Bytes>>> {
        let mut values = Vec::with_capacity(names.len());
        for name in names {
            values.push(self.get(name).await?);
        }
        Ok(values)
    }

    /// Human-readable location, used in logs and errors
    fn describe(&self) -> String;
}
