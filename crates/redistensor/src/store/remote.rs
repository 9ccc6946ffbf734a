//! Redis record store

use std::io::{Error as IoError, ErrorKind};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use tracing::{debug, info, trace};

use super::{RecordStore, StoreResult};
use crate::config::RedisConfig;

/// Record store on a Redis server
///
/// The connection is established eagerly in [`RedisStore::connect`] and held
/// for the lifetime of the store; clones share it.
#[derive(Clone)]
pub struct RedisStore {
    connection: MultiplexedConnection,
    address: String,
    atomic_writes: bool,
}

impl RedisStore {
    /// Connect, authenticate and select the configured database
    pub async fn connect(config: &RedisConfig) -> StoreResult<Self> {
        let address = config.address();
        let info = ConnectionInfo {
            addr: ConnectionAddr::Tcp(config.host.clone(), config.port),
            redis: RedisConnectionInfo {
                db: config.db,
                password: config.password.clone().filter(|p| !p.is_empty()),
                ..Default::default()
            },
        };
        let client = Client::open(info)?;

        let timeout = Duration::from_millis(config.connect_timeout_ms);
        let mut connection = tokio::time::timeout(timeout, client.get_multiplexed_async_connection())
            .await
            .map_err(|_| {
                IoError::new(
                    ErrorKind::TimedOut,
                    format!("connecting to {address} timed out after {timeout:?}"),
                )
            })??;

        let pong: String = redis::cmd("PING").query_async(&mut connection).await?;
        debug!(%address, reply = %pong, "Redis connection verified");
        info!(%address, db = config.db, atomic_writes = config.atomic_writes, "Connected to redis");

        Ok(Self {
            connection,
            address,
            atomic_writes: config.atomic_writes,
        })
    }

    /// Server address as `host:port`
    pub fn address(&self) -> &str {
        &self.address
    }
}

/// Keep the key names that are valid UTF-8
///
/// A lossy conversion would yield a name that addresses no record.
fn utf8_names(raw_names: Vec<Vec<u8>>) -> Vec<String> {
    raw_names
        .into_iter()
        .filter_map(|raw| match String::from_utf8(raw) {
            Ok(name) => Some(name),
            Err(e) => {
                trace!(key = ?e.as_bytes(), "Skipping non UTF-8 key name");
                None
            }
        })
        .collect()
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("address", &self.address)
            .field("atomic_writes", &self.atomic_writes)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RecordStore for RedisStore {
    async fn put(&self, name: &str, payload: Bytes) -> StoreResult<()> {
        trace!(record = name, size = payload.len(), "SET");
        let mut con = self.connection.clone();
        let () = con.set(name, &payload[..]).await?;
        Ok(())
    }

    async fn get(&self, name: &str) -> StoreResult<Option<Bytes>> {
        trace!(record = name, "GET");
        let mut con = self.connection.clone();
        let value: Option<Vec<u8>> = con.get(name).await?;
        Ok(value.map(Bytes::from))
    }

    async fn list(&self, pattern: &str) -> StoreResult<Vec<String>> {
        trace!(pattern, "KEYS");
        let mut con = self.connection.clone();
        let raw_names: Vec<Vec<u8>> = con.keys(pattern).await?;
        Ok(utf8_names(raw_names))
    }

    async fn get_many(&self, names: &[String]) -> StoreResult<Vec<Option<Bytes>>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        trace!(count = names.len(), "MGET");
        let mut con = self.connection.clone();
        let values: Vec<Option<Vec<u8>>> = redis::cmd("MGET").arg(names).query_async(&mut con).await?;
        Ok(values.into_iter().map(|value| value.map(Bytes::from)).collect())
    }

    async fn put_many(&self, records: Vec<(String, Bytes)>) -> StoreResult<()> {
        if !self.atomic_writes {
            for (name, payload) in records {
                self.put(&name, payload).await?;
            }
            return Ok(());
        }

        trace!(count = records.len(), "MULTI/EXEC SET");
        let mut pipe = redis::pipe();
        pipe.atomic();
        for (name, payload) in &records {
            pipe.set(name, &payload[..]).ignore();
        }
        let mut con = self.connection.clone();
        let () = pipe.query_async(&mut con).await?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("redis://{}", self.address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_names_skips_invalid() {
        let raw = vec![
            b"w_tensor".to_vec(),
            vec![0xff, 0xfe, b'_', b't'],
            "\u{e9}t\u{e9}_tensor".as_bytes().to_vec(),
        ];
        assert_eq!(utf8_names(raw), vec!["w_tensor", "\u{e9}t\u{e9}_tensor"]);
    }
}
