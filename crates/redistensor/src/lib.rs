//! Tensor persistence over simple key-based stores
//!
//! This crate stores named multi-dimensional arrays as three independent
//! records (raw data, shape text, dtype text) in either a filesystem directory
//! or a Redis server, and reassembles typed, correctly shaped tensors from them.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Applications                              │
//! │            (training jobs, inference services, CLI)             │
//! └────────────────────────────┬────────────────────────────────────┘
//!                              │ set / get / names / shape
//! ┌────────────────────────────▼────────────────────────────────────┐
//! │                      TensorBackend                               │
//! │  ┌──────────────────────┐        ┌───────────────────────────┐  │
//! │  │      FsBackend       │        │   KvBackend (RedisBackend) │  │
//! │  │ (ReadError on miss,  │        │ (NotFound on miss, exact   │  │
//! │  │  lenient dtype names)│        │  dtype table)              │  │
//! │  └──────────┬───────────┘        └─────────────┬─────────────┘  │
//! │             │            codec                 │                │
//! │             │   shape text · dtype names · record names         │
//! └─────────────┼──────────────────────────────────┼────────────────┘
//!               │                                  │
//! ┌─────────────▼──────────────┐   ┌───────────────▼────────────────┐
//! │   DirStore (one file per   │   │ RedisStore (SET/GET/KEYS) or   │
//! │   record)                  │   │ MemoryStore                    │
//! └────────────────────────────┘   └────────────────────────────────┘
//! ```
//!
//! # Wire format
//!
//! For a logical key `K`:
//!
//! | Record     | Content                     | Encoding                      |
//! |------------|-----------------------------|-------------------------------|
//! | `K_tensor` | flat element buffer         | native-endian dump, no header |
//! | `K_shape`  | dimension sizes             | `(2,3)`, `(5,)`, `()`         |
//! | `K_dtype`  | element kind                | lowercase name, e.g `float32` |
//!
//! # Example
//!
//! ```ignore
//! use redistensor::{FsBackend, Tensor, TensorBackend};
//! use redistensor::config::DirectoryConfig;
//!
//! let backend = FsBackend::open(DirectoryConfig::new("/data/tensors")).await?;
//!
//! let weights = Tensor::from_slice(vec![2, 3], &[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0])?;
//! backend.set("weights", &weights).await?;
//!
//! let loaded = backend.get("weights").await?;
//! assert_eq!(loaded.shape(), &[2, 3]);
//! let values: Vec<f32> = loaded.to_vec()?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::return_self_not_must_use)]

pub mod backend;
pub mod codec;
pub mod config;
pub mod error;
pub mod pattern;
pub mod store;
pub mod tensor;

pub use backend::{FsBackend, KvBackend, RedisBackend, TensorBackend, open};
pub use codec::{DEFAULT_PATTERN, Dtype, RecordKind, decode_shape, encode_shape};
pub use config::{BackendConfig, ConfigLoader, DirectoryConfig, DtypeNames, RedisConfig, Settings};
pub use error::{StoreError, TensorError, TensorResult};
pub use store::{DirStore, MemoryStore, RecordStore, RedisStore};
pub use tensor::{Element, Tensor};
