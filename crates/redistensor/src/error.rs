//! Error types for tensor storage

use std::io;

use thiserror::Error;

/// Result type for tensor operations
pub type TensorResult<T> = Result<T, TensorError>;

/// Errors raised by the underlying record stores
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Redis client error
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Record name cannot be addressed by the store
    #[error("invalid record name: {0:?}")]
    InvalidName(String),
}

/// Tensor storage errors
#[derive(Debug, Error)]
pub enum TensorError {
    /// Backend could not be constructed
    #[error("failed to initialize {target}: {reason}")]
    Init {
        /// Directory path or server address
        target: String,
        /// What went wrong
        reason: String,
        /// Underlying store failure, if any
        #[source]
        source: Option<StoreError>,
    },

    /// One of the three record writes failed
    #[error("failed to write tensor {key:?}: {source}")]
    Write {
        /// Logical tensor key
        key: String,
        /// Underlying store failure
        #[source]
        source: StoreError,
    },

    /// One of the three record reads failed, or the records disagree
    #[error("failed to read tensor {key:?}: {source}")]
    Read {
        /// Logical tensor key
        key: String,
        /// Cause of the failure
        #[source]
        source: Box<TensorError>,
    },

    /// Tensor data record is absent
    #[error("tensor not found: {0}")]
    NotFound(String),

    /// Dtype name is not one of the supported element kinds
    #[error("unknown dtype: {0:?}")]
    UnknownDtype(String),

    /// Shape text is malformed
    #[error("malformed shape text: {0:?}")]
    Format(String),

    /// Buffer length disagrees with shape and dtype
    #[error(
        "buffer of {actual} bytes cannot be viewed as {dtype} with shape {shape:?} ({expected} bytes)"
    )]
    ShapeMismatch {
        /// Requested shape
        shape: Vec<usize>,
        /// Element dtype name
        dtype: &'static str,
        /// Expected byte length
        expected: usize,
        /// Actual byte length
        actual: usize,
    },

    /// Requested element type does not match the tensor dtype
    #[error("dtype mismatch: expected {expected}, got {actual}")]
    DtypeMismatch {
        /// Dtype requested by the caller
        expected: &'static str,
        /// Dtype of the tensor
        actual: &'static str,
    },

    /// A companion record of the triple is absent
    #[error("missing record: {0}")]
    MissingRecord(String),

    /// A text record is not valid UTF-8
    #[error("record {0} is not valid UTF-8")]
    Encoding(String),

    /// Listing record names failed
    #[error("failed to list records matching {pattern:?}: {source}")]
    List {
        /// Glob pattern that was queried
        pattern: String,
        /// Underlying store failure
        #[source]
        source: StoreError,
    },

    /// Underlying store failure
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl TensorError {
    /// Wrap a cause as a read failure for `key`
    pub fn read(key: impl Into<String>, source: TensorError) -> Self {
        Self::Read {
            key: key.into(),
            source: Box::new(source),
        }
    }

    /// Wrap a store failure as a write failure for `key`
    pub fn write(key: impl Into<String>, source: StoreError) -> Self {
        Self::Write {
            key: key.into(),
            source,
        }
    }

    /// Innermost cause of a `Read` chain
    #[must_use]
    pub fn root_cause(&self) -> &TensorError {
        match self {
            Self::Read { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Whether this is a `NotFound`
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_wraps_cause() {
        let err = TensorError::read("w", TensorError::Format("(a,b)".to_string()));
        assert!(matches!(err, TensorError::Read { .. }));
        assert!(matches!(err.root_cause(), TensorError::Format(_)));
        assert!(err.to_string().contains("malformed shape text"));
    }

    #[test]
    fn test_write_keeps_source() {
        let io = io::Error::new(io::ErrorKind::PermissionDenied, "read-only");
        let err = TensorError::write("w", StoreError::from(io));
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("read-only"));
    }

    #[test]
    fn test_not_found() {
        assert!(TensorError::NotFound("x".to_string()).is_not_found());
        assert!(!TensorError::Format(String::new()).is_not_found());
    }
}
