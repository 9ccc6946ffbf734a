//! put command - store a raw buffer as a tensor

use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use redistensor::{Dtype, Tensor, TensorBackend};
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::parse_shape_arg;

/// Read the input buffer from a file, or stdin for `-`
async fn read_input(path: &Path) -> Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut buf = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut buf)
            .await
            .context("failed to read stdin")?;
        return Ok(buf);
    }
    tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))
}

/// Build a tensor from `file` and store it under `key`
///
/// The buffer length is checked against `dtype` and `shape` before anything
/// is written.
pub async fn execute(
    backend: &dyn TensorBackend,
    key: &str,
    file: &Path,
    dtype: Dtype,
    shape: &str,
) -> Result<Tensor> {
    let shape = parse_shape_arg(shape)?;
    let data = read_input(file).await?;
    debug!(key, input = %file.display(), size = data.len(), "Read input buffer");

    let tensor = Tensor::reshape(dtype, shape, data)
        .with_context(|| format!("{} does not hold a {dtype} tensor of that shape", file.display()))?;
    backend
        .set(key, &tensor)
        .await
        .with_context(|| format!("failed to store {key}"))?;

    println!(
        "{} Stored {} {}",
        style("[OK]").green(),
        style(key).cyan(),
        tensor
    );
    Ok(tensor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use redistensor::{KvBackend, MemoryStore};
    use std::io::Write;

    #[tokio::test]
    async fn test_put_from_file() {
        let backend = KvBackend::new(MemoryStore::new());
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let values = [1i32, 2, 3, 4, 5, 6];
        for v in values {
            file.write_all(&v.to_ne_bytes()).unwrap();
        }
        file.flush().unwrap();

        execute(&backend, "m", file.path(), Dtype::Int32, "(2,3)")
            .await
            .unwrap();

        let stored = backend.get("m").await.unwrap();
        assert_eq!(stored.shape(), &[2, 3]);
        assert_eq!(stored.to_vec::<i32>().unwrap(), values);
    }

    #[tokio::test]
    async fn test_put_rejects_wrong_length() {
        let backend = KvBackend::new(MemoryStore::new());
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 7]).unwrap();
        file.flush().unwrap();

        let result = execute(&backend, "m", file.path(), Dtype::Float64, "1").await;
        assert!(result.is_err());
        assert!(backend.store().is_empty());
    }

    #[tokio::test]
    async fn test_put_missing_file() {
        let backend = KvBackend::new(MemoryStore::new());
        let dir = tempfile::tempdir().unwrap();

        let result = execute(&backend, "m", &dir.path().join("nope"), Dtype::UInt8, "1").await;
        assert!(result.is_err());
    }
}
