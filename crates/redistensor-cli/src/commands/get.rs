//! get command - fetch a tensor's raw buffer

use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use redistensor::{Tensor, TensorBackend};
use tokio::io::AsyncWriteExt;

/// Fetch `key` and write its buffer to `output`, or print a summary
pub async fn execute(backend: &dyn TensorBackend, key: &str, output: Option<&Path>) -> Result<Tensor> {
    let tensor = backend
        .get(key)
        .await
        .with_context(|| format!("failed to load {key}"))?;

    match output {
        Some(path) if path == Path::new("-") => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(tensor.data()).await?;
            stdout.flush().await?;
        }
        Some(path) => {
            tokio::fs::write(path, tensor.data())
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!(
                "{} Wrote {} bytes to {}",
                style("[OK]").green(),
                tensor.size_bytes(),
                path.display()
            );
        }
        None => println!("{} {}", style(key).cyan(), tensor),
    }

    Ok(tensor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use redistensor::{KvBackend, MemoryStore};

    #[tokio::test]
    async fn test_get_writes_buffer() {
        let backend = KvBackend::new(MemoryStore::new());
        let tensor = Tensor::from_slice(vec![3], &[1u16, 2, 3]).unwrap();
        backend.set("v", &tensor).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("v.bin");
        execute(&backend, "v", Some(&out)).await.unwrap();

        assert_eq!(std::fs::read(&out).unwrap(), tensor.data().to_vec());
    }

    #[tokio::test]
    async fn test_get_unknown_key() {
        let backend = KvBackend::new(MemoryStore::new());
        let err = execute(&backend, "ghost", None).await.unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }
}
