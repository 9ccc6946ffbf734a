//! shape and stat commands - describe a stored tensor

use anyhow::{Context, Result};
use console::style;
use redistensor::{Tensor, TensorBackend, encode_shape};
use serde::Serialize;

/// Summary of a stored tensor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TensorStat {
    pub key: String,
    pub dtype: String,
    pub shape: Vec<usize>,
    pub ndim: usize,
    pub numel: usize,
    pub size_bytes: usize,
}

impl TensorStat {
    pub fn new(key: &str, tensor: &Tensor) -> Self {
        Self {
            key: key.to_string(),
            dtype: tensor.dtype().name().to_string(),
            shape: tensor.shape().to_vec(),
            ndim: tensor.ndim(),
            numel: tensor.numel(),
            size_bytes: tensor.size_bytes(),
        }
    }
}

/// Print the encoded shape of `key`
pub async fn shape(backend: &dyn TensorBackend, key: &str) -> Result<Vec<usize>> {
    let shape = backend
        .shape(key)
        .await
        .with_context(|| format!("failed to load {key}"))?;
    println!("{}", encode_shape(&shape));
    Ok(shape)
}

/// Print dtype, shape, element count and byte size of `key`
pub async fn execute(backend: &dyn TensorBackend, key: &str, json: bool) -> Result<TensorStat> {
    let tensor = backend
        .get(key)
        .await
        .with_context(|| format!("failed to load {key}"))?;
    let stat = TensorStat::new(key, &tensor);

    if json {
        println!("{}", serde_json::to_string_pretty(&stat)?);
    } else {
        println!("{}", style(&stat.key).cyan().bold());
        println!("  Dtype:     {}", stat.dtype);
        println!("  Shape:     {}", encode_shape(&stat.shape));
        println!("  Elements:  {}", stat.numel);
        println!("  Size:      {} bytes", stat.size_bytes);
    }
    Ok(stat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use redistensor::{KvBackend, MemoryStore};

    #[tokio::test]
    async fn test_stat_matrix() {
        let backend = KvBackend::new(MemoryStore::new());
        let tensor = Tensor::from_slice(vec![2, 3], &[0f64; 6]).unwrap();
        backend.set("x0", &tensor).await.unwrap();

        let stat = execute(&backend, "x0", true).await.unwrap();
        assert_eq!(stat.dtype, "float64");
        assert_eq!(stat.shape, vec![2, 3]);
        assert_eq!(stat.ndim, 2);
        assert_eq!(stat.numel, 6);
        assert_eq!(stat.size_bytes, 48);

        assert_eq!(shape(&backend, "x0").await.unwrap(), vec![2, 3]);
    }

    #[test]
    fn test_stat_json_fields() {
        let stat = TensorStat::new("s", &Tensor::scalar(true));
        let value = serde_json::to_value(&stat).unwrap();
        assert_eq!(value["dtype"], "bool");
        assert_eq!(value["shape"], serde_json::json!([]));
        assert_eq!(value["numel"], 1);
    }
}
