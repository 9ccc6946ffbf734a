//! ls command - list tensor keys

use anyhow::{Context, Result};
use console::style;
use redistensor::TensorBackend;
use redistensor::codec::RecordKind;

/// Keys matching `pattern`, sorted
///
/// The pattern applies to logical keys; it is matched against the `_tensor`
/// record names underneath.
pub async fn collect(backend: &dyn TensorBackend, pattern: &str) -> Result<Vec<String>> {
    let mut keys = backend
        .names_matching(&RecordKind::Tensor.record_name(pattern))
        .await
        .with_context(|| format!("failed to list keys matching {pattern:?}"))?;
    keys.sort();
    Ok(keys)
}

/// List keys matching `pattern`
pub async fn execute(backend: &dyn TensorBackend, pattern: &str, json: bool) -> Result<()> {
    let keys = collect(backend, pattern).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({ "keys": keys }))?
        );
    } else if keys.is_empty() {
        println!("{}", style("No tensors found").yellow());
    } else {
        for key in &keys {
            println!("{key}");
        }
    }
    Ok(())
}
