//! Integration tests for redistensor backends

use bytes::Bytes;
use redistensor::{
    BackendConfig, DirectoryConfig, Dtype, FsBackend, KvBackend, MemoryStore, RecordStore,
    RedisBackend, RedisConfig, Tensor, TensorBackend, TensorError,
};

/// Deterministic buffer of the right length for `dtype` and `shape`
fn sample_tensor(dtype: Dtype, shape: &[usize]) -> Tensor {
    let numel: usize = shape.iter().product();
    let len = numel * dtype.element_size();
    let data: Vec<u8> = match dtype {
        // Only 0 and 1 are meaningful booleans
        Dtype::Bool => (0..len).map(|i| (i % 2) as u8).collect(),
        _ => (0..len).map(|i| (i * 37 + 11) as u8).collect(),
    };
    Tensor::reshape(dtype, shape.to_vec(), data).unwrap()
}

const SHAPES: &[&[usize]] = &[&[], &[1], &[5], &[2, 3], &[0, 5], &[3, 0, 2], &[1, 1, 1], &[2, 2, 2, 2]];

async fn assert_roundtrips(backend: &dyn TensorBackend) {
    for dtype in Dtype::ALL {
        for (i, shape) in SHAPES.iter().enumerate() {
            let key = format!("{dtype}_{i}");
            let tensor = sample_tensor(dtype, shape);

            backend.set(&key, &tensor).await.unwrap();
            let loaded = backend.get(&key).await.unwrap();

            assert_eq!(loaded.dtype(), dtype, "dtype of {key}");
            assert_eq!(loaded.shape(), *shape, "shape of {key}");
            assert_eq!(loaded.data(), tensor.data(), "buffer of {key}");
        }
    }
}

/// Test every dtype and shape survives the directory backend
#[tokio::test]
async fn test_fs_roundtrip_all_dtypes() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FsBackend::open(DirectoryConfig::new(dir.path())).await.unwrap();
    assert_roundtrips(&backend).await;
}

/// Test every dtype and shape survives the key-value backend
#[tokio::test]
async fn test_kv_roundtrip_all_dtypes() {
    let backend = KvBackend::new(MemoryStore::new());
    assert_roundtrips(&backend).await;
}

/// Test the shape scenario from the wire format documentation
#[tokio::test]
async fn test_shape_of_matrix() {
    let dir = tempfile::tempdir().unwrap();
    let fs = FsBackend::open(DirectoryConfig::new(dir.path())).await.unwrap();
    let kv = KvBackend::new(MemoryStore::new());
    let tensor = Tensor::from_slice(vec![2, 3], &[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();

    for backend in [&fs as &dyn TensorBackend, &kv] {
        backend.set("x0", &tensor).await.unwrap();
        assert_eq!(backend.shape("x0").await.unwrap(), vec![2, 3]);
    }
}

/// Test both backends list exactly the stored keys
#[tokio::test]
async fn test_names_both_backends() {
    let dir = tempfile::tempdir().unwrap();
    let fs = FsBackend::open(DirectoryConfig::new(dir.path())).await.unwrap();
    let kv = KvBackend::new(MemoryStore::new());

    for backend in [&fs as &dyn TensorBackend, &kv] {
        backend.set("a", &Tensor::scalar(1i32)).await.unwrap();
        backend.set("b", &Tensor::scalar(2i32)).await.unwrap();

        let mut names = backend.names().await.unwrap();
        names.sort();
        assert_eq!(names, vec!["a", "b"], "names on {}", backend.describe());
    }
}

/// Test unknown keys fail differently per backend
#[tokio::test]
async fn test_missing_key_semantics() {
    let dir = tempfile::tempdir().unwrap();
    let fs = FsBackend::open(DirectoryConfig::new(dir.path())).await.unwrap();
    let kv = KvBackend::new(MemoryStore::new());

    assert!(matches!(fs.get("ghost").await, Err(TensorError::Read { .. })));
    assert!(matches!(kv.get("ghost").await, Err(TensorError::NotFound(_))));

    // Shape lookup fails the same way
    assert!(matches!(fs.shape("ghost").await, Err(TensorError::Read { .. })));
    assert!(matches!(kv.shape("ghost").await, Err(TensorError::NotFound(_))));
}

/// Test a triple assembled from two different writes is rejected
#[tokio::test]
async fn test_torn_triple_reads_as_error() {
    let store = MemoryStore::new();
    let backend = KvBackend::new(store.clone());

    let first = Tensor::from_slice(vec![4], &[1u32, 2, 3, 4]).unwrap();
    let second = Tensor::from_slice(vec![2, 3], &[0u32; 6]).unwrap();
    backend.set("t", &first).await.unwrap();

    // Interrupted overwrite: only the data record of the second write landed
    store.put("t_tensor", second.data().clone()).await.unwrap();

    let err = backend.get("t").await.unwrap_err();
    assert!(matches!(err, TensorError::Read { .. }));
    assert!(matches!(err.root_cause(), TensorError::ShapeMismatch { .. }));
}

/// Test a torn triple on disk is rejected too
#[tokio::test]
async fn test_fs_torn_triple_reads_as_error() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FsBackend::open(DirectoryConfig::new(dir.path())).await.unwrap();

    backend.set("t", &Tensor::from_slice(vec![3], &[1i8, 2, 3]).unwrap()).await.unwrap();
    std::fs::write(dir.path().join("t_shape"), "(2,3)").unwrap();

    let err = backend.get("t").await.unwrap_err();
    assert!(matches!(err.root_cause(), TensorError::ShapeMismatch { .. }));
}

/// Test a one-element tuple shape written by hand decodes as 1-D
#[tokio::test]
async fn test_trailing_comma_shape_record() {
    let store = MemoryStore::new();
    store.put("v_tensor", Bytes::from(vec![0u8; 5])).await.unwrap();
    store.put("v_shape", Bytes::from_static(b"(5,)")).await.unwrap();
    store.put("v_dtype", Bytes::from_static(b"uint8")).await.unwrap();

    let backend = KvBackend::new(store);
    assert_eq!(backend.shape("v").await.unwrap(), vec![5]);
}

/// Test the configured backend is opened through the factory
#[tokio::test]
async fn test_open_directory_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = BackendConfig::Directory(DirectoryConfig::new(dir.path()));

    let backend = redistensor::open(&config).await.unwrap();
    backend.set("k", &Tensor::scalar(9u64)).await.unwrap();
    assert_eq!(backend.get("k").await.unwrap().to_vec::<u64>().unwrap(), vec![9]);
    assert!(backend.describe().starts_with("dir:"));
}

/// Test an unreachable server is an init failure
#[tokio::test]
async fn test_redis_connection_refused() {
    let mut config = RedisConfig::new("127.0.0.1", 1);
    config.connect_timeout_ms = 500;

    let err = RedisBackend::connect(&config).await.unwrap_err();
    assert!(matches!(err, TensorError::Init { .. }));
}

/// Test a full roundtrip against a live server
#[tokio::test]
#[ignore = "requires a running redis server on localhost:6379"]
async fn test_redis_roundtrip() {
    let backend = RedisBackend::connect(&RedisConfig::default()).await.unwrap();
    let tensor = Tensor::from_slice(vec![2, 2], &[1.5f64, -2.5, 3.5, -4.5]).unwrap();

    backend.set("redistensor_it", &tensor).await.unwrap();
    assert_eq!(backend.get("redistensor_it").await.unwrap(), tensor);
    assert!(
        backend
            .names_matching("redistensor_it*")
            .await
            .unwrap()
            .contains(&"redistensor_it".to_string())
    );
    assert!(backend.get("redistensor_absent").await.unwrap_err().is_not_found());
}

/// Test the transactional write path against a live server
#[tokio::test]
#[ignore = "requires a running redis server on localhost:6379"]
async fn test_redis_atomic_writes() {
    let config = RedisConfig::default().atomic_writes(true);
    let backend = RedisBackend::connect(&config).await.unwrap();
    let tensor = Tensor::from_slice(vec![3], &[true, false, true]).unwrap();

    backend.set("redistensor_atomic", &tensor).await.unwrap();
    assert_eq!(backend.get("redistensor_atomic").await.unwrap(), tensor);
}

/// Test multi-key reads return one slot per name against a live server
#[tokio::test]
#[ignore = "requires a running redis server on localhost:6379"]
async fn test_redis_get_many() {
    let store = redistensor::RedisStore::connect(&RedisConfig::default()).await.unwrap();
    store.put("redistensor_mget_a", Bytes::from_static(b"1")).await.unwrap();

    let names = ["redistensor_mget_a".to_string(), "redistensor_mget_absent".to_string()];
    let values = store.get_many(&names).await.unwrap();
    assert_eq!(values, vec![Some(Bytes::from_static(b"1")), None]);
}
