use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use super::*;
use crate::storage::{BYTES_PER_MB, OperatorStore, object_key};

const PUBLIC_URL: &str = "https://pub-1.r2.dev";

/// How the mock store answers.
#[derive(Clone, Copy)]
enum Behavior {
    Succeed,
    NotFound,
    Reject,
    Hang,
}

/// Mock store recording every call.
struct MockStore {
    behavior: Behavior,
    puts: Mutex<Vec<(String, Bytes, String)>>,
    deletes: Mutex<Vec<String>>,
}

impl MockStore {
    fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            puts: Mutex::new(Vec::new()),
            deletes: Mutex::new(Vec::new()),
        })
    }

    fn put_count(&self) -> usize {
        self.puts.lock().unwrap().len()
    }

    fn delete_count(&self) -> usize {
        self.deletes.lock().unwrap().len()
    }

    async fn outcome(&self, key: &str) -> Result<(), StoreError> {
        match self.behavior {
            Behavior::Succeed => Ok(()),
            Behavior::NotFound => Err(StoreError::NotFound {
                key: key.to_string(),
            }),
            Behavior::Reject => Err(StoreError::PermissionDenied("access denied".into())),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            }
        }
    }
}

#[async_trait]
impl ObjectStore for MockStore {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StoreError> {
        self.puts
            .lock()
            .unwrap()
            .push((key.to_string(), body, content_type.to_string()));
        self.outcome(key).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.deletes.lock().unwrap().push(key.to_string());
        self.outcome(key).await
    }
}

fn policy() -> UploadPolicy {
    UploadPolicy::new()
        .with_max_size_mb(10)
        .with_allowed_extensions([".png", ".jpg"])
}

fn gateway(store: Arc<MockStore>) -> UploadGateway {
    UploadGateway::new(store, policy(), PUBLIC_URL)
}

fn image(name: &str, size: usize) -> UploadRequest<Cursor<Bytes>> {
    UploadRequest::from_bytes(name, Bytes::from(vec![7u8; size]))
}

fn is_key_shape(key: &str, extension: &str) -> bool {
    let Some((hash, rest)) = key.split_once('-') else {
        return false;
    };
    let Some(timestamp) = rest.strip_suffix(extension) else {
        return false;
    };
    hash.len() == 32
        && hash
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        && timestamp.len() == 14
        && timestamp.chars().all(|c| c.is_ascii_digit())
}

#[tokio::test]
async fn test_upload_png_returns_url_and_key() {
    let store = MockStore::new(Behavior::Succeed);
    let gateway = gateway(store.clone());

    let uploaded = gateway
        .upload(image("photo.png", 2 * 1024 * 1024))
        .await
        .expect("upload succeeds");

    assert!(is_key_shape(&uploaded.key, ".png"), "key: {}", uploaded.key);
    assert!(uploaded.url.ends_with(&uploaded.key));
    assert_eq!(uploaded.url, format!("{PUBLIC_URL}/{}", uploaded.key));

    let puts = store.puts.lock().unwrap();
    assert_eq!(puts.len(), 1);
    let (key, body, content_type) = &puts[0];
    assert_eq!(key, &uploaded.key);
    assert_eq!(body.len(), 2 * 1024 * 1024);
    assert_eq!(content_type, "image/png");
}

#[tokio::test]
async fn test_upload_pdf_is_unsupported_and_not_stored() {
    let store = MockStore::new(Behavior::Succeed);
    let gateway = gateway(store.clone());

    let err = gateway.upload(image("doc.pdf", 1024 * 1024)).await.unwrap_err();

    assert!(matches!(
        err,
        GatewayError::Validation(ValidationError::UnsupportedType { ref extension }) if extension == ".pdf"
    ));
    assert_eq!(store.put_count(), 0);
}

#[tokio::test]
async fn test_upload_too_large_reports_sizes_and_is_not_stored() {
    let store = MockStore::new(Behavior::Succeed);
    let gateway = gateway(store.clone());

    let request = UploadRequest::new("big.png", 15 * BYTES_PER_MB, &b""[..]);
    let err = gateway.upload(request).await.unwrap_err();

    assert!(matches!(
        err,
        GatewayError::Validation(ValidationError::TooLarge { max_mb: 10, .. })
    ));
    let message = err.to_string();
    assert!(message.contains("15.00 MB"), "message: {message}");
    assert!(message.contains("10 MB"), "message: {message}");
    assert_eq!(store.put_count(), 0);
}

#[tokio::test]
async fn test_upload_stream_longer_than_declared_is_too_large() {
    let store = MockStore::new(Behavior::Succeed);
    let gateway = UploadGateway::new(store.clone(), policy().with_max_size_mb(1), PUBLIC_URL);

    let content = vec![0u8; 2 * 1024 * 1024];
    let request = UploadRequest::new("photo.png", 1024, &content[..]);
    let err = gateway.upload(request).await.unwrap_err();

    assert!(matches!(
        err,
        GatewayError::Validation(ValidationError::TooLarge { .. })
    ));
    assert_eq!(store.put_count(), 0);
}

#[tokio::test]
async fn test_upload_read_failure_is_io_error() {
    let store = MockStore::new(Behavior::Succeed);
    let gateway = gateway(store.clone());

    let content = tokio_test::io::Builder::new()
        .read(b"\x89PNG")
        .read_error(std::io::Error::other("disk gone"))
        .build();
    let err = gateway
        .upload(UploadRequest::new("photo.png", 4096, content))
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Io(_)));
    assert!(err.to_string().contains("disk gone"));
    assert_eq!(store.put_count(), 0);
}

#[tokio::test]
async fn test_upload_store_failure_is_returned() {
    let store = MockStore::new(Behavior::Reject);
    let gateway = gateway(store.clone());

    let err = gateway.upload(image("photo.jpg", 512)).await.unwrap_err();

    assert!(matches!(
        err,
        GatewayError::Store(StoreError::PermissionDenied(_))
    ));
    assert_eq!(store.put_count(), 1);
}

#[tokio::test]
async fn test_upload_times_out() {
    let store = MockStore::new(Behavior::Hang);
    let timeout = Duration::from_millis(50);
    let gateway = UploadGateway::new(store, policy().with_timeout(timeout), PUBLIC_URL);

    let err = gateway.upload(image("photo.png", 16)).await.unwrap_err();

    assert!(matches!(err, GatewayError::Store(StoreError::Timeout(after)) if after == timeout));
}

#[tokio::test]
async fn test_upload_without_nonce_hashes_base_name() {
    let store = MockStore::new(Behavior::Succeed);
    let gateway = UploadGateway::new(store, policy().with_key_nonce(false), PUBLIC_URL);

    let uploaded = gateway
        .upload(image("photo.png", 16))
        .await
        .expect("upload succeeds");

    let expected = object_key("photo.png", Utc::now());
    assert_eq!(uploaded.key[..32], expected[..32]);
}

#[tokio::test]
async fn test_public_url_trailing_slash_is_trimmed() {
    let gateway = UploadGateway::new(
        MockStore::new(Behavior::Succeed),
        policy(),
        "https://img.example.com/",
    );
    assert_eq!(
        gateway.public_url_for("abc.png"),
        "https://img.example.com/abc.png"
    );
}

#[tokio::test]
async fn test_delete_calls_store() {
    let store = MockStore::new(Behavior::Succeed);
    let gateway = gateway(store.clone());

    gateway.delete("abc-20260118093015.png").await.expect("delete succeeds");

    assert_eq!(
        *store.deletes.lock().unwrap(),
        vec!["abc-20260118093015.png".to_string()]
    );
}

#[tokio::test]
async fn test_delete_not_found_is_store_error() {
    let gateway = gateway(MockStore::new(Behavior::NotFound));

    let err = gateway.delete("gone.png").await.unwrap_err();

    assert!(matches!(
        err,
        GatewayError::Store(StoreError::NotFound { ref key }) if key == "gone.png"
    ));
}

#[tokio::test]
async fn test_delete_rejects_invalid_keys() {
    let store = MockStore::new(Behavior::Succeed);
    let gateway = gateway(store.clone());

    for key in ["", "images/"] {
        let err = gateway.delete(key).await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Validation(ValidationError::InvalidKey(_))
        ));
    }
    assert_eq!(store.delete_count(), 0);
}

#[tokio::test]
async fn test_delete_times_out() {
    let timeout = Duration::from_millis(50);
    let gateway = UploadGateway::new(
        MockStore::new(Behavior::Hang),
        policy().with_timeout(timeout),
        PUBLIC_URL,
    );

    let err = gateway.delete("photo.png").await.unwrap_err();

    assert!(matches!(err, GatewayError::Store(StoreError::Timeout(_))));
}

#[tokio::test]
async fn test_upload_and_delete_against_memory_store() {
    let store = Arc::new(OperatorStore::memory().expect("memory store"));
    let gateway = UploadGateway::new(store.clone(), policy(), PUBLIC_URL);

    let uploaded = gateway
        .upload(UploadRequest::from_bytes(
            "cover.jpg",
            Bytes::from_static(b"jpeg-bytes"),
        ))
        .await
        .expect("upload succeeds");

    let stored = store
        .operator()
        .read(&uploaded.key)
        .await
        .expect("object stored");
    assert_eq!(stored.to_vec(), b"jpeg-bytes");

    gateway.delete(&uploaded.key).await.expect("delete succeeds");
    assert!(!store.operator().exists(&uploaded.key).await.expect("stat works"));

    // Deleting again is a no-op.
    gateway.delete(&uploaded.key).await.expect("second delete succeeds");
}

#[tokio::test]
async fn test_concurrent_uploads_get_distinct_keys() {
    let store = Arc::new(OperatorStore::memory().expect("memory store"));
    let gateway = Arc::new(UploadGateway::new(store, policy(), PUBLIC_URL));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let gateway = Arc::clone(&gateway);
            tokio::spawn(async move {
                gateway
                    .upload(UploadRequest::from_bytes(
                        "same-name.png",
                        Bytes::from_static(b"png"),
                    ))
                    .await
            })
        })
        .collect();

    let mut keys = std::collections::HashSet::new();
    for handle in handles {
        let uploaded = handle.await.expect("task joins").expect("upload succeeds");
        keys.insert(uploaded.key);
    }
    assert_eq!(keys.len(), 16);
}
