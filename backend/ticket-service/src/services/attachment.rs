/// Attachment adapter
///
/// Owns filename sanitization and URL derivation, and wraps the object store
/// that durably holds attachment bytes.
use async_trait::async_trait;
use s3_utils::S3Operations;
use std::sync::Arc;
use tokio::sync::OnceCell;
use unicode_normalization::UnicodeNormalization;

use crate::error::{AppError, Result};

/// Longest sanitized filename, extension included
pub const MAX_FILENAME_CHARS: usize = 100;

const FALLBACK_FILENAME: &str = "file";

/// Object storage collaborator
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Create the backing bucket if it is absent.
    async fn ensure_bucket(&self) -> Result<()>;

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()>;

    /// Deterministic retrieval URL for `key`
    fn url_for(&self, key: &str) -> String;
}

/// [`ObjectStore`] backed by S3 or MinIO
#[derive(Clone)]
pub struct S3ObjectStore {
    ops: S3Operations,
}

impl S3ObjectStore {
    pub fn new(ops: S3Operations) -> Self {
        Self { ops }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn ensure_bucket(&self) -> Result<()> {
        let exists = self
            .ops
            .bucket_exists()
            .await
            .map_err(|e| AppError::Storage(format!("bucket check failed: {e}")))?;

        if !exists {
            self.ops
                .create_bucket()
                .await
                .map_err(|e| AppError::Storage(format!("bucket creation failed: {e}")))?;
        }
        Ok(())
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        self.ops
            .upload_file(key, bytes, content_type)
            .await
            .map(|_| ())
            .map_err(|e| AppError::Storage(format!("upload failed: {e}")))
    }

    fn url_for(&self, key: &str) -> String {
        self.ops.config().object_url(key)
    }
}

/// Raw attachment as received from a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentPayload {
    pub name: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAttachment {
    pub url: String,
    /// Sanitized name, also used for display
    pub safe_name: String,
    pub size: i64,
}

pub struct AttachmentService {
    store: Arc<dyn ObjectStore>,
    bucket_ready: OnceCell<()>,
}

impl AttachmentService {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            bucket_ready: OnceCell::new(),
        }
    }

    /// Sanitize, store and return the retrieval URL.
    ///
    /// The bucket check runs once per process; a failed check is retried on
    /// the next upload.
    pub async fn upload(&self, payload: AttachmentPayload) -> Result<UploadedAttachment> {
        self.bucket_ready
            .get_or_try_init(|| self.store.ensure_bucket())
            .await?;

        let safe_name = sanitize_filename(&payload.name);
        let key = object_key(&safe_name);
        let size = payload.bytes.len() as i64;

        self.store
            .put(&key, payload.bytes, &payload.content_type)
            .await?;

        let url = self.store.url_for(&key);
        tracing::debug!(key = %key, size, "attachment stored");

        Ok(UploadedAttachment {
            url,
            safe_name,
            size,
        })
    }
}

/// Storage key for a sanitized name
pub fn object_key(safe_name: &str) -> String {
    urlencoding::encode(safe_name).into_owned()
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || ('\u{AC00}'..='\u{D7A3}').contains(&c)
        || matches!(c, '.' | '_' | '-')
}

/// Reduce a client-supplied filename to a storage-safe one.
///
/// NFC-normalizes, replaces anything outside ASCII letters, digits, Hangul
/// syllables, `.`, `_` and `-` with `_`, collapses underscore runs and caps
/// the length at [`MAX_FILENAME_CHARS`] while keeping the extension.
pub fn sanitize_filename(name: &str) -> String {
    let mut safe = String::with_capacity(name.len());
    for c in name.nfc() {
        let c = if is_allowed(c) { c } else { '_' };
        if c == '_' && safe.ends_with('_') {
            continue;
        }
        safe.push(c);
    }

    if safe.is_empty() {
        return FALLBACK_FILENAME.to_string();
    }

    let total = safe.chars().count();
    if total <= MAX_FILENAME_CHARS {
        return safe;
    }

    // Only a dot past the first character starts an extension.
    let ext = match safe.rfind('.') {
        Some(idx) if idx > 0 => &safe[idx..],
        _ => "",
    };
    let ext_len = ext.chars().count();
    if ext_len == 0 || ext_len >= MAX_FILENAME_CHARS {
        return safe.chars().take(MAX_FILENAME_CHARS).collect();
    }

    let stem: String = safe.chars().take(MAX_FILENAME_CHARS - ext_len).collect();
    format!("{stem}{ext}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[test]
    fn test_sanitize_keeps_allowed_characters() {
        assert_eq!(sanitize_filename("report-2024_v1.pdf"), "report-2024_v1.pdf");
        assert_eq!(sanitize_filename("보고서.txt"), "보고서.txt");
    }

    #[test]
    fn test_sanitize_replaces_and_collapses() {
        assert_eq!(sanitize_filename("my file (final)!!.png"), "my_file_final_.png");
        assert_eq!(sanitize_filename("a   b"), "a_b");
        assert_eq!(sanitize_filename("__x__"), "_x_");
    }

    #[test]
    fn test_sanitize_normalizes_to_nfc() {
        // Decomposed jamo for "한" compose to a single syllable.
        let decomposed = "\u{1112}\u{1161}\u{11AB}.txt";
        assert_eq!(sanitize_filename(decomposed), "한.txt");
        // Fullwidth letters are not ASCII and get replaced.
        assert_eq!(sanitize_filename("ＡＢ.txt"), "_.txt");
    }

    #[test]
    fn test_sanitize_truncates_preserving_extension() {
        let long = format!("{}.jpeg", "x".repeat(150));
        let safe = sanitize_filename(&long);
        assert_eq!(safe.chars().count(), MAX_FILENAME_CHARS);
        assert!(safe.ends_with(".jpeg"));
        assert!(safe.starts_with("xxxx"));
    }

    #[test]
    fn test_sanitize_truncates_without_extension() {
        let long = "가".repeat(120);
        let safe = sanitize_filename(&long);
        assert_eq!(safe.chars().count(), MAX_FILENAME_CHARS);

        let dotfile = format!(".{}", "y".repeat(120));
        assert_eq!(sanitize_filename(&dotfile).chars().count(), MAX_FILENAME_CHARS);
    }

    #[test]
    fn test_sanitize_output_alphabet() {
        let messy = "Ｒé·sumé — 최종 (복사본) ✓✓ ~~ final...tar.gz";
        let safe = sanitize_filename(messy);
        assert!(safe.chars().all(is_allowed));
        assert!(!safe.contains("__"));
        assert!(safe.ends_with(".gz"));
    }

    #[test]
    fn test_sanitize_empty_name() {
        assert_eq!(sanitize_filename(""), "file");
    }

    #[test]
    fn test_object_key_is_url_encoded() {
        assert_eq!(object_key("보.txt"), "%EB%B3%B4.txt");
        assert_eq!(object_key("a-b_c.txt"), "a-b_c.txt");
    }

    #[derive(Default)]
    struct CountingStore {
        ensure_calls: AtomicUsize,
        puts: Mutex<Vec<(String, usize, String)>>,
    }

    #[async_trait]
    impl ObjectStore for CountingStore {
        async fn ensure_bucket(&self) -> Result<()> {
            self.ensure_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
            self.puts
                .lock()
                .unwrap()
                .push((key.to_string(), bytes.len(), content_type.to_string()));
            Ok(())
        }

        fn url_for(&self, key: &str) -> String {
            format!("http://minio.local/ticket-files/{key}")
        }
    }

    #[tokio::test]
    async fn test_upload_ensures_bucket_once() {
        let store = Arc::new(CountingStore::default());
        let service = AttachmentService::new(store.clone());

        for name in ["a.txt", "b.txt"] {
            service
                .upload(AttachmentPayload {
                    name: name.to_string(),
                    bytes: b"hi".to_vec(),
                    content_type: "text/plain".into(),
                })
                .await
                .unwrap();
        }

        assert_eq!(store.ensure_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.puts.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_upload_returns_url_and_sanitized_name() {
        let store = Arc::new(CountingStore::default());
        let service = AttachmentService::new(store.clone());

        let uploaded = service
            .upload(AttachmentPayload {
                name: "견적 서.pdf".into(),
                bytes: vec![0u8; 10],
                content_type: "application/pdf".into(),
            })
            .await
            .unwrap();

        assert_eq!(uploaded.safe_name, "견적_서.pdf");
        assert_eq!(uploaded.size, 10);
        assert_eq!(
            uploaded.url,
            format!(
                "http://minio.local/ticket-files/{}",
                object_key("견적_서.pdf")
            )
        );
        assert_eq!(store.puts.lock().unwrap()[0].2, "application/pdf");
    }
}
