use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use vianda_core::receipt::{ReceiptImage, ReceiptStore, UploadError};

/// In-process stand-in for the hosted file bucket receipts are uploaded
/// to. Keys are unguessable; the returned URL is stable for the lifetime
/// of the process.
pub struct InMemoryReceiptStore {
    base_url: String,
    objects: RwLock<HashMap<String, ReceiptImage>>,
}

impl InMemoryReceiptStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Stored object for a key, if any. Test/diagnostic accessor; serving
    /// receipts is the bucket's job, not this crate's.
    pub async fn fetch(&self, key: &str) -> Option<ReceiptImage> {
        self.objects.read().await.get(key).cloned()
    }

    fn sanitize(file_name: &str) -> String {
        file_name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
            .collect()
    }
}

#[async_trait]
impl ReceiptStore for InMemoryReceiptStore {
    async fn upload(&self, image: &ReceiptImage) -> Result<String, UploadError> {
        if image.bytes.is_empty() {
            return Err(UploadError("empty receipt image".to_string()));
        }
        let key = format!(
            "{}-{}",
            Uuid::new_v4().simple(),
            Self::sanitize(&image.file_name)
        );
        self.objects.write().await.insert(key.clone(), image.clone());
        let url = format!("{}/receipts/{key}", self.base_url.trim_end_matches('/'));
        tracing::debug!(%url, "receipt stored");
        Ok(url)
    }
}
