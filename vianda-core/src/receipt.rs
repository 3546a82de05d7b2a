use async_trait::async_trait;

/// Receipt image captured by the checkout wizard before upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
#[error("receipt upload failed: {0}")]
pub struct UploadError(pub String);

#[async_trait]
pub trait ReceiptStore: Send + Sync {
    /// Upload receipt bytes and return a stable public URL.
    ///
    /// Must complete before the order referencing the URL is created;
    /// a failure blocks transfer-payment confirmation.
    async fn upload(&self, image: &ReceiptImage) -> Result<String, UploadError>;
}
