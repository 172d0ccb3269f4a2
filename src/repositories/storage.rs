use chrono::Utc;
use uuid::Uuid;

use crate::backend::{BackendClient, BackendError};
use crate::utils::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum StorageError {
    #[error("{message}")]
    UploadRejected {
        message: String,
        #[source]
        source: BackendError,
    },
}

impl std::fmt::Debug for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Files kept in the public bucket: receipts and department pictures.
#[derive(Clone)]
pub struct StorageRepository {
    client: BackendClient,
    bucket: String,
}

impl StorageRepository {
    pub fn new(client: BackendClient, bucket: String) -> Self {
        Self { client, bucket }
    }

    /// Store `content` under a fresh object name and return its public URL.
    #[tracing::instrument(name = "Upload file", skip(self, content), fields(bucket = %self.bucket))]
    pub async fn upload_file(
        &self,
        content: Vec<u8>,
        file_name: &str,
        content_type: Option<&str>,
    ) -> Result<String, StorageError> {
        let content_type = content_type
            .map(str::to_string)
            .unwrap_or_else(|| detect_content_type(file_name));
        let object_name = object_name(file_name, Utc::now(), Uuid::new_v4());
        self.client
            .upload_object(&self.bucket, &object_name, &content_type, content)
            .await
            .map_err(|e| StorageError::UploadRejected {
                message: e.upload_message(&self.bucket),
                source: e,
            })?;
        Ok(self.client.public_url(&self.bucket, &object_name))
    }

    /// Accepts either an object name or a full public URL.
    #[tracing::instrument(name = "Delete file", skip(self))]
    pub async fn delete_file(&self, path_or_url: &str) -> bool {
        let name = path_or_url.rsplit('/').next().unwrap_or(path_or_url);
        if name.is_empty() {
            return false;
        }
        match self
            .client
            .remove_objects(&self.bucket, &[name.to_string()])
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error.cause_chain = ?e, "Failed to delete a stored file");
                false
            }
        }
    }
}

fn extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_lowercase())
    }
}

/// `YYYYMMDD_HHMMSS_<8 hex>.<ext>`, the extension is dropped when the upload has none.
fn object_name(file_name: &str, now: chrono::DateTime<Utc>, id: Uuid) -> String {
    let id = id.to_simple().to_string();
    let stem = format!("{}_{}", now.format("%Y%m%d_%H%M%S"), &id[..8]);
    match extension(file_name) {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem,
    }
}

fn detect_content_type(file_name: &str) -> String {
    if let Some(mime) = mime_guess::from_path(file_name).first_raw() {
        return mime.to_string();
    }
    match extension(file_name).as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
    .to_string()
}
