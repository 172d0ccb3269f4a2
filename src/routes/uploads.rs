use actix_multipart::{Multipart, MultipartError};
use futures_util::TryStreamExt;
use std::collections::HashMap;

use crate::utils::error_chain_fmt;

/// Upper bound for a text part, files have their own limit.
pub const MAX_FIELD_BYTES: usize = 64 * 1024;

#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub content: Vec<u8>,
}

/// A decoded `multipart/form-data` body: text fields plus the files that were attached.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

#[derive(thiserror::Error)]
pub enum UploadError {
    #[error("The file is too large, the limit is {} MB", .limit / (1024 * 1024))]
    TooLarge { limit: usize },
    #[error("The {name} field is too long, the limit is {} KB", .limit / 1024)]
    FieldTooLarge { name: String, limit: usize },
    #[error("The form could not be read")]
    Malformed(#[source] MultipartError),
}

impl std::fmt::Debug for UploadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl MultipartForm {
    /// Read every part of `payload`. Files larger than `max_file_bytes` and text
    /// fields larger than `MAX_FIELD_BYTES` abort the read.
    pub async fn read(mut payload: Multipart, max_file_bytes: usize) -> Result<Self, UploadError> {
        let mut form = MultipartForm::default();
        while let Some(mut field) = payload.try_next().await.map_err(UploadError::Malformed)? {
            let disposition = field.content_disposition();
            let name = match disposition.get_name() {
                Some(name) => name.to_string(),
                None => continue,
            };
            let file_name = disposition.get_filename().map(str::to_string);

            let mut content = Vec::new();
            while let Some(chunk) = field.try_next().await.map_err(UploadError::Malformed)? {
                let size = content.len() + chunk.len();
                if file_name.is_some() && size > max_file_bytes {
                    return Err(UploadError::TooLarge {
                        limit: max_file_bytes,
                    });
                }
                if file_name.is_none() && size > MAX_FIELD_BYTES {
                    return Err(UploadError::FieldTooLarge {
                        name,
                        limit: MAX_FIELD_BYTES,
                    });
                }
                content.extend_from_slice(&chunk);
            }

            match file_name {
                // browsers send an empty part when no file was picked
                Some(file_name) if file_name.is_empty() && content.is_empty() => {}
                Some(file_name) => {
                    form.files.insert(name, UploadedFile { file_name, content });
                }
                None => {
                    form.fields
                        .insert(name, String::from_utf8_lossy(&content).into_owned());
                }
            }
        }
        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn flag(&self, name: &str) -> bool {
        matches!(self.text(name), Some("1" | "on" | "true"))
    }

    pub fn number<T: std::str::FromStr>(&self, name: &str) -> Result<Option<T>, String> {
        match self.text(name) {
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| format!("'{}' is not a valid value for {}", raw, name)),
            None => Ok(None),
        }
    }

    /// The attached file, `None` when it is missing or empty.
    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name).filter(|f| !f.content.is_empty())
    }

    #[cfg(test)]
    pub fn from_parts(
        fields: &[(&str, &str)],
        files: Vec<(&str, UploadedFile)>,
    ) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            files: files.into_iter().map(|(k, f)| (k.to_string(), f)).collect(),
        }
    }
}
