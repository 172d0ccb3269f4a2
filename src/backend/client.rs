use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::backend::Query;
use crate::utils::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum BackendError {
    #[error("Failed to reach the backend.")]
    Transport(#[source] reqwest::Error),
    #[error("The backend answered with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Failed to decode the backend response.")]
    Decode(#[source] reqwest::Error),
    #[error("The backend did not return the written row.")]
    EmptyRepresentation,
}

impl std::fmt::Debug for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl BackendError {
    /// Message shown to a user whose upload was refused by the object store.
    pub fn upload_message(&self, bucket: &str) -> String {
        let details = match self {
            BackendError::Status { body, .. } => body.to_lowercase(),
            other => other.to_string().to_lowercase(),
        };
        if details.contains("bucket not found") || details.contains("does not exist") {
            format!(
                "The storage bucket '{}' does not exist. Create it before uploading files.",
                bucket
            )
        } else if details.contains("row-level security") {
            "Permission denied by the storage policies of the bucket.".into()
        } else if details.contains("duplicate") {
            "A file with that name already exists. Please try again.".into()
        } else {
            "The file could not be uploaded.".into()
        }
    }
}

/// Authenticated handle to the hosted tables (`/rest/v1`) and object store (`/storage/v1`).
#[derive(Clone)]
pub struct BackendClient {
    http_client: Client,
    base_url: String,
    api_key: Secret<String>,
}

impl BackendClient {
    pub fn new(
        base_url: String,
        api_key: Secret<String>,
        timeout: std::time::Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn object_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        let key = self.api_key.expose_secret();
        builder.header("apikey", key.as_str()).bearer_auth(key)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(BackendError::Transport)?;
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(BackendError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }

    #[tracing::instrument(name = "Select rows", skip(self, query))]
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
    ) -> Result<Vec<T>, BackendError> {
        let request = self
            .http_client
            .get(self.table_url(table))
            .query(&query.select_pairs("*"));
        self.send(request)
            .await?
            .json::<Vec<T>>()
            .await
            .map_err(BackendError::Decode)
    }

    pub async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &Query,
    ) -> Result<Option<T>, BackendError> {
        let rows = self.select(table, &query.clone().limit(1)).await?;
        Ok(rows.into_iter().next())
    }

    #[tracing::instrument(name = "Count rows", skip(self, query))]
    pub async fn count(&self, table: &str, query: &Query) -> Result<u64, BackendError> {
        let request = self
            .http_client
            .get(self.table_url(table))
            .header("Prefer", "count=exact")
            .query(&query.select_pairs("id"));
        let response = self.send(request).await?;
        let total = response
            .headers()
            .get("Content-Range")
            .and_then(|v| v.to_str().ok())
            .and_then(content_range_total);
        match total {
            Some(total) => Ok(total),
            None => {
                let rows = response
                    .json::<Vec<serde_json::Value>>()
                    .await
                    .map_err(BackendError::Decode)?;
                Ok(rows.len() as u64)
            }
        }
    }

    #[tracing::instrument(name = "Insert row", skip(self, body))]
    pub async fn insert<B, T>(&self, table: &str, body: &B) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .http_client
            .post(self.table_url(table))
            .header("Prefer", "return=representation")
            .json(body);
        let rows = self
            .send(request)
            .await?
            .json::<Vec<T>>()
            .await
            .map_err(BackendError::Decode)?;
        rows.into_iter()
            .next()
            .ok_or(BackendError::EmptyRepresentation)
    }

    #[tracing::instrument(name = "Update rows", skip(self, query, body))]
    pub async fn update<B, T>(
        &self,
        table: &str,
        query: &Query,
        body: &B,
    ) -> Result<Vec<T>, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .http_client
            .patch(self.table_url(table))
            .header("Prefer", "return=representation")
            .query(query.filter_pairs())
            .json(body);
        self.send(request)
            .await?
            .json::<Vec<T>>()
            .await
            .map_err(BackendError::Decode)
    }

    #[tracing::instrument(name = "Delete rows", skip(self, query))]
    pub async fn delete(&self, table: &str, query: &Query) -> Result<(), BackendError> {
        let request = self
            .http_client
            .delete(self.table_url(table))
            .query(query.filter_pairs());
        self.send(request).await?;
        Ok(())
    }

    #[tracing::instrument(name = "Upload object", skip(self, content))]
    pub async fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        content: Vec<u8>,
    ) -> Result<(), BackendError> {
        let request = self
            .http_client
            .post(self.object_url(bucket, path))
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(content);
        self.send(request).await?;
        Ok(())
    }

    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, bucket, path
        )
    }

    #[tracing::instrument(name = "Remove objects", skip(self))]
    pub async fn remove_objects(
        &self,
        bucket: &str,
        names: &[String],
    ) -> Result<(), BackendError> {
        let request = self
            .http_client
            .delete(format!("{}/storage/v1/object/{}", self.base_url, bucket))
            .json(&serde_json::json!({ "prefixes": names }));
        self.send(request).await?;
        Ok(())
    }
}

/// `0-4/5` and `*/0` both carry the total after the slash.
fn content_range_total(header: &str) -> Option<u64> {
    header.rsplit_once('/')?.1.trim().parse().ok()
}
