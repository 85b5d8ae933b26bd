use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::{info, warn};

use crate::models::{Metadata, QueryRequest, UploadResult};
use crate::upload::SelectedFile;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Backend answered the upload with a non-success status; holds the body text.
    #[error("Upload failed: {0}")]
    Upload(String),

    /// Backend answered the query with a non-success status; holds the body text.
    #[error("Query failed: {0}")]
    Query(String),

    #[error("Could not read {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// Thin client for the document backend's upload and query endpoints.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn upload_document(
        &self,
        file: &SelectedFile,
        metadata: Option<&Metadata>,
    ) -> Result<UploadResult, ApiError> {
        let url = format!("{}/documents/upload", self.base_url);

        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|source| ApiError::ReadFile {
                path: file.path.display().to_string(),
                source,
            })?;

        let part = Part::bytes(bytes)
            .file_name(file.name.clone())
            .mime_str(&file.content_type)?;
        let mut form = Form::new().part("file", part);

        if let Some(metadata) = metadata {
            // A string-keyed JSON map always serializes
            let encoded = serde_json::Value::Object(metadata.clone()).to_string();
            form = form.text("metadata", encoded);
        }

        info!(file = %file.name, size = file.size, "uploading document");
        let response = self.client.post(&url).multipart(form).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = body_or_status(response.text().await, status);
            warn!(%status, "upload rejected: {}", text);
            return Err(ApiError::Upload(text));
        }

        let result: UploadResult = response.json().await?;
        info!(id = %result.id, chunks = result.total_chunks, "document uploaded");
        Ok(result)
    }

    pub async fn query_document(&self, request: &QueryRequest) -> Result<String, ApiError> {
        let url = format!("{}/query", self.base_url);

        info!(question_len = request.question.len(), "querying document");
        let response = self.client.post(&url).json(request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = body_or_status(response.text().await, status);
            warn!(%status, "query rejected: {}", text);
            return Err(ApiError::Query(text));
        }

        let answer = response.text().await?;
        info!(answer_len = answer.len(), "query answered");
        Ok(answer)
    }
}

/// The rejection body, or the status line when the body cannot be read.
fn body_or_status<E: std::fmt::Display>(body: Result<String, E>, status: StatusCode) -> String {
    match body {
        Ok(text) => text,
        Err(err) => {
            warn!(%status, "could not read error body: {}", err);
            status.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new("http://localhost:8080/api/");
        assert_eq!(client.base_url(), "http://localhost:8080/api");
    }

    #[test]
    fn test_error_messages_carry_prefix() {
        assert_eq!(
            ApiError::Upload("bad file".to_string()).to_string(),
            "Upload failed: bad file"
        );
        assert_eq!(
            ApiError::Query("no index".to_string()).to_string(),
            "Query failed: no index"
        );
    }

    #[test]
    fn test_unreadable_error_body_falls_back_to_status() {
        let status = StatusCode::BAD_GATEWAY;
        let text = body_or_status::<String>(Err("connection reset".to_string()), status);
        assert_eq!(text, "502 Bad Gateway");
        assert_eq!(
            ApiError::Query(text).to_string(),
            "Query failed: 502 Bad Gateway"
        );

        assert_eq!(body_or_status::<String>(Ok("index not ready".to_string()), status), "index not ready");
    }
}
