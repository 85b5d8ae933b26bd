//! Wire types exchanged with the document backend.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form, string-keyed metadata attached to a document.
pub type Metadata = Map<String, Value>;

/// Backend response to a successful document upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub id: String,
    pub filename: String,
    pub content_type: String,
    pub size: u64,
    pub total_chunks: usize,
    #[serde(default)]
    pub chunks: Vec<String>,
    #[serde(default)]
    pub metadata: Metadata,
    /// Creation time exactly as the backend formatted it.
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<QueryFilters>,
}

impl QueryRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            filters: None,
        }
    }
}

/// Retrieval filters understood by the query endpoint. The UI never sets them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

/// Metadata sent with every upload from the UI.
pub fn default_upload_metadata() -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("author".to_string(), Value::from("User"));
    metadata.insert("category".to_string(), Value::from("document"));
    metadata.insert(
        "description".to_string(),
        Value::from("Uploaded via knowledge base UI"),
    );
    metadata
}
