pub mod api;
pub mod chat;
pub mod config;
pub mod models;
pub mod upload;

// Re-export main types for convenience
pub use api::{ApiClient, ApiError};
pub use chat::{ChatMessage, ChatRole, ChatState, Transcript};
pub use config::Config;
pub use models::{default_upload_metadata, DateRange, Metadata, QueryFilters, QueryRequest, UploadResult};
pub use upload::{normalize_dropped_path, SelectedFile, SelectionError, UploadForm, MAX_UPLOAD_BYTES, PDF_CONTENT_TYPE};
