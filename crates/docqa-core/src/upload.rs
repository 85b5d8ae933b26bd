//! File selection and upload form state for the Upload screen.
//!
//! This module is UI-agnostic: the TUI feeds it paths (typed or dropped) and
//! reads back the selection, the error to display, and the uploading flag.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Largest file accepted for upload (10 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Please select a valid PDF file")]
    NotPdf,

    #[error("File size must be less than 10MB")]
    TooLarge,

    #[error("Could not read file: {0}")]
    Unreadable(String),

    #[error("An upload is already in progress")]
    Busy,
}

/// A file the user picked, with the fields the Upload screen displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
    pub content_type: String,
    pub size: u64,
}

impl SelectedFile {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        let content_type = content_type_for(&path).to_string();

        Self {
            path,
            name,
            content_type,
            size,
        }
    }

    /// Stat a file on disk. The content type comes from the extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SelectionError> {
        let path = path.as_ref();
        let metadata = fs::metadata(path)
            .map_err(|e| SelectionError::Unreadable(format!("{}: {}", path.display(), e)))?;

        if !metadata.is_file() {
            return Err(SelectionError::Unreadable(format!(
                "{}: not a file",
                path.display()
            )));
        }

        Ok(Self::new(path, metadata.len()))
    }

    pub fn human_size(&self) -> String {
        format!("{:.2} MB", self.size as f64 / 1024.0 / 1024.0)
    }
}

/// Declared content type for a file name, by extension.
fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => PDF_CONTENT_TYPE,
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "txt" => "text/plain",
        "md" => "text/markdown",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

/// Turn pasted text (what a terminal emits when a file is dropped on it) into a path.
pub fn normalize_dropped_path(text: &str) -> PathBuf {
    let mut s = text.trim();

    for quote in ['\'', '"'] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            s = &s[1..s.len() - 1];
            break;
        }
    }

    if let Some(rest) = s.strip_prefix("file://") {
        return PathBuf::from(rest.replace("%20", " "));
    }

    PathBuf::from(s.replace("\\ ", " "))
}

/// State behind the Upload screen: current selection, errors, drag highlight
/// and whether an upload is in flight.
#[derive(Debug, Default)]
pub struct UploadForm {
    selected: Option<SelectedFile>,
    local_error: Option<String>,
    server_error: Option<String>,
    drag_over: bool,
    uploading: bool,
}

impl UploadForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn is_drag_over(&self) -> bool {
        self.drag_over
    }

    /// Server errors take precedence over local validation errors.
    pub fn display_error(&self) -> Option<&str> {
        self.server_error
            .as_deref()
            .or(self.local_error.as_deref())
    }

    /// Validate and accept a file. On `Ok` the caller starts the upload.
    pub fn select(&mut self, file: SelectedFile) -> Result<SelectedFile, SelectionError> {
        if self.uploading {
            return Err(SelectionError::Busy);
        }

        if let Err(err) = validate(&file) {
            debug!(name = %file.name, content_type = %file.content_type, size = file.size, "rejected selection: {}", err);
            self.local_error = Some(err.to_string());
            return Err(err);
        }

        debug!(name = %file.name, size = file.size, "accepted selection");
        self.local_error = None;
        self.selected = Some(file.clone());
        Ok(file)
    }

    /// Select a file by path, recording read failures like validation failures.
    pub fn select_path(&mut self, path: impl AsRef<Path>) -> Result<SelectedFile, SelectionError> {
        if self.uploading {
            return Err(SelectionError::Busy);
        }

        match SelectedFile::from_path(path) {
            Ok(file) => self.select(file),
            Err(err) => {
                self.local_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub fn drag_enter(&mut self) {
        self.drag_over = true;
    }

    pub fn drag_leave(&mut self) {
        self.drag_over = false;
    }

    /// Handle a drop: the dropped text is a path to the file.
    pub fn drop_text(&mut self, text: &str) -> Result<SelectedFile, SelectionError> {
        self.drag_over = false;
        self.select_path(normalize_dropped_path(text))
    }

    /// Clear the selection and any displayed error.
    pub fn remove(&mut self) -> bool {
        if self.uploading {
            return false;
        }
        self.selected = None;
        self.local_error = None;
        self.server_error = None;
        true
    }

    pub fn begin_upload(&mut self) {
        self.uploading = true;
        self.server_error = None;
    }

    /// Upload failed: back to interactive, selection kept so the user can retry.
    pub fn fail_upload(&mut self, message: impl Into<String>) {
        self.uploading = false;
        self.server_error = Some(message.into());
    }

    /// Upload succeeded: the file has been handed off.
    pub fn complete_upload(&mut self) {
        self.uploading = false;
        self.selected = None;
        self.local_error = None;
        self.server_error = None;
    }
}

fn validate(file: &SelectedFile) -> Result<(), SelectionError> {
    if file.content_type != PDF_CONTENT_TYPE {
        return Err(SelectionError::NotPdf);
    }
    if file.size > MAX_UPLOAD_BYTES {
        return Err(SelectionError::TooLarge);
    }
    Ok(())
}
