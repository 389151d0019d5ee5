//! Client-side upload validation
//!
//! Runs before any network call is issued for a file.

use std::path::Path;

/// Upload size ceiling: 100 MiB.
pub const MAX_UPLOAD_SIZE_BYTES: u64 = 100 * 1024 * 1024;

pub const AUDIO_CONTENT_TYPES: &[&str] = &["audio/mpeg", "audio/wav", "audio/aac", "audio/ogg"];

pub const VIDEO_CONTENT_TYPES: &[&str] = &[
    "video/mp4",
    "video/avi",
    "video/x-msvideo",
    "video/quicktime",
    "video/x-ms-wmv",
];

pub const DOCUMENT_CONTENT_TYPES: &[&str] = &[
    "text/plain",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// Validation errors for a candidate file
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("File name is empty")]
    EmptyFileName,
}

/// Size and content-type policy for uploads.
///
/// Pure: no I/O, no side effects.
#[derive(Debug, Clone)]
pub struct ValidationPolicy {
    max_size_bytes: u64,
    allowed_content_types: Vec<String>,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        let allowed = AUDIO_CONTENT_TYPES
            .iter()
            .chain(VIDEO_CONTENT_TYPES)
            .chain(DOCUMENT_CONTENT_TYPES)
            .map(|s| s.to_string())
            .collect();
        Self::new(MAX_UPLOAD_SIZE_BYTES, allowed)
    }
}

impl ValidationPolicy {
    pub fn new(max_size_bytes: u64, allowed_content_types: Vec<String>) -> Self {
        Self {
            max_size_bytes,
            allowed_content_types: allowed_content_types
                .into_iter()
                .map(|ct| normalize_content_type(&ct))
                .collect(),
        }
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    /// Validate a candidate by declared size and content type.
    ///
    /// Size is checked first, so an oversized file of an unsupported type
    /// reports `FileTooLarge`.
    pub fn validate(&self, size_bytes: u64, mime_type: &str) -> Result<(), ValidationError> {
        if size_bytes > self.max_size_bytes {
            return Err(ValidationError::FileTooLarge {
                size: size_bytes,
                max: self.max_size_bytes,
            });
        }

        let normalized = normalize_content_type(mime_type);
        if !self.allowed_content_types.iter().any(|ct| ct == &normalized) {
            return Err(ValidationError::UnsupportedType(mime_type.to_string()));
        }

        Ok(())
    }

    /// Full check of an upload request, including its file name.
    pub fn validate_request(
        &self,
        file_name: &str,
        size_bytes: u64,
        mime_type: &str,
    ) -> Result<(), ValidationError> {
        if file_name.trim().is_empty() {
            return Err(ValidationError::EmptyFileName);
        }
        self.validate(size_bytes, mime_type)
    }
}

/// Lowercase and drop parameters (`text/plain; charset=utf-8` -> `text/plain`).
fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// Guess a supported content type from a file name's extension.
pub fn guess_content_type(file_name: &str) -> Option<&'static str> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())?;

    let content_type = match extension.as_str() {
        // Audio
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "aac" => "audio/aac",
        "ogg" => "audio/ogg",
        // Videos
        "mp4" => "video/mp4",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "wmv" => "video/x-ms-wmv",
        // Documents
        "txt" => "text/plain",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => return None,
    };
    Some(content_type)
}
