use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Where the bytes of an upload come from.
#[derive(Clone)]
pub enum PayloadSource {
    /// Payload already held in memory.
    Bytes(Bytes),
    /// Local file, streamed from disk during the transfer.
    File(PathBuf),
    /// Remote object fetched by the client before it is written to storage.
    RemoteUrl(String),
}

impl PayloadSource {
    pub fn is_remote(&self) -> bool {
        matches!(self, PayloadSource::RemoteUrl(_))
    }
}

impl fmt::Debug for PayloadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadSource::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
            PayloadSource::File(path) => write!(f, "File({})", path.display()),
            PayloadSource::RemoteUrl(url) => write!(f, "RemoteUrl({})", url),
        }
    }
}

/// A single file submitted for upload.
///
/// Created at submission time and dropped once the resulting outcome has been emitted.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub source: PayloadSource,
}

impl UploadRequest {
    pub fn new(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        size_bytes: u64,
        source: PayloadSource,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            size_bytes,
            source,
        }
    }

    /// Builds a request for an in-memory payload; the size is taken from the buffer.
    pub fn from_bytes(
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        let data = data.into();
        let size_bytes = data.len() as u64;
        Self::new(file_name, mime_type, size_bytes, PayloadSource::Bytes(data))
    }
}

/// Lifecycle status of an uploaded file.
///
/// `Processing` is set downstream once transcription/summarisation starts; the
/// upload pipeline itself only ever produces `Uploading`, `Completed` and `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Uploading,
    Processing,
    Completed,
    Failed,
}

impl UploadStatus {
    /// Terminal statuses never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadStatus::Completed | UploadStatus::Failed)
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UploadStatus::Uploading => "uploading",
            UploadStatus::Processing => "processing",
            UploadStatus::Completed => "completed",
            UploadStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Record handed to the presentation layer once an upload settles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRecord {
    /// Client-generated id, unique per submission (not the storage object key)
    pub id: String,
    pub file_name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub status: UploadStatus,
    pub progress_percent: u8,
    pub submitted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
}

impl UploadRecord {
    /// Record for a successfully stored file.
    pub fn completed(
        id: String,
        request: &UploadRequest,
        submitted_at: DateTime<Utc>,
        public_url: String,
    ) -> Self {
        Self {
            id,
            file_name: request.file_name.clone(),
            size_bytes: request.size_bytes,
            mime_type: request.mime_type.clone(),
            status: UploadStatus::Completed,
            progress_percent: 100,
            submitted_at,
            public_url: Some(public_url),
        }
    }

    /// Record for an upload that failed after it started.
    pub fn failed(id: String, request: &UploadRequest, submitted_at: DateTime<Utc>) -> Self {
        Self {
            id,
            file_name: request.file_name.clone(),
            size_bytes: request.size_bytes,
            mime_type: request.mime_type.clone(),
            status: UploadStatus::Failed,
            progress_percent: 0,
            submitted_at,
            public_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bytes_uses_buffer_length() {
        let req = UploadRequest::from_bytes("a.txt", "text/plain", b"hello".to_vec());
        assert_eq!(req.size_bytes, 5);
        assert!(!req.source.is_remote());
    }

    #[test]
    fn status_terminality() {
        assert!(UploadStatus::Completed.is_terminal());
        assert!(UploadStatus::Failed.is_terminal());
        assert!(!UploadStatus::Uploading.is_terminal());
        assert!(!UploadStatus::Processing.is_terminal());
    }

    #[test]
    fn record_serializes_camel_case() {
        let req = UploadRequest::from_bytes("talk.mp3", "audio/mpeg", vec![0u8; 4]);
        let record = UploadRecord::completed(
            "upload_1".to_string(),
            &req,
            Utc::now(),
            "https://cdn/k1".to_string(),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["progressPercent"], 100);
        assert_eq!(json["publicUrl"], "https://cdn/k1");
        assert_eq!(json["fileName"], "talk.mp3");
    }

    #[test]
    fn failed_record_omits_public_url() {
        let req = UploadRequest::from_bytes("talk.mp3", "audio/mpeg", vec![0u8; 4]);
        let record = UploadRecord::failed("upload_2".to_string(), &req, Utc::now());
        assert_eq!(record.status, UploadStatus::Failed);
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("publicUrl").is_none());
    }

    #[test]
    fn payload_debug_hides_bytes() {
        let source = PayloadSource::Bytes(Bytes::from_static(b"secret"));
        assert_eq!(format!("{:?}", source), "Bytes(6 bytes)");
    }
}
