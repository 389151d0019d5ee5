use std::path::Path;

use anvita_api_client::RemoteObjectInfo;
use anvita_core::{
    guess_content_type, ErrorMetadata, PayloadSource, UploadError, UploadRequest,
};
use anvita_upload::UploadOutcome;
use anyhow::Context;
use serde_json::{json, Value};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Initialize tracing for the CLI. Logs go to stderr so stdout stays JSON.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// Build an upload request for a local file.
///
/// The content type is `mime_override` when given, otherwise guessed from the
/// extension. Unknown extensions fall through to validation, which rejects them.
pub async fn request_for_path(
    path: &Path,
    mime_override: Option<&str>,
) -> anyhow::Result<UploadRequest> {
    let metadata = tokio::fs::metadata(path)
        .await
        .with_context(|| format!("Cannot read {}", path.display()))?;
    if !metadata.is_file() {
        anyhow::bail!("{} is not a regular file", path.display());
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mime_type = mime_override
        .map(|m| m.to_string())
        .or_else(|| guess_content_type(&file_name).map(|m| m.to_string()))
        .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());

    Ok(UploadRequest::new(
        file_name,
        mime_type,
        metadata.len(),
        PayloadSource::File(path.to_path_buf()),
    ))
}

/// Build an upload request for a remote object from its HEAD probe.
pub fn request_for_remote(url: &str, info: &RemoteObjectInfo) -> UploadRequest {
    let reported = info
        .content_type
        .as_deref()
        .filter(|ct| !ct.starts_with(FALLBACK_CONTENT_TYPE));
    let mime_type = reported
        .or_else(|| guess_content_type(&info.file_name))
        .unwrap_or(FALLBACK_CONTENT_TYPE);

    UploadRequest::new(
        info.file_name.clone(),
        mime_type,
        info.content_length.unwrap_or(0),
        PayloadSource::RemoteUrl(url.to_string()),
    )
}

fn error_json(error: &UploadError) -> Value {
    json!({
        "code": error.error_code(),
        "message": error.client_message(),
        "detail": error.to_string(),
        "recoverable": error.is_recoverable(),
    })
}

/// JSON document printed for one outcome.
pub fn outcome_json(outcome: &UploadOutcome) -> Value {
    match outcome {
        UploadOutcome::Completed(record) => json!({
            "status": "completed",
            "upload": record,
        }),
        UploadOutcome::Failed { record, error } => json!({
            "status": "failed",
            "upload": record,
            "error": error_json(error),
        }),
        UploadOutcome::Rejected { file_name, error } => json!({
            "status": "rejected",
            "fileName": file_name,
            "error": error_json(&UploadError::Validation(error.clone())),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anvita_core::{UploadRecord, ValidationError};
    use std::io::Write;

    #[tokio::test]
    async fn request_for_path_reads_size_and_guesses_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memo.mp3");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&[0u8; 2048]).unwrap();

        let request = request_for_path(&path, None).await.unwrap();
        assert_eq!(request.file_name, "memo.mp3");
        assert_eq!(request.mime_type, "audio/mpeg");
        assert_eq!(request.size_bytes, 2048);
        assert!(matches!(request.source, PayloadSource::File(_)));
    }

    #[tokio::test]
    async fn request_for_path_honours_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recording.bin");
        std::fs::write(&path, b"abc").unwrap();

        let guessed = request_for_path(&path, None).await.unwrap();
        assert_eq!(guessed.mime_type, FALLBACK_CONTENT_TYPE);

        let forced = request_for_path(&path, Some("audio/wav")).await.unwrap();
        assert_eq!(forced.mime_type, "audio/wav");
    }

    #[tokio::test]
    async fn request_for_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = request_for_path(&dir.path().join("nope.txt"), None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Cannot read"));
    }

    #[tokio::test]
    async fn request_for_path_rejects_directories() {
        let dir = tempfile::tempdir().unwrap();
        assert!(request_for_path(dir.path(), None).await.is_err());
    }

    #[test]
    fn remote_request_prefers_reported_type() {
        let info = RemoteObjectInfo {
            file_name: "talk".to_string(),
            content_type: Some("video/mp4".to_string()),
            content_length: Some(4096),
        };
        let request = request_for_remote("https://example.com/talk", &info);
        assert_eq!(request.mime_type, "video/mp4");
        assert_eq!(request.size_bytes, 4096);
        assert!(request.source.is_remote());
    }

    #[test]
    fn remote_request_guesses_generic_type() {
        let info = RemoteObjectInfo {
            file_name: "paper.pdf".to_string(),
            content_type: Some("application/octet-stream".to_string()),
            content_length: None,
        };
        let request = request_for_remote("https://example.com/paper.pdf", &info);
        assert_eq!(request.mime_type, "application/pdf");
        assert_eq!(request.size_bytes, 0);
    }

    #[test]
    fn outcome_json_shapes() {
        let request = UploadRequest::from_bytes("a.mp3", "audio/mpeg", "x");
        let record = UploadRecord::completed(
            "upload_1".into(),
            &request,
            chrono::Utc::now(),
            "https://cdn/k1".into(),
        );
        let done = outcome_json(&UploadOutcome::Completed(record));
        assert_eq!(done["status"], "completed");
        assert_eq!(done["upload"]["publicUrl"], "https://cdn/k1");
        assert_eq!(done["upload"]["progressPercent"], 100);

        let rejected = outcome_json(&UploadOutcome::Rejected {
            file_name: "big.mp4".into(),
            error: ValidationError::FileTooLarge {
                size: 150 * 1024 * 1024,
                max: 100 * 1024 * 1024,
            },
        });
        assert_eq!(rejected["status"], "rejected");
        assert_eq!(rejected["fileName"], "big.mp4");
        assert_eq!(rejected["error"]["code"], "FILE_TOO_LARGE");
        assert_eq!(rejected["error"]["recoverable"], false);
    }
}
