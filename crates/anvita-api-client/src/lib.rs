//! HTTP client for the Anvita control plane and storage targets.
//!
//! Provides the [`Session`] handle, the [`UploadTransport`] seam used by the
//! upload orchestrator, and [`ApiClient`], the reqwest-backed implementation of
//! the pre-signed URL flow.

pub mod session;
pub mod transport;

pub use session::Session;
pub use transport::{Payload, UploadTransport};

use anvita_core::{
    ClientConfig, CredentialRequest, CredentialResponse, StoredObject, UploadCredential,
    UploadError, UploadResult, ValidationError,
};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::Client;
use tokio_util::io::ReaderStream;

/// Metadata learned about a remote object before fetching it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObjectInfo {
    pub file_name: String,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
}

/// HTTP client for credential requests and direct-to-storage transfers.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    credential_url: String,
    session: Session,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: Session) -> UploadResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| UploadError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            credential_url: config.credential_url(),
            session,
        })
    }

    pub fn credential_url(&self) -> &str {
        &self.credential_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// HEAD a remote URL to learn its name, content type and size.
    pub async fn probe_remote(&self, url: &str) -> UploadResult<RemoteObjectInfo> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| UploadError::NetworkError(format!("Invalid URL {}: {}", url, e)))?;

        let response = self
            .client
            .head(parsed.clone())
            .send()
            .await
            .map_err(|e| UploadError::NetworkError(format!("Failed to reach {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::NetworkError(format!(
                "Remote object responded with status {}",
                status
            )));
        }

        let headers = response.headers();
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let content_length = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());

        Ok(RemoteObjectInfo {
            file_name: file_name_from_url(&parsed),
            content_type,
            content_length,
        })
    }
}

/// Last non-empty path segment of a URL, or the host when the path is empty.
pub fn file_name_from_url(url: &reqwest::Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|s| s.to_string())
        .or_else(|| url.host_str().map(|h| h.to_string()))
        .unwrap_or_else(|| "download".to_string())
}

/// Pull a human-readable message out of an error body (`{"message": ...}`), if any.
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(|m| m.as_str())
        .map(|m| m.to_string())
}

#[async_trait]
impl UploadTransport for ApiClient {
    async fn request_credential(
        &self,
        request: &CredentialRequest,
    ) -> UploadResult<UploadCredential> {
        let token = self.session.bearer()?;

        let response = self
            .client
            .post(&self.credential_url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .json(request)
            .send()
            .await
            .map_err(|e| {
                UploadError::CredentialRequestFailed(format!("Failed to send request: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let detail = error_message(&error_text)
                .unwrap_or_else(|| "Failed to get presigned URL".to_string());
            return Err(UploadError::CredentialRequestFailed(format!(
                "status {}: {}",
                status, detail
            )));
        }

        let body: CredentialResponse = response.json().await.map_err(|e| {
            UploadError::CredentialRequestFailed(format!("Invalid response from server: {}", e))
        })?;

        let credential = UploadCredential::try_from(body).map_err(|e| {
            UploadError::CredentialRequestFailed(format!("Invalid response from server: {}", e))
        })?;

        tracing::debug!(
            file_name = %request.file_name,
            object_key = %credential.object_key(),
            "Issued upload credential"
        );

        Ok(credential)
    }

    async fn transfer(
        &self,
        credential: UploadCredential,
        payload: Payload,
        mime_type: &str,
    ) -> UploadResult<StoredObject> {
        let request = self
            .client
            .put(credential.write_url())
            .header(CONTENT_TYPE, mime_type);

        let request = match payload {
            Payload::Bytes(data) => request.body(data),
            Payload::File { path, size } => {
                let file = tokio::fs::File::open(&path).await.map_err(|e| {
                    UploadError::TransferFailed(format!(
                        "Failed to open {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                request
                    .header(CONTENT_LENGTH, size)
                    .body(reqwest::Body::wrap_stream(ReaderStream::new(file)))
            }
        };

        let response = request.send().await.map_err(|e| {
            UploadError::TransferFailed(format!("Network error while uploading: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::TransferFailed(format!(
                "storage responded with status {}",
                status
            )));
        }

        Ok(credential.into_stored())
    }

    async fn fetch_remote(&self, url: &str, max_bytes: u64) -> UploadResult<Bytes> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| UploadError::NetworkError(format!("Failed to download {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::NetworkError(format!(
                "Remote object responded with status {}",
                status
            )));
        }

        if let Some(size) = response.content_length() {
            if size > max_bytes {
                return Err(ValidationError::FileTooLarge {
                    size,
                    max: max_bytes,
                }
                .into());
            }
        }

        // Content-Length may be absent or wrong; enforce the ceiling while reading.
        let mut body = BytesMut::new();
        let mut chunks = response.bytes_stream();
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk
                .map_err(|e| UploadError::NetworkError(format!("Failed to read {}: {}", url, e)))?;
            let size = (body.len() + chunk.len()) as u64;
            if size > max_bytes {
                tracing::debug!(url = %url, max_bytes, "Remote object exceeds size ceiling");
                return Err(ValidationError::FileTooLarge {
                    size,
                    max: max_bytes,
                }
                .into());
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_from_path() {
        let url = reqwest::Url::parse("https://cdn.example.com/media/talk.mp3?sig=1").unwrap();
        assert_eq!(file_name_from_url(&url), "talk.mp3");
    }

    #[test]
    fn file_name_falls_back_to_host() {
        let url = reqwest::Url::parse("https://cdn.example.com/").unwrap();
        assert_eq!(file_name_from_url(&url), "cdn.example.com");
    }

    #[test]
    fn error_message_extraction() {
        assert_eq!(
            error_message(r#"{"message":"quota exceeded"}"#).as_deref(),
            Some("quota exceeded")
        );
        assert_eq!(error_message(r#"{"error":"nope"}"#).as_deref(), Some("nope"));
        assert_eq!(error_message("plain text"), None);
    }

    #[test]
    fn payload_len() {
        assert_eq!(Payload::Bytes(Bytes::from_static(b"abc")).len(), 3);
        let file = Payload::File {
            path: "x".into(),
            size: 42,
        };
        assert_eq!(file.len(), 42);
        assert!(!file.is_empty());
    }

    #[test]
    fn client_uses_configured_endpoint() {
        let config = ClientConfig::default();
        let client = ApiClient::new(&config, Session::new()).unwrap();
        assert_eq!(
            client.credential_url(),
            "http://localhost:3000/uploads/presigned"
        );
        assert!(!client.session().is_active());
    }
}
