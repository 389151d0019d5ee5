//! Per-upload state machine.
//!
//! ```text
//! ResolvingPayload -> AwaitingCredential -> AwaitingTransfer -> Terminal
//! ```
//!
//! `ResolvingPayload` measures the real payload before any credential is
//! requested: local files are stat'ed and remote-URL sources are fetched. The
//! measured size replaces the declared one. Any failure moves straight to
//! `Terminal`.

use anvita_api_client::{Payload, UploadTransport};
use anvita_core::{
    CredentialRequest, PayloadSource, StoredObject, UploadCredential, UploadError,
    UploadRequest, UploadResult, ValidationPolicy,
};
use std::path::Path;

enum TaskState {
    ResolvingPayload(PayloadSource),
    AwaitingCredential(Payload),
    AwaitingTransfer {
        credential: UploadCredential,
        payload: Payload,
    },
    Terminal(UploadResult<StoredObject>),
}

impl TaskState {
    fn name(&self) -> &'static str {
        match self {
            TaskState::ResolvingPayload(_) => "resolving_payload",
            TaskState::AwaitingCredential(_) => "awaiting_credential",
            TaskState::AwaitingTransfer { .. } => "awaiting_transfer",
            TaskState::Terminal(_) => "terminal",
        }
    }
}

/// How a task ended.
#[derive(Debug)]
pub struct TaskReport {
    /// Size of the payload as resolved, or the declared size if resolution failed.
    pub size_bytes: u64,
    pub result: UploadResult<StoredObject>,
}

/// Drives one upload request through the two-step transfer.
pub struct UploadTask<'a> {
    transport: &'a dyn UploadTransport,
    policy: &'a ValidationPolicy,
    file_name: String,
    mime_type: String,
    size_bytes: u64,
    source: PayloadSource,
}

impl<'a> UploadTask<'a> {
    pub fn new(
        request: &UploadRequest,
        transport: &'a dyn UploadTransport,
        policy: &'a ValidationPolicy,
    ) -> Self {
        Self {
            transport,
            policy,
            file_name: request.file_name.clone(),
            mime_type: request.mime_type.clone(),
            size_bytes: request.size_bytes,
            source: request.source.clone(),
        }
    }

    /// Runs to `Terminal` and reports the stored object or the first error.
    pub async fn run(mut self) -> TaskReport {
        let mut state = TaskState::ResolvingPayload(self.source.clone());
        loop {
            state = match state {
                TaskState::Terminal(result) => {
                    return TaskReport {
                        size_bytes: self.size_bytes,
                        result,
                    }
                }
                other => self.advance(other).await,
            };
            tracing::trace!(
                file_name = %self.file_name,
                state = state.name(),
                "Upload task advanced"
            );
        }
    }

    async fn advance(&mut self, state: TaskState) -> TaskState {
        match state {
            TaskState::ResolvingPayload(source) => match self.resolve(source).await {
                Ok(payload) => TaskState::AwaitingCredential(payload),
                Err(e) => TaskState::Terminal(Err(e)),
            },
            TaskState::AwaitingCredential(payload) => {
                let request = CredentialRequest {
                    file_name: self.file_name.clone(),
                    file_type: self.mime_type.clone(),
                    file_size: self.size_bytes,
                };
                match self.transport.request_credential(&request).await {
                    Ok(credential) => TaskState::AwaitingTransfer {
                        credential,
                        payload,
                    },
                    Err(e) => TaskState::Terminal(Err(e)),
                }
            }
            TaskState::AwaitingTransfer {
                credential,
                payload,
            } => TaskState::Terminal(
                self.transport
                    .transfer(credential, payload, &self.mime_type)
                    .await,
            ),
            terminal @ TaskState::Terminal(_) => terminal,
        }
    }

    async fn resolve(&mut self, source: PayloadSource) -> UploadResult<Payload> {
        match source {
            PayloadSource::Bytes(data) => Ok(Payload::Bytes(data)),
            PayloadSource::File(path) => {
                let size = file_size(&path).await?;
                self.resize(size)?;
                Ok(Payload::File { path, size })
            }
            PayloadSource::RemoteUrl(url) => {
                let data = self
                    .transport
                    .fetch_remote(&url, self.policy.max_size_bytes())
                    .await?;
                self.resize(data.len() as u64)?;
                Ok(Payload::Bytes(data))
            }
        }
    }

    /// Re-checks the policy against a measured size and adopts it.
    fn resize(&mut self, measured: u64) -> UploadResult<()> {
        if measured != self.size_bytes {
            tracing::debug!(
                file_name = %self.file_name,
                declared = self.size_bytes,
                measured,
                "Payload size differs from declared size"
            );
        }
        self.policy.validate(measured, &self.mime_type)?;
        self.size_bytes = measured;
        Ok(())
    }
}

async fn file_size(path: &Path) -> UploadResult<u64> {
    let metadata = tokio::fs::metadata(path).await.map_err(|e| {
        UploadError::TransferFailed(format!("Failed to read {}: {}", path.display(), e))
    })?;
    if !metadata.is_file() {
        return Err(UploadError::TransferFailed(format!(
            "{} is not a regular file",
            path.display()
        )));
    }
    Ok(metadata.len())
}
