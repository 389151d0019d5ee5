//! Upload transport abstraction
//!
//! Two-step pre-signed URL flow: obtain a write credential from the control
//! plane, then write the bytes straight to the storage target named by that
//! credential. Upload bytes never pass through the control plane.

use anvita_core::{CredentialRequest, StoredObject, UploadCredential, UploadResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;

/// Bytes ready to be written to storage.
#[derive(Debug, Clone)]
pub enum Payload {
    /// In-memory buffer.
    Bytes(Bytes),
    /// Local file streamed from disk; `size` is sent as `Content-Length`.
    File { path: PathBuf, size: u64 },
}

impl Payload {
    pub fn len(&self) -> u64 {
        match self {
            Payload::Bytes(b) => b.len() as u64,
            Payload::File { size, .. } => *size,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Transport used by the upload orchestrator.
///
/// Implemented over HTTP by [`crate::ApiClient`]; tests provide scripted mocks.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    /// Ask the control plane for a single-use write credential.
    async fn request_credential(
        &self,
        request: &CredentialRequest,
    ) -> UploadResult<UploadCredential>;

    /// Write `payload` to the credential's target with an idempotent PUT.
    ///
    /// Consumes the credential: after a failed attempt a new one must be requested.
    async fn transfer(
        &self,
        credential: UploadCredential,
        payload: Payload,
        mime_type: &str,
    ) -> UploadResult<StoredObject>;

    /// Download a remote object so it can be re-uploaded through the same flow.
    ///
    /// Fails with `FileTooLarge` as soon as the body is known to exceed
    /// `max_bytes`, without buffering the rest of it.
    async fn fetch_remote(&self, url: &str, max_bytes: u64) -> UploadResult<Bytes>;
}
