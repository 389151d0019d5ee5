//! Domain models for the upload pipeline.

pub mod presigned_upload;
pub mod upload;

pub use presigned_upload::{CredentialRequest, CredentialResponse, StoredObject, UploadCredential};
pub use upload::{PayloadSource, UploadRecord, UploadRequest, UploadStatus};
