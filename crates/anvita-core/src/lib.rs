//! Anvita Core Library
//!
//! This crate provides the upload data model, the client-side validation policy,
//! the error taxonomy and client configuration shared by every Anvita component.
//! Nothing in here performs I/O.

pub mod config;
pub mod error;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::ClientConfig;
pub use error::{ErrorMetadata, LogLevel, UploadError, UploadResult};
pub use models::{
    CredentialRequest, CredentialResponse, PayloadSource, StoredObject, UploadCredential,
    UploadRecord, UploadRequest, UploadStatus,
};
pub use validation::{guess_content_type, ValidationError, ValidationPolicy, MAX_UPLOAD_SIZE_BYTES};
