//! Error types module
//!
//! All upload failures are unified under [`UploadError`]. None of them is fatal to
//! the process: each one aborts a single file, and the caller may retry with a new
//! submission.

use crate::validation::ValidationError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like a rejected transfer
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be presented and logged
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "TRANSFER_FAILED")
    fn error_code(&self) -> &'static str;

    /// Whether a fresh submission of the same file may succeed
    fn is_recoverable(&self) -> bool;

    /// Message shown inline next to the failed file
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum UploadError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Credential request failed: {0}")]
    CredentialRequestFailed(String),

    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Session is not active")]
    SessionInactive,
}

pub type UploadResult<T> = Result<T, UploadError>;

/// Static metadata for each variant: (error_code, recoverable, log_level).
fn upload_error_static_metadata(err: &UploadError) -> (&'static str, bool, LogLevel) {
    match err {
        UploadError::Validation(ValidationError::FileTooLarge { .. }) => {
            ("FILE_TOO_LARGE", false, LogLevel::Debug)
        }
        UploadError::Validation(ValidationError::UnsupportedType(_)) => {
            ("UNSUPPORTED_TYPE", false, LogLevel::Debug)
        }
        UploadError::Validation(ValidationError::EmptyFileName) => {
            ("EMPTY_FILE_NAME", false, LogLevel::Debug)
        }
        UploadError::CredentialRequestFailed(_) => {
            ("CREDENTIAL_REQUEST_FAILED", true, LogLevel::Error)
        }
        UploadError::TransferFailed(_) => ("TRANSFER_FAILED", true, LogLevel::Warn),
        UploadError::NetworkError(_) => ("NETWORK_ERROR", true, LogLevel::Warn),
        UploadError::SessionInactive => ("SESSION_INACTIVE", false, LogLevel::Warn),
    }
}

impl ErrorMetadata for UploadError {
    fn error_code(&self) -> &'static str {
        upload_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        upload_error_static_metadata(self).1
    }

    fn log_level(&self) -> LogLevel {
        upload_error_static_metadata(self).2
    }

    fn client_message(&self) -> String {
        match self {
            UploadError::Validation(ValidationError::FileTooLarge { max, .. }) => {
                format!("File size must be less than {}MB", max / (1024 * 1024))
            }
            UploadError::Validation(ValidationError::UnsupportedType(_)) => {
                "Unsupported file type.".to_string()
            }
            UploadError::Validation(ValidationError::EmptyFileName) => {
                "File name is required.".to_string()
            }
            UploadError::CredentialRequestFailed(ref msg) => msg.clone(),
            UploadError::TransferFailed(_) => "Failed to upload file to storage".to_string(),
            UploadError::NetworkError(_) => "Network error, please try again".to_string(),
            UploadError::SessionInactive => "Please sign in to upload files".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_file_too_large() {
        let err = UploadError::from(ValidationError::FileTooLarge {
            size: 150 * 1024 * 1024,
            max: 100 * 1024 * 1024,
        });
        assert_eq!(err.error_code(), "FILE_TOO_LARGE");
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "File size must be less than 100MB");
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_error_metadata_credential_failure() {
        let err = UploadError::CredentialRequestFailed("status 500".to_string());
        assert_eq!(err.error_code(), "CREDENTIAL_REQUEST_FAILED");
        assert!(err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Error);
        assert_eq!(err.to_string(), "Credential request failed: status 500");
    }

    #[test]
    fn test_error_metadata_transfer_failure() {
        let err = UploadError::TransferFailed("status 403".to_string());
        assert_eq!(err.error_code(), "TRANSFER_FAILED");
        assert!(err.is_recoverable());
        assert_eq!(err.client_message(), "Failed to upload file to storage");
    }

    #[test]
    fn test_validation_display_is_transparent() {
        let err = UploadError::from(ValidationError::UnsupportedType("image/png".to_string()));
        assert_eq!(err.to_string(), "Unsupported file type: image/png");
        assert_eq!(err.error_code(), "UNSUPPORTED_TYPE");
    }

    #[test]
    fn test_session_inactive_not_recoverable() {
        let err = UploadError::SessionInactive;
        assert!(!err.is_recoverable());
        assert_eq!(err.error_code(), "SESSION_INACTIVE");
    }
}
