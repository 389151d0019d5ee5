use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Request body sent to the control plane to obtain a pre-signed upload URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRequest {
    /// Original filename
    pub file_name: String,
    /// Content type (MIME type)
    pub file_type: String,
    /// File size in bytes
    pub file_size: u64,
}

/// Control-plane response containing the pre-signed URL and storage location
///
/// Fields default to empty so that a body missing them fails validation
/// instead of failing deserialization with a less useful message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CredentialResponse {
    /// Pre-signed URL for the direct PUT
    #[serde(default)]
    #[validate(url(message = "uploadUrl must be a valid URL"))]
    pub upload_url: String,
    /// Key of the destination object
    #[serde(default)]
    pub file_key: String,
    /// URL the object is readable from once stored
    #[serde(default)]
    #[validate(url(message = "publicUrl must be a valid URL"))]
    pub public_url: String,
}

/// Single-use write credential for one transfer attempt.
///
/// Deliberately not `Clone`: the transport consumes it on transfer, so a
/// credential burned by a failed attempt cannot be presented again.
pub struct UploadCredential {
    write_url: String,
    object_key: String,
    read_url: String,
}

impl UploadCredential {
    pub fn new(write_url: String, object_key: String, read_url: String) -> Self {
        Self {
            write_url,
            object_key,
            read_url,
        }
    }

    pub fn write_url(&self) -> &str {
        &self.write_url
    }

    pub fn object_key(&self) -> &str {
        &self.object_key
    }

    pub fn read_url(&self) -> &str {
        &self.read_url
    }

    /// Consumes the credential once its transfer succeeded.
    pub fn into_stored(self) -> StoredObject {
        StoredObject {
            object_key: self.object_key,
            read_url: self.read_url,
        }
    }
}

// The write URL carries a signature in its query string.
impl fmt::Debug for UploadCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = self
            .write_url
            .split_once('?')
            .map(|(base, _)| format!("{}?<redacted>", base))
            .unwrap_or_else(|| self.write_url.clone());
        f.debug_struct("UploadCredential")
            .field("write_url", &redacted)
            .field("object_key", &self.object_key)
            .field("read_url", &self.read_url)
            .finish()
    }
}

impl TryFrom<CredentialResponse> for UploadCredential {
    type Error = validator::ValidationErrors;

    fn try_from(response: CredentialResponse) -> Result<Self, Self::Error> {
        response.validate()?;
        Ok(UploadCredential::new(
            response.upload_url,
            response.file_key,
            response.public_url,
        ))
    }
}

/// Receipt for an object written to storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub object_key: String,
    pub read_url: String,
}
