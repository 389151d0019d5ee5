//! Configuration module
//!
//! Client configuration for the control-plane endpoint, session bootstrap and
//! upload pipeline timing.

use std::env;
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:3000";
const DEFAULT_UPLOAD_PATH: &str = "/uploads/presigned";
const COMPLETION_GRACE_MS: u64 = 1000;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Control-plane base URL, without trailing slash
    pub api_url: String,
    /// Path of the credential endpoint relative to `api_url`
    pub upload_path: String,
    /// Bearer token used to start a session, if any
    pub token: Option<String>,
    /// Request timeout; `None` leaves the HTTP client default in place
    pub http_timeout: Option<Duration>,
    /// How long a completed upload stays at 100% before leaving the progress table
    pub completion_grace: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            upload_path: DEFAULT_UPLOAD_PATH.to_string(),
            token: None,
            http_timeout: None,
            completion_grace: Duration::from_millis(COMPLETION_GRACE_MS),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("ANVITA_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let upload_path =
            lookup("ANVITA_UPLOAD_PATH").unwrap_or_else(|| DEFAULT_UPLOAD_PATH.to_string());

        let token = lookup("ANVITA_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let http_timeout = match lookup("ANVITA_HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|e| {
                    anyhow::anyhow!("ANVITA_HTTP_TIMEOUT_SECS must be an integer: {}", e)
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let completion_grace_ms = match lookup("ANVITA_COMPLETION_GRACE_MS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                anyhow::anyhow!("ANVITA_COMPLETION_GRACE_MS must be an integer: {}", e)
            })?,
            None => COMPLETION_GRACE_MS,
        };

        let config = Self {
            api_url,
            upload_path,
            token,
            http_timeout,
            completion_grace: Duration::from_millis(completion_grace_ms),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.api_url.is_empty() {
            return Err(anyhow::anyhow!("ANVITA_API_URL cannot be empty"));
        }
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "ANVITA_API_URL must start with http:// or https://, got {}",
                self.api_url
            ));
        }
        if !self.upload_path.starts_with('/') {
            return Err(anyhow::anyhow!(
                "ANVITA_UPLOAD_PATH must start with '/', got {}",
                self.upload_path
            ));
        }
        if self.http_timeout == Some(Duration::ZERO) {
            return Err(anyhow::anyhow!("ANVITA_HTTP_TIMEOUT_SECS must be greater than 0"));
        }
        Ok(())
    }

    /// Full URL of the credential endpoint.
    pub fn credential_url(&self) -> String {
        format!("{}{}", self.api_url, self.upload_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ClientConfig, anyhow::Error> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.api_url, "http://localhost:3000");
        assert_eq!(config.credential_url(), "http://localhost:3000/uploads/presigned");
        assert!(config.token.is_none());
        assert!(config.http_timeout.is_none());
        assert_eq!(config.completion_grace, Duration::from_millis(1000));
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("ANVITA_API_URL", "https://api.example.com/"),
            ("ANVITA_UPLOAD_PATH", "/v1/upload-url"),
            ("ANVITA_TOKEN", " tok "),
            ("ANVITA_HTTP_TIMEOUT_SECS", "30"),
            ("ANVITA_COMPLETION_GRACE_MS", "250"),
        ])
        .unwrap();
        assert_eq!(config.credential_url(), "https://api.example.com/v1/upload-url");
        assert_eq!(config.token.as_deref(), Some("tok"));
        assert_eq!(config.http_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.completion_grace, Duration::from_millis(250));
    }

    #[test]
    fn blank_token_is_ignored() {
        let config = config_from(&[("ANVITA_TOKEN", "   ")]).unwrap();
        assert!(config.token.is_none());
    }

    #[test]
    fn rejects_bad_timeout() {
        assert!(config_from(&[("ANVITA_HTTP_TIMEOUT_SECS", "soon")]).is_err());
        assert!(config_from(&[("ANVITA_HTTP_TIMEOUT_SECS", "0")]).is_err());
    }

    #[test]
    fn rejects_bad_completion_grace() {
        let err = config_from(&[("ANVITA_COMPLETION_GRACE_MS", "1s")]).unwrap_err();
        assert!(err.to_string().contains("ANVITA_COMPLETION_GRACE_MS"));
        assert!(config_from(&[("ANVITA_COMPLETION_GRACE_MS", "-5")]).is_err());
    }

    #[test]
    fn rejects_non_http_url() {
        assert!(config_from(&[("ANVITA_API_URL", "ftp://example.com")]).is_err());
    }

    #[test]
    fn rejects_relative_upload_path() {
        assert!(config_from(&[("ANVITA_UPLOAD_PATH", "uploads")]).is_err());
    }
}
