//! Configuration for the feedback service client.
//!
//! Everything that used to be a literal in the submission path (the upload
//! URL, how long to wait) lives in [`ClientConfig`], built via
//! [`ClientConfigBuilder`]. The defaults reproduce the historical behaviour:
//! a local service on port 8000 and no timeout at all.

use crate::error::FeedbackError;
use serde::{Deserialize, Serialize};

/// Upload URL used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/upload/";

/// Configuration for talking to the feedback service.
///
/// Built via [`ClientConfig::builder()`] or using [`ClientConfig::default()`].
///
/// # Example
/// ```rust
/// use tutor_feedback::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .endpoint("http://feedback.internal:8000/upload/")
///     .timeout_secs(120)
///     .build()
///     .unwrap();
/// assert_eq!(config.timeout_secs, Some(120));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Absolute `http`/`https` URL the multipart form is POSTed to.
    /// Default: [`DEFAULT_ENDPOINT`].
    pub endpoint: String,

    /// Whole-request timeout in seconds. Default: `None` (wait indefinitely).
    ///
    /// Feedback generation runs a language model over every answer in the
    /// document and routinely takes minutes. An in-flight request blocks new
    /// submissions until it resolves, so a timeout bounds that wait.
    pub timeout_secs: Option<u64>,

    /// TCP connect timeout in seconds. Default: `None`.
    pub connect_timeout_secs: Option<u64>,

    /// `User-Agent` header sent with each upload.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: None,
            connect_timeout_secs: None,
            user_agent: concat!("tutor-feedback/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = Some(secs);
        self
    }

    pub fn connect_timeout_secs(mut self, secs: u64) -> Self {
        self.config.connect_timeout_secs = Some(secs);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, FeedbackError> {
        let c = &self.config;
        let url = reqwest::Url::parse(&c.endpoint).map_err(|e| {
            FeedbackError::InvalidConfig(format!("endpoint '{}' is not a valid URL: {e}", c.endpoint))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FeedbackError::InvalidConfig(format!(
                "endpoint must use http or https, got '{}'",
                url.scheme()
            )));
        }
        if c.timeout_secs == Some(0) {
            return Err(FeedbackError::InvalidConfig(
                "timeout must be ≥ 1 second".into(),
            ));
        }
        if c.connect_timeout_secs == Some(0) {
            return Err(FeedbackError::InvalidConfig(
                "connect timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_local_service() {
        let config = ClientConfig::default();
        assert_eq!(config.endpoint, "http://localhost:8000/upload/");
        assert_eq!(config.timeout_secs, None);
        assert!(config.user_agent.starts_with("tutor-feedback/"));
    }

    #[test]
    fn builder_rejects_garbage_endpoint() {
        let err = ClientConfig::builder().endpoint("not a url").build().unwrap_err();
        assert!(matches!(err, FeedbackError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_non_http_scheme() {
        let err = ClientConfig::builder()
            .endpoint("ftp://example.com/upload/")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("ftp"), "got: {err}");
    }

    #[test]
    fn builder_rejects_zero_timeout() {
        assert!(ClientConfig::builder().timeout_secs(0).build().is_err());
        assert!(ClientConfig::builder().connect_timeout_secs(0).build().is_err());
    }

    #[test]
    fn config_deserialises_with_partial_fields() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"endpoint":"https://feedback.example/upload/"}"#).unwrap();
        assert_eq!(config.endpoint, "https://feedback.example/upload/");
        assert_eq!(config.timeout_secs, None);
    }
}
