//! Transfer: the single network exchange with the feedback service.
//!
//! The service is reached through the [`FeedbackService`] trait so the
//! session does not care whether bytes travel over HTTP or come from an
//! in-process fake. [`HttpFeedbackService`] is the real implementation;
//! [`TransferOrchestrator`] wraps any service with logging, timing and
//! outcome classification.
//!
//! ## No retries
//!
//! Generating feedback is expensive and not idempotent from the user's point
//! of view, so a failed exchange is reported once and the user decides
//! whether to resubmit.

use crate::artifact::DOCX_MIME;
use crate::config::ClientConfig;
use crate::error::{FeedbackError, TransferError};
use crate::submission::request::UploadRequest;
use async_trait::async_trait;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Raw answer from the service. The body is never parsed.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceResponse {
    pub bytes: Vec<u8>,
    /// `Content-Type` as sent by the service, if any.
    pub content_type: Option<String>,
    /// File name from `Content-Disposition`, if any.
    pub filename: Option<String>,
}

impl ServiceResponse {
    /// A bare body with no metadata, as an in-process service would return.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: None,
            filename: None,
        }
    }
}

impl std::fmt::Debug for ServiceResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceResponse")
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .field("content_type", &self.content_type)
            .field("filename", &self.filename)
            .finish()
    }
}

/// Something that turns an upload into a feedback document.
///
/// Implementations perform exactly one exchange per call and must not retry.
#[async_trait]
pub trait FeedbackService: Send + Sync {
    async fn upload(&self, request: UploadRequest) -> Result<ServiceResponse, TransferError>;

    /// Where uploads go; used in log lines.
    fn endpoint(&self) -> &str {
        "<in-process>"
    }
}

/// [`FeedbackService`] over HTTP: `POST` a multipart form, read the body as bytes.
#[derive(Debug, Clone)]
pub struct HttpFeedbackService {
    client: reqwest::Client,
    endpoint: String,
    timeout_secs: Option<u64>,
    connect_timeout_secs: Option<u64>,
}

impl HttpFeedbackService {
    pub fn new(config: &ClientConfig) -> Result<Self, FeedbackError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = config.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| FeedbackError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            timeout_secs: config.timeout_secs,
            connect_timeout_secs: config.connect_timeout_secs,
        })
    }

    /// Seconds of the limit that fired: the connect timeout while
    /// connecting, the overall one otherwise.
    fn applied_timeout(&self, connecting: bool) -> u64 {
        let (first, second) = if connecting {
            (self.connect_timeout_secs, self.timeout_secs)
        } else {
            (self.timeout_secs, self.connect_timeout_secs)
        };
        first.or(second).unwrap_or(0)
    }

    fn classify(&self, e: reqwest::Error) -> TransferError {
        if e.is_timeout() {
            TransferError::Timeout {
                endpoint: self.endpoint.clone(),
                secs: self.applied_timeout(e.is_connect()),
            }
        } else if e.is_connect() {
            TransferError::Connect {
                endpoint: self.endpoint.clone(),
                reason: e.to_string(),
            }
        } else {
            TransferError::Network {
                endpoint: self.endpoint.clone(),
                reason: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl FeedbackService for HttpFeedbackService {
    async fn upload(&self, request: UploadRequest) -> Result<ServiceResponse, TransferError> {
        let response = self
            .client
            .post(self.endpoint.as_str())
            .multipart(request.into_form())
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::Status {
                status: status.as_u16(),
                reason: status
                    .canonical_reason()
                    .unwrap_or("unknown status")
                    .to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(extract_filename);

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                self.classify(e)
            } else {
                TransferError::Body {
                    reason: e.to_string(),
                }
            }
        })?;

        Ok(ServiceResponse {
            bytes: bytes.to_vec(),
            content_type,
            filename,
        })
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Drives one exchange per call and classifies the outcome.
///
/// The orchestrator is stateless; the one-in-flight rule is enforced by the
/// session that owns it.
#[derive(Clone)]
pub struct TransferOrchestrator {
    service: Arc<dyn FeedbackService>,
}

impl TransferOrchestrator {
    pub fn new(service: Arc<dyn FeedbackService>) -> Self {
        Self { service }
    }

    /// Orchestrator over [`HttpFeedbackService`] built from `config`.
    pub fn http(config: &ClientConfig) -> Result<Self, FeedbackError> {
        Ok(Self::new(Arc::new(HttpFeedbackService::new(config)?)))
    }

    pub fn endpoint(&self) -> &str {
        self.service.endpoint()
    }

    /// Send `request` and wait for the service to answer.
    pub async fn dispatch(&self, request: UploadRequest) -> Result<ServiceResponse, TransferError> {
        let start = Instant::now();
        info!(
            "Uploading {} for '{}' to {}",
            request.file_name(),
            request.student_name(),
            self.service.endpoint()
        );

        match self.service.upload(request).await {
            Ok(response) => {
                debug!(
                    "Received {} bytes in {}ms",
                    response.bytes.len(),
                    start.elapsed().as_millis()
                );
                if let Some(ct) = response.content_type.as_deref() {
                    if !is_docx_content_type(ct) {
                        warn!("Unexpected content type '{}' from feedback service", ct);
                    }
                }
                Ok(response)
            }
            Err(e) => {
                warn!("Upload failed after {}ms — {}", start.elapsed().as_millis(), e);
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for TransferOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferOrchestrator")
            .field("endpoint", &self.service.endpoint())
            .finish()
    }
}

/// `true` if the media type of `content_type` is [`DOCX_MIME`], ignoring
/// case and parameters.
fn is_docx_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .eq_ignore_ascii_case(DOCX_MIME)
}

/// Pull the `filename` parameter out of a `Content-Disposition` value.
fn extract_filename(disposition: &str) -> Option<String> {
    disposition.split(';').find_map(|param| {
        let (key, value) = param.trim().split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("filename") {
            return None;
        }
        let value = value.trim().trim_matches('"');
        (!value.is_empty()).then(|| value.to_string())
    })
}
