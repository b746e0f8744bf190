//! Error types for the tutor-feedback library.
//!
//! Three error types reflect three distinct failure modes:
//!
//! * [`ValidationError`] — the user's input cannot be submitted (no name, no
//!   file, wrong file type). Detected before any network activity and fixed by
//!   correcting the input.
//!
//! * [`TransferError`] — the exchange with the feedback service failed
//!   (connection refused, timeout, non-success status). Caught at the
//!   orchestrator boundary and recorded as the session's `Failed` state;
//!   the user must resubmit.
//!
//! * [`FeedbackError`] — everything else a caller can hit around the
//!   exchange: loading the document from disk, saving the result, asking for
//!   a handle that was already revoked, bad configuration. Wraps the other two
//!   via `From` so `?` works across layers.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the tutor-feedback library outside the session's
/// own state reporting.
#[derive(Debug, Error)]
pub enum FeedbackError {
    // ── Submission errors ─────────────────────────────────────────────────
    /// The input failed a submission precondition.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The exchange with the feedback service failed.
    #[error(transparent)]
    Transfer(#[from] TransferError),

    // ── Input file errors ─────────────────────────────────────────────────
    /// Document was not found at the given path.
    #[error("Document not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the document.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The document exists but could not be read.
    #[error("Failed to read '{path}': {source}")]
    FileReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Download errors ───────────────────────────────────────────────────
    /// Could not create or write the downloaded feedback file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The handle was superseded or the session ended.
    #[error("Resource '{url}' has been revoked")]
    HandleRevoked { url: String },

    /// A download was requested while the session holds no artifact.
    #[error("No feedback document is ready for download")]
    NothingToDownload,

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A submission precondition that the input does not meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationError {
    /// The student name is empty or whitespace only.
    #[error("Student name is required")]
    MissingName,

    /// No document was selected.
    #[error("A document must be selected")]
    MissingFile,

    /// The selected document is not a `.docx` file.
    #[error("Only .docx documents are accepted")]
    UnsupportedExtension,
}

/// Failure of the single network exchange with the feedback service.
///
/// Holds plain strings rather than the underlying `reqwest::Error` so it can
/// be cloned into the session state and serialised for JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransferError {
    /// The service could not be reached.
    #[error("Could not connect to '{endpoint}': {reason}\nIs the feedback service running?")]
    Connect { endpoint: String, reason: String },

    /// The request exceeded the configured timeout.
    #[error("Request to '{endpoint}' timed out after {secs}s")]
    Timeout { endpoint: String, secs: u64 },

    /// Any other transport-level failure.
    #[error("Network error talking to '{endpoint}': {reason}")]
    Network { endpoint: String, reason: String },

    /// The service answered with a non-success status.
    #[error("Feedback service returned HTTP {status}: {reason}")]
    Status { status: u16, reason: String },

    /// The status was fine but the body could not be read to the end.
    #[error("Failed to read response body: {reason}")]
    Body { reason: String },
}

impl TransferError {
    /// HTTP status code, when the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransferError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
