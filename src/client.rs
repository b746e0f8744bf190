//! One-shot entry points.
//!
//! For callers that just want "send this essay, give me the feedback" without
//! managing a [`Session`]. Each call builds a fresh session, submits once and
//! hands back an owned copy of the document; the session (and its handle) is
//! released on return.

use crate::artifact::FeedbackArtifact;
use crate::config::ClientConfig;
use crate::error::FeedbackError;
use crate::session::{Session, SubmitOutcome};
use crate::submission::input::SubmissionInput;
use std::path::{Path, PathBuf};
use tracing::info;

/// Submit `input` to the service in `config` and return the feedback document.
///
/// # Errors
/// - [`FeedbackError::Validation`] if the input is not submittable
/// - [`FeedbackError::Transfer`] if the exchange failed
pub async fn request_feedback(
    input: &SubmissionInput,
    config: &ClientConfig,
) -> Result<FeedbackArtifact, FeedbackError> {
    let session = Session::http(config)?;
    match session.submit(input).await? {
        SubmitOutcome::Ready(handle) => Ok((*session.resolve(&handle)?).clone()),
        SubmitOutcome::Failed(e) => Err(e.into()),
        SubmitOutcome::Rejected => Err(FeedbackError::Internal(
            "fresh session rejected its first submission".into(),
        )),
    }
}

/// Read `document` from disk, request feedback for `student_name`, and save
/// the result to `output` (a directory receives `feedback.docx`).
pub async fn request_feedback_to_file(
    student_name: &str,
    document: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &ClientConfig,
) -> Result<PathBuf, FeedbackError> {
    let input = SubmissionInput::load(student_name, document).await?;
    let artifact = request_feedback(&input, config).await?;
    let path = artifact.save_to(output).await?;
    info!("Feedback for '{}' written to {}", student_name, path.display());
    Ok(path)
}

/// Synchronous wrapper around [`request_feedback`].
///
/// Creates a temporary tokio runtime internally.
pub fn request_feedback_sync(
    input: &SubmissionInput,
    config: &ClientConfig,
) -> Result<FeedbackArtifact, FeedbackError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| FeedbackError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(request_feedback(input, config))
}
