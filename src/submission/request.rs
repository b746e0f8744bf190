//! Request building: turn a validated submission into the multipart payload.
//!
//! The payload is kept as plain owned data ([`UploadRequest`]) and only
//! converted into a `reqwest` form at send time. That keeps the builder
//! deterministic and lets tests and alternative transports inspect exactly
//! what would go on the wire.

use super::validate::ValidSubmission;
use reqwest::multipart::{Form, Part};
use tracing::debug;

/// Multipart field carrying the student name.
pub const NAME_FIELD: &str = "name";
/// Multipart field carrying the document.
pub const FILE_FIELD: &str = "file";

/// Immutable two-part upload built from one submit attempt.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadRequest {
    student_name: String,
    file_name: String,
    content: Vec<u8>,
}

impl UploadRequest {
    pub fn student_name(&self) -> &str {
        &self.student_name
    }

    /// Original file name, preserved on the `file` part.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Convert into a `multipart/form-data` body with fields `name` and `file`.
    pub fn into_form(self) -> Form {
        Form::new()
            .text(NAME_FIELD, self.student_name)
            .part(FILE_FIELD, Part::bytes(self.content).file_name(self.file_name))
    }
}

impl std::fmt::Debug for UploadRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadRequest")
            .field("student_name", &self.student_name)
            .field("file_name", &self.file_name)
            .field("content", &format_args!("<{} bytes>", self.content.len()))
            .finish()
    }
}

/// Snapshot a validated submission into an [`UploadRequest`].
///
/// Never fails: every precondition was already checked by
/// [`super::validate::validate`].
pub fn build_request(submission: ValidSubmission<'_>) -> UploadRequest {
    let request = UploadRequest {
        student_name: submission.student_name.to_string(),
        file_name: submission.file.file_name.clone(),
        content: submission.file.bytes.clone(),
    };
    debug!(
        "Built upload for '{}': {} ({} bytes)",
        request.student_name,
        request.file_name,
        request.content.len()
    );
    request
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submission::input::SubmissionInput;
    use crate::submission::validate::validate;

    #[test]
    fn request_mirrors_input() {
        let input = SubmissionInput::with_file("Alice", "essay.docx", b"0123456789".to_vec());
        let request = build_request(validate(&input).unwrap());

        assert_eq!(request.student_name(), "Alice");
        assert_eq!(request.file_name(), "essay.docx");
        assert_eq!(request.content(), b"0123456789");
    }

    #[test]
    fn request_is_deterministic() {
        let input = SubmissionInput::with_file("Alice", "essay.docx", b"abc".to_vec());
        let a = build_request(validate(&input).unwrap());
        let b = build_request(validate(&input).unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn form_has_boundary() {
        let input = SubmissionInput::with_file("Alice", "essay.docx", b"abc".to_vec());
        let form = build_request(validate(&input).unwrap()).into_form();
        assert!(!form.boundary().is_empty());
    }
}
