//! Input validation: decide whether a submission may be attempted at all.
//!
//! Validation is pure and synchronous. A successful check yields a
//! [`ValidSubmission`] borrow, which is the only thing the request builder
//! accepts, so an unchecked input cannot reach the network layer.

use super::input::{SelectedFile, SubmissionInput};
use crate::error::ValidationError;

/// The only document type the feedback service understands.
pub const ACCEPTED_EXTENSION: &str = ".docx";

/// Proof that a [`SubmissionInput`] passed validation.
#[derive(Debug, Clone, Copy)]
pub struct ValidSubmission<'a> {
    pub(crate) student_name: &'a str,
    pub(crate) file: &'a SelectedFile,
}

impl<'a> ValidSubmission<'a> {
    pub fn student_name(&self) -> &'a str {
        self.student_name
    }

    pub fn file(&self) -> &'a SelectedFile {
        self.file
    }
}

/// Check `input` against the submission preconditions.
///
/// Checks run in a fixed order: name, then file presence, then extension.
pub fn validate(input: &SubmissionInput) -> Result<ValidSubmission<'_>, ValidationError> {
    if input.student_name.trim().is_empty() {
        return Err(ValidationError::MissingName);
    }
    let file = input.file.as_ref().ok_or(ValidationError::MissingFile)?;
    if !has_accepted_extension(&file.file_name) {
        return Err(ValidationError::UnsupportedExtension);
    }
    Ok(ValidSubmission {
        student_name: &input.student_name,
        file,
    })
}

/// `true` if `file_name` is `<something>.docx`, ignoring case.
pub fn has_accepted_extension(file_name: &str) -> bool {
    let lower = file_name.to_ascii_lowercase();
    lower.len() > ACCEPTED_EXTENSION.len() && lower.ends_with(ACCEPTED_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, file: Option<&str>) -> SubmissionInput {
        SubmissionInput::new(name, file.map(|f| SelectedFile::new(f, b"0123456789".to_vec())))
    }

    #[test]
    fn accepts_name_and_docx() {
        let i = input("Alice", Some("essay.docx"));
        let valid = validate(&i).unwrap();
        assert_eq!(valid.student_name(), "Alice");
        assert_eq!(valid.file().file_name, "essay.docx");
    }

    #[test]
    fn empty_name_is_missing() {
        assert_eq!(
            validate(&input("", Some("essay.docx"))).unwrap_err(),
            ValidationError::MissingName
        );
        assert_eq!(
            validate(&input("   \t", Some("essay.docx"))).unwrap_err(),
            ValidationError::MissingName
        );
    }

    #[test]
    fn absent_file_is_missing() {
        assert_eq!(
            validate(&input("Alice", None)).unwrap_err(),
            ValidationError::MissingFile
        );
    }

    #[test]
    fn name_is_checked_before_file() {
        assert_eq!(
            validate(&input("", None)).unwrap_err(),
            ValidationError::MissingName
        );
    }

    #[test]
    fn wrong_extension_rejected() {
        for name in ["essay.pdf", "essay.doc", "essay.docx.pdf", "essay", ".docx"] {
            assert_eq!(
                validate(&input("Bob", Some(name))).unwrap_err(),
                ValidationError::UnsupportedExtension,
                "{name}"
            );
        }
    }

    #[test]
    fn extension_ignores_case() {
        assert!(has_accepted_extension("ESSAY.DOCX"));
        assert!(has_accepted_extension("Unit 3.Docx"));
    }
}
