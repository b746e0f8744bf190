//! User input: the student's name and the selected document.
//!
//! The document is held in memory as raw bytes plus its original file name.
//! That mirrors what a browser file picker hands over and keeps the request
//! builder free of I/O.

use super::validate::validate;
use crate::error::{FeedbackError, ValidationError};
use std::fmt;
use std::path::Path;
use tracing::debug;

/// A document selected for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct SelectedFile {
    /// Original file name, sent to the service unchanged.
    pub file_name: String,
    /// Raw file content.
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a document from disk, keeping its final path component as the
    /// file name.
    ///
    /// The extension is not checked here; that is the validator's job, so a
    /// wrong file type surfaces as [`crate::ValidationError::UnsupportedExtension`]
    /// rather than an I/O error.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, FeedbackError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| FeedbackError::FileNotFound {
                path: path.to_path_buf(),
            })?;

        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FeedbackError::FileNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => FeedbackError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => FeedbackError::FileReadFailed {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        debug!("Loaded {} ({} bytes)", path.display(), bytes.len());
        Ok(Self { file_name, bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedFile")
            .field("file_name", &self.file_name)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .finish()
    }
}

/// What the user has entered so far. Either field may still be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionInput {
    pub student_name: String,
    pub file: Option<SelectedFile>,
}

impl SubmissionInput {
    pub fn new(student_name: impl Into<String>, file: Option<SelectedFile>) -> Self {
        Self {
            student_name: student_name.into(),
            file,
        }
    }

    /// Name plus an in-memory document.
    pub fn with_file(
        student_name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self::new(student_name, Some(SelectedFile::new(file_name, bytes)))
    }

    /// Name plus a document read from disk.
    ///
    /// The name is checked before the file is touched, so an empty name is
    /// reported as [`ValidationError::MissingName`] even if `path` is missing.
    pub async fn load(
        student_name: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<Self, FeedbackError> {
        let mut input = Self::new(student_name, None);
        if let Err(e @ ValidationError::MissingName) = validate(&input) {
            return Err(e.into());
        }
        input.file = Some(SelectedFile::from_path(path).await?);
        Ok(input)
    }
}
