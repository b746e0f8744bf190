//! # tutor-feedback
//!
//! Send a student's Word document to a feedback service and collect the
//! annotated document it returns.
//!
//! The service (typically a small HTTP app that runs a language model over
//! every answer and inserts comments) is treated as opaque: this crate posts a
//! multipart form with the student's name and the `.docx`, and offers whatever
//! bytes come back as `feedback.docx`.
//!
//! ## Flow
//!
//! ```text
//! name + .docx
//!  │
//!  ├─ 1. Validate  name present, file present, .docx extension
//!  ├─ 2. Build     multipart form: `name` (text) + `file` (binary)
//!  ├─ 3. Transfer  one POST, response read as raw bytes
//!  ├─ 4. Publish   bytes wrapped as a revocable `blob:` handle
//!  └─ 5. Session   Idle → Submitting → Ready(handle) | Failed(summary)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tutor_feedback::{ClientConfig, Session, SelectedFile, SubmissionInput, SubmitOutcome};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = Session::http(&ClientConfig::default())?;
//!     let file = SelectedFile::from_path("essay.docx").await?;
//!     let input = SubmissionInput::new("Alice", Some(file));
//!
//!     match session.submit(&input).await? {
//!         SubmitOutcome::Ready(_) => {
//!             let path = session.save_download(".").await?;
//!             println!("saved {}", path.display());
//!         }
//!         SubmitOutcome::Failed(e) => eprintln!("Failed to generate feedback: {e}"),
//!         SubmitOutcome::Rejected => unreachable!("nothing else is in flight"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `tutor-feedback` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod artifact;
pub mod client;
pub mod config;
pub mod error;
pub mod observer;
pub mod session;
pub mod submission;
pub mod transfer;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use artifact::{ArtifactStore, FeedbackArtifact, ResourceHandle, DOCX_MIME, SUGGESTED_FILENAME};
pub use client::{request_feedback, request_feedback_sync, request_feedback_to_file};
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_ENDPOINT};
pub use error::{FeedbackError, TransferError, ValidationError};
pub use observer::SessionObserver;
pub use session::{transition, Session, CANCELLED, SessionEvent, SessionSnapshot, SessionState, SubmitOutcome};
pub use submission::input::{SelectedFile, SubmissionInput};
pub use submission::request::{build_request, UploadRequest};
pub use submission::validate::{validate, ValidSubmission, ACCEPTED_EXTENSION};
pub use transfer::{FeedbackService, HttpFeedbackService, ServiceResponse, TransferOrchestrator};
