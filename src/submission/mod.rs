//! Submission stages: from raw user input to a ready-to-send upload.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ validate ──▶ request
//! (name + file)  (preconditions)  (multipart body)
//! ```
//!
//! 1. [`input`]    — the user's name and selected document, optionally loaded
//!    from disk
//! 2. [`validate`] — pure precondition checks; nothing leaves this stage
//!    unless it passes
//! 3. [`request`]  — the immutable two-part multipart payload handed to the
//!    transfer layer

pub mod input;
pub mod request;
pub mod validate;
