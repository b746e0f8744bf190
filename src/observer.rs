//! Observer trait for session state changes.
//!
//! Inject an [`Arc<dyn SessionObserver>`] via [`crate::Session::with_observer`]
//! to be told whenever the session moves between `Idle`, `Submitting`,
//! `Ready` and `Failed`. This is how a front end drives its in-progress
//! indicator, disables its submit button and shows the download link,
//! without the library knowing anything about how it renders.
//!
//! # Example
//!
//! ```rust
//! use tutor_feedback::{SessionObserver, SessionState};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct CountingObserver {
//!     transitions: AtomicUsize,
//! }
//!
//! impl SessionObserver for CountingObserver {
//!     fn on_state_change(&self, from: &SessionState, to: &SessionState) {
//!         self.transitions.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{} -> {}", from.name(), to.name());
//!     }
//! }
//! ```

use crate::session::SessionState;

/// Called by a [`crate::Session`] as its state changes.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Methods are invoked after the session's internal
/// lock is released, in transition order; an observer may call back into the
/// session (for example to resolve the new handle).
pub trait SessionObserver: Send + Sync {
    /// Called once per transition.
    fn on_state_change(&self, from: &SessionState, to: &SessionState) {
        let _ = (from, to);
    }

    /// Called when a submit was ignored because a request is in flight.
    fn on_submit_rejected(&self) {}
}
