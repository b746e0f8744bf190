//! Session: the state machine that owns one user's submit/download cycle.
//!
//! ```text
//!   Idle ──submit──▶ Submitting ──ok───▶ Ready(handle)
//!    ▲                 ▲    │                 │
//!    │                 │    └──err──▶ Failed(summary)
//!    │                 │                      │
//!    │                 └─────── submit ───────┤  (revokes any old handle)
//!    └──────────────────────── end ───────────┘
//! ```
//!
//! [`transition`] is a pure function over [`SessionState`] and
//! [`SessionEvent`]; [`Session`] is the single controller that applies it,
//! performs the side effects (dispatching the request, publishing and
//! revoking artifacts) and tells the observer.
//!
//! ## One request at a time
//!
//! `Submitting` rejects further submits, so at most one exchange is in flight
//! per session. The state and the artifact store share one lock: a handle is
//! revoked in the same critical section that moves the state away from
//! `Ready`, so no observer ever sees two current handles. The lock is never
//! held across the network `.await`.

use crate::artifact::{ArtifactStore, FeedbackArtifact, ResourceHandle};
use crate::config::ClientConfig;
use crate::error::{FeedbackError, TransferError, ValidationError};
use crate::observer::SessionObserver;
use crate::submission::input::SubmissionInput;
use crate::submission::request::build_request;
use crate::submission::validate::validate;
use crate::transfer::{FeedbackService, TransferOrchestrator};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Where the session currently is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum SessionState {
    /// Nothing submitted yet, or the session was ended.
    #[default]
    Idle,
    /// A request is in flight; new submissions are ignored.
    Submitting,
    /// The last request succeeded; the handle resolves to its document.
    Ready(ResourceHandle),
    /// The last request failed; holds a human-readable summary.
    Failed(String),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Submitting => "submitting",
            SessionState::Ready(_) => "ready",
            SessionState::Failed(_) => "failed",
        }
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, SessionState::Submitting)
    }

    /// `Idle`, `Ready` and `Failed` accept a new submission.
    pub fn accepts_submission(&self) -> bool {
        !self.is_submitting()
    }

    pub fn handle(&self) -> Option<&ResourceHandle> {
        match self {
            SessionState::Ready(h) => Some(h),
            _ => None,
        }
    }

    pub fn error_summary(&self) -> Option<&str> {
        match self {
            SessionState::Failed(s) => Some(s),
            _ => None,
        }
    }
}

/// Inputs to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A validated submission wants to start.
    Submit,
    /// The exchange succeeded and its artifact was published.
    Succeeded(ResourceHandle),
    /// The exchange failed.
    TransferFailed(String),
    /// The session is being closed.
    End,
}

/// Next state for `event` in `state`, or `None` if the event is not legal there.
pub fn transition(state: &SessionState, event: SessionEvent) -> Option<SessionState> {
    use SessionEvent as E;
    use SessionState as S;
    match (state, event) {
        (S::Submitting, E::Submit) => None,
        (_, E::Submit) => Some(S::Submitting),
        (S::Submitting, E::Succeeded(handle)) => Some(S::Ready(handle)),
        (S::Submitting, E::TransferFailed(summary)) => Some(S::Failed(summary)),
        (_, E::Succeeded(_) | E::TransferFailed(_)) => None,
        (S::Submitting, E::End) => None,
        (_, E::End) => Some(S::Idle),
    }
}

/// Failure summary left behind when a `submit` future is dropped in flight.
pub const CANCELLED: &str = "submission cancelled";

/// What a call to [`Session::submit`] ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The document is ready; the session is in `Ready(handle)`.
    Ready(ResourceHandle),
    /// The exchange failed; the session is in `Failed`.
    Failed(TransferError),
    /// Another request was in flight; nothing was sent.
    Rejected,
}

/// Serialisable view of a session for logs and JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub state: &'static str,
    pub download_url: Option<String>,
    pub filename: Option<&'static str>,
    pub error: Option<String>,
    pub live_handles: usize,
    pub requests_sent: u64,
}

struct Inner {
    state: SessionState,
    store: ArtifactStore,
    requests_sent: u64,
}

/// The single controller for one user's session.
pub struct Session {
    orchestrator: TransferOrchestrator,
    inner: Mutex<Inner>,
    observer: Option<Arc<dyn SessionObserver>>,
}

impl Session {
    pub fn new(orchestrator: TransferOrchestrator) -> Self {
        Self {
            orchestrator,
            inner: Mutex::new(Inner {
                state: SessionState::Idle,
                store: ArtifactStore::new(),
                requests_sent: 0,
            }),
            observer: None,
        }
    }

    /// Session talking HTTP to the endpoint in `config`.
    pub fn http(config: &ClientConfig) -> Result<Self, FeedbackError> {
        Ok(Self::new(TransferOrchestrator::http(config)?))
    }

    /// Session over any [`FeedbackService`].
    pub fn with_service(service: Arc<dyn FeedbackService>) -> Self {
        Self::new(TransferOrchestrator::new(service))
    }

    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, from: &SessionState, to: &SessionState) {
        debug!("Session {} -> {}", from.name(), to.name());
        if let Some(ref obs) = self.observer {
            obs.on_state_change(from, to);
        }
    }

    pub fn state(&self) -> SessionState {
        self.lock().state.clone()
    }

    /// `true` if `input` is valid and no request is in flight.
    ///
    /// A front end uses this to enable or disable its submit action.
    pub fn can_submit(&self, input: &SubmissionInput) -> bool {
        validate(input).is_ok() && self.lock().state.accepts_submission()
    }

    /// Validate `input`, send it, and wait for the outcome.
    ///
    /// Validation failures return `Err` before any state change or network
    /// activity. Transfer failures do not: they become
    /// `Ok(SubmitOutcome::Failed)` with the session in `Failed`. A call made
    /// while another is in flight returns `Ok(SubmitOutcome::Rejected)` and
    /// sends nothing.
    ///
    /// Dropping the returned future while the exchange is pending moves the
    /// session to `Failed` with the summary [`CANCELLED`].
    pub async fn submit(&self, input: &SubmissionInput) -> Result<SubmitOutcome, ValidationError> {
        let valid = validate(input)?;

        let from = {
            let mut inner = self.lock();
            match transition(&inner.state, SessionEvent::Submit) {
                Some(next) => {
                    if let Some(old) = inner.state.handle().cloned() {
                        inner.store.revoke(&old);
                    }
                    inner.requests_sent += 1;
                    Some(std::mem::replace(&mut inner.state, next))
                }
                None => None,
            }
        };
        let Some(from) = from else {
            warn!("Submission ignored: a request is already in flight");
            if let Some(ref obs) = self.observer {
                obs.on_submit_rejected();
            }
            return Ok(SubmitOutcome::Rejected);
        };
        self.notify(&from, &SessionState::Submitting);

        let mut guard = InFlight {
            session: self,
            armed: true,
        };
        let request = build_request(valid);
        let result = self.orchestrator.dispatch(request).await;
        guard.armed = false;

        let (outcome, to) = {
            let mut inner = self.lock();
            let (event, outcome) = match result {
                Ok(response) => {
                    let handle = inner.store.publish(response);
                    (
                        SessionEvent::Succeeded(handle.clone()),
                        SubmitOutcome::Ready(handle),
                    )
                }
                Err(e) => (
                    SessionEvent::TransferFailed(e.to_string()),
                    SubmitOutcome::Failed(e),
                ),
            };
            match transition(&inner.state, event) {
                Some(next) => inner.state = next,
                None => {
                    // Only this call or its drop guard leaves `Submitting`.
                    warn!("Dropping result: session left 'submitting' unexpectedly");
                    if let SubmitOutcome::Ready(ref h) = outcome {
                        inner.store.revoke(h);
                    }
                }
            }
            (outcome, inner.state.clone())
        };
        self.notify(&SessionState::Submitting, &to);

        match &outcome {
            SubmitOutcome::Ready(h) => info!("Feedback ready at {}", h),
            SubmitOutcome::Failed(e) => warn!("Failed to generate feedback: {}", e),
            SubmitOutcome::Rejected => {}
        }
        Ok(outcome)
    }

    /// Handle for the current document, if the session is `Ready`.
    pub fn current_handle(&self) -> Option<ResourceHandle> {
        self.lock().state.handle().cloned()
    }

    /// Resolve any handle this session issued, unless revoked.
    pub fn resolve(&self, handle: &ResourceHandle) -> Result<Arc<FeedbackArtifact>, FeedbackError> {
        self.lock().store.resolve(handle)
    }

    /// The current document.
    pub fn download(&self) -> Result<Arc<FeedbackArtifact>, FeedbackError> {
        let inner = self.lock();
        let handle = inner
            .state
            .handle()
            .ok_or(FeedbackError::NothingToDownload)?;
        inner.store.resolve(handle)
    }

    /// Save the current document to `path` (a directory receives `feedback.docx`).
    pub async fn save_download(&self, path: impl AsRef<Path>) -> Result<PathBuf, FeedbackError> {
        let artifact = self.download()?;
        artifact.save_to(path).await
    }

    /// End the session: revoke every handle and return to `Idle`.
    ///
    /// Returns `false` (and changes nothing) while a request is in flight.
    pub fn end(&self) -> bool {
        let from = {
            let mut inner = self.lock();
            let Some(next) = transition(&inner.state, SessionEvent::End) else {
                return false;
            };
            let released = inner.store.revoke_all();
            debug!("Session ended, released {} handle(s)", released);
            std::mem::replace(&mut inner.state, next)
        };
        self.notify(&from, &SessionState::Idle);
        true
    }

    /// Handles that still resolve. Never more than one.
    pub fn live_handles(&self) -> usize {
        self.lock().store.live_count()
    }

    /// Exchanges dispatched over the session's lifetime.
    pub fn requests_sent(&self) -> u64 {
        self.lock().requests_sent
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.lock();
        SessionSnapshot {
            state: inner.state.name(),
            download_url: inner.state.handle().map(|h| h.url().to_string()),
            filename: inner.state.handle().map(|h| h.filename()),
            error: inner.state.error_summary().map(str::to_string),
            live_handles: inner.store.live_count(),
            requests_sent: inner.requests_sent,
        }
    }
}

/// Fails the session if a `submit` future is dropped mid-exchange.
struct InFlight<'a> {
    session: &'a Session,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let to = {
            let mut inner = self.session.lock();
            match transition(
                &inner.state,
                SessionEvent::TransferFailed(CANCELLED.to_string()),
            ) {
                Some(next) => {
                    inner.state = next.clone();
                    next
                }
                None => return,
            }
        };
        warn!("Submission dropped before the service answered");
        self.session.notify(&SessionState::Submitting, &to);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let inner = self
            .inner
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        inner.store.revoke_all();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("orchestrator", &self.orchestrator)
            .field("state", &self.lock().state)
            .finish()
    }
}
