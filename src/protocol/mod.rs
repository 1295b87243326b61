//! Suspend a computation on a form and resume it with one conforming
//! submission.
//!
//! A [`PendingRequest`] is an explicit state machine:
//!
//! ```text
//! Built -> AwaitingSubmission -> (Validating -> AwaitingSubmission)* -> Resolved
//! ```
//!
//! The driver reads [`Emission`]s and writes [`Submission`]s; it never touches
//! the request's state directly. What a field is and how values are checked
//! is left to the [`Resolve`] implementation.

pub mod session;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

use crate::error::{StaleReason, StaleSubmissionError};
use crate::model::FormSpec;

static NEXT_REQUEST: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(u64);

impl RequestId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    fn next() -> Self {
        Self(NEXT_REQUEST.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "request #{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    Built,
    AwaitingSubmission,
    Validating,
    Resolved,
}

impl std::fmt::Display for RequestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            RequestState::Built => "built",
            RequestState::AwaitingSubmission => "awaiting submission",
            RequestState::Validating => "validating",
            RequestState::Resolved => "resolved",
        })
    }
}

/// What a conforming submission payload looks like.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadShape {
    /// One raw value for a standalone field.
    Value,
    /// A name to raw value object for a group.
    Mapping,
}

/// One form the driver must render.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Emission {
    pub request: RequestId,
    pub revision: u32,
    pub expects: PayloadShape,
    pub form: FormSpec,
}

/// The driver's answer to an [`Emission`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub request: RequestId,
    pub revision: u32,
    #[serde(default)]
    pub payload: JsonValue,
}

impl Submission {
    pub fn new(request: RequestId, revision: u32, payload: JsonValue) -> Self {
        Self {
            request,
            revision,
            payload,
        }
    }

    /// A submission addressed to the given emission.
    pub fn answering(emission: &Emission, payload: JsonValue) -> Self {
        Self::new(emission.request, emission.revision, payload)
    }
}

/// Outcome of checking one payload.
#[derive(Debug)]
pub enum Verdict<T> {
    Accept(T),
    /// Show this form again: same fields, error attached, entries preserved.
    Reject(FormSpec),
}

/// Field semantics plugged into a [`PendingRequest`].
pub trait Resolve {
    type Output;

    fn shape(&self) -> PayloadShape;

    /// The form shown before any submission.
    fn form(&self) -> FormSpec;

    /// Check a payload against the form currently shown.
    fn resolve(&mut self, shown: &FormSpec, payload: JsonValue) -> Verdict<Self::Output>;
}

#[derive(Debug)]
pub enum Step<T> {
    /// Rejected; render this and wait for the next submission.
    Display(Emission),
    Resolved(T),
}

pub struct PendingRequest<R> {
    id: RequestId,
    revision: u32,
    state: RequestState,
    current: FormSpec,
    resolver: R,
}

impl<R: Resolve> PendingRequest<R> {
    pub fn new(resolver: R) -> Self {
        let current = resolver.form();
        Self {
            id: RequestId::next(),
            revision: 0,
            state: RequestState::Built,
            current,
            resolver,
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn revision(&self) -> u32 {
        self.revision
    }

    pub fn form(&self) -> &FormSpec {
        &self.current
    }

    fn emission(&self) -> Emission {
        Emission {
            request: self.id,
            revision: self.revision,
            expects: self.resolver.shape(),
            form: self.current.clone(),
        }
    }

    fn stale(&self, submission: &Submission, reason: StaleReason) -> StaleSubmissionError {
        warn!(
            request = %self.id,
            got_request = submission.request.get(),
            got_revision = submission.revision,
            %reason,
            "rejecting stale submission"
        );
        StaleSubmissionError {
            request: submission.request,
            revision: submission.revision,
            reason,
        }
    }

    /// Suspend on the form. Calling it again while awaiting returns the same
    /// emission without changing state.
    pub fn present(&mut self) -> Result<Emission, StaleSubmissionError> {
        match self.state {
            RequestState::Built => {
                self.state = RequestState::AwaitingSubmission;
                debug!(request = %self.id, label = %self.current.label, "form emitted");
                Ok(self.emission())
            }
            RequestState::AwaitingSubmission => Ok(self.emission()),
            state => Err(StaleSubmissionError {
                request: self.id,
                revision: self.revision,
                reason: StaleReason::NotAwaiting(state),
            }),
        }
    }

    /// Deliver one submission. Resumes at most once; anything not addressed to
    /// the current emission is refused without touching state.
    pub fn deliver(
        &mut self,
        submission: Submission,
    ) -> Result<Step<R::Output>, StaleSubmissionError> {
        if submission.request != self.id {
            return Err(self.stale(
                &submission,
                StaleReason::UnknownRequest { current: self.id },
            ));
        }
        if self.state != RequestState::AwaitingSubmission {
            return Err(self.stale(&submission, StaleReason::NotAwaiting(self.state)));
        }
        if submission.revision != self.revision {
            return Err(self.stale(
                &submission,
                StaleReason::OutdatedRevision {
                    current: self.revision,
                },
            ));
        }
        let shape = self.resolver.shape();
        if shape == PayloadShape::Mapping && !submission.payload.is_object() {
            return Err(self.stale(&submission, StaleReason::PayloadShape));
        }

        self.state = RequestState::Validating;
        match self.resolver.resolve(&self.current, submission.payload) {
            Verdict::Accept(out) => {
                self.state = RequestState::Resolved;
                info!(request = %self.id, revision = self.revision, "request resolved");
                Ok(Step::Resolved(out))
            }
            Verdict::Reject(form) => {
                self.revision += 1;
                self.current = form;
                self.state = RequestState::AwaitingSubmission;
                debug!(
                    request = %self.id,
                    revision = self.revision,
                    error = ?self.current.error,
                    "submission rejected, form re-emitted"
                );
                Ok(Step::Display(self.emission()))
            }
        }
    }
}
