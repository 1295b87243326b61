use crate::protocol::{RequestId, RequestState};
use thiserror::Error;

/// A malformed field, option or button declaration. Raised while the form is
/// being built and never deferred to submission time.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpecificationError {
    #[error("{what} item #{index} must have value and label key")]
    OptionMissingKey { what: &'static str, index: usize },

    #[error("{what} item #{index} format error: expected 2 to {max} elements, got {len}")]
    OptionArity {
        what: &'static str,
        index: usize,
        len: usize,
        max: usize,
    },

    #[error("{what} item #{index}: '{key}' must be a boolean")]
    OptionFlag {
        what: &'static str,
        index: usize,
        key: &'static str,
    },

    #[error("input type not allowed: '{0}'")]
    UnsupportedKind(String),

    #[error("input name must not be empty")]
    MissingName,

    #[error("duplicate input name: '{0}'")]
    DuplicateName(String),

    #[error("input '{0}' marks more than one option as selected without multiple selection")]
    MultipleSelected(String),

    #[error("more than one input requests auto focus: '{first}' and '{second}'")]
    MultipleAutoFocus { first: String, second: String },

    #[error("input '{name}' has an invalid pattern: {reason}")]
    InvalidPattern { name: String, reason: String },

    #[error("input '{name}': attribute '{key}' must be a boolean")]
    AttrFlag { name: String, key: String },

    #[error("form refers to an input it does not declare: '{0}'")]
    UnknownField(String),
}

/// A raw submitted value that cannot be coerced to its field's domain type.
/// The display text is what the user sees next to the field.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("{0}")]
    TypeConversion(String),

    #[error("{0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    UnknownRequest { current: RequestId },
    OutdatedRevision { current: u32 },
    NotAwaiting(RequestState),
    PayloadShape,
}

impl std::fmt::Display for StaleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StaleReason::UnknownRequest { current } => {
                write!(f, "addressed to another request (current is {current})")
            }
            StaleReason::OutdatedRevision { current } => {
                write!(f, "answers an outdated form (current revision is {current})")
            }
            StaleReason::NotAwaiting(state) => write!(f, "request is {state}"),
            StaleReason::PayloadShape => write!(f, "payload does not match the emitted form"),
        }
    }
}

/// A submission delivered to a request that is not the one currently awaiting
/// it. Signals a driver bug; nothing is resumed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("stale submission for {request} revision {revision}: {reason}")]
pub struct StaleSubmissionError {
    pub request: RequestId,
    pub revision: u32,
    pub reason: StaleReason,
}

/// Everything that can end a blocking [`crate::protocol::session::Session`] call.
#[derive(Debug, Error)]
pub enum InputError {
    #[error(transparent)]
    Specification(#[from] SpecificationError),

    #[error(transparent)]
    Stale(#[from] StaleSubmissionError),

    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}
