use std::fmt;

use engine_logging::engine_warn;
use results_core::FetchReply;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    /// The backend does not know the job (HTTP 404).
    NotFound,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    /// A response body that is not JSON.
    InvalidBody,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => f.write_str("bad results url"),
            FailureKind::NotFound => f.write_str("job unknown to backend"),
            FailureKind::HttpStatus(code) => write!(f, "backend answered {code}"),
            FailureKind::Timeout => f.write_str("request timed out"),
            FailureKind::TooLarge { max_bytes, actual } => match actual {
                Some(actual) => write!(f, "payload of {actual} bytes exceeds {max_bytes}"),
                None => write!(f, "payload exceeds {max_bytes} bytes"),
            },
            FailureKind::InvalidBody => f.write_str("payload is not JSON"),
            FailureKind::Network => f.write_str("backend unreachable"),
        }
    }
}

/// Classifies a fetch outcome for the state machine. Only 404 and undecodable bodies get
/// their own replies; everything else is a transport failure.
impl From<FetchError> for FetchReply {
    fn from(err: FetchError) -> Self {
        match err.kind {
            FailureKind::NotFound => FetchReply::NotFound,
            FailureKind::InvalidBody => FetchReply::Unreadable(err.message),
            _ => {
                engine_warn!("Fetching results failed: {}", err);
                FetchReply::Transport(err.to_string())
            }
        }
    }
}
