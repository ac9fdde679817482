use thiserror::Error;

/// Payload could not be recognised as a result or as a processing marker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizationError {
    #[error("expected a JSON object, found {found}")]
    NotAnObject { found: &'static str },
    #[error("payload has neither `metrics`, `insights` nor a processing status")]
    MissingResultMarker,
    #[error("response body could not be decoded: {reason}")]
    Unreadable { reason: String },
}

/// Error published alongside a poll state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    /// The backend does not know the job yet; polling continues until the limit.
    #[error("results not available yet after {attempts} attempts")]
    NotYetAvailable { attempts: u32 },
    /// The job was found earlier but has disappeared since.
    #[error("results are no longer available")]
    Gone,
    #[error("unrecognised results payload: {0}")]
    Normalization(#[from] NormalizationError),
    #[error("failed to fetch results: {message}")]
    Transport { message: String },
    /// Retry budget spent while the job was still processing.
    #[error("analysis still processing after {attempts} attempts")]
    Exhausted { attempts: u32 },
}

impl PollError {
    /// Whether the same request may succeed later without user action.
    pub fn is_transient(&self) -> bool {
        matches!(self, PollError::NotYetAvailable { .. })
    }
}
