use serde_json::Value;

use crate::{NormalizedResult, Persona, PollKey};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// A consumer attached to a job/persona pair; resets to `Idle` for that key.
    Subscribe(PollKey),
    /// Leave `Idle` and begin the first attempt for the current key.
    Start,
    /// Synchronous cache lookup issued on start.
    CacheRead {
        generation: u64,
        cached: Option<NormalizedResult>,
    },
    /// A fetch issued by `Effect::Fetch` finished.
    FetchCompleted { generation: u64, reply: FetchReply },
    /// The retry delay scheduled by `Effect::ScheduleRetry` elapsed.
    TimerFired { generation: u64 },
    /// User asked to poll again now.
    Refresh,
    /// User switched persona for the same job.
    PersonaChanged(Persona),
    /// The consumer went away.
    Unsubscribe,
    NoOp,
}

/// What the transport produced for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchReply {
    /// A decoded JSON body, not yet normalized.
    Body(Value),
    /// The backend answered "not found" for the job.
    NotFound,
    /// The backend answered with a body that is not JSON.
    Unreadable(String),
    /// Network failure or an error status unrelated to job readiness.
    Transport(String),
}
