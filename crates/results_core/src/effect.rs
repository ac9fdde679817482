use std::time::Duration;

use crate::{NormalizedResult, PollKey};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ReadCache { key: PollKey, generation: u64 },
    WriteCache { key: PollKey, result: NormalizedResult },
    EvictCache { key: PollKey },
    Fetch { key: PollKey, generation: u64 },
    ScheduleRetry {
        key: PollKey,
        generation: u64,
        delay: Duration,
    },
    CancelTimer,
}
