use std::time::Duration;

/// Polling attempts allowed before giving up on a key.
pub const MAX_RETRIES: u32 = 30;
/// Fixed delay between attempts; there is no backoff.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub max_retries: u32,
    pub poll_interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            poll_interval: POLL_INTERVAL,
        }
    }
}
