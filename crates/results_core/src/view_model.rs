use crate::{DataSource, NormalizedResult, PollError, PollKey, PollStatus};

const TIMED_OUT_MESSAGE: &str =
    "Analysis is taking longer than expected. Please try refreshing the page.";

/// What presentation code observes on every transition.
///
/// `data` is renderable whenever it is present, whatever the `status`. During a warm
/// start it holds the cached result (`source == Some(DataSource::Cache)`) while the
/// status is still `Polling`; treat it as provisional until a `Network` value arrives.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PollSnapshot {
    pub key: Option<PollKey>,
    pub status: PollStatus,
    pub data: Option<NormalizedResult>,
    pub source: Option<DataSource>,
    pub error: Option<PollError>,
    pub retry_count: u32,
    pub max_retries: u32,
}

impl PollSnapshot {
    /// Nothing to show yet while an attempt is running.
    pub fn is_loading(&self) -> bool {
        self.status == PollStatus::Polling && self.data.is_none()
    }

    /// A cached result is on display and has not been confirmed by the backend yet.
    pub fn is_provisional(&self) -> bool {
        self.data.is_some() && self.source == Some(DataSource::Cache)
    }

    /// Whether `refresh()` should be offered to the user.
    pub fn can_retry(&self) -> bool {
        matches!(self.status, PollStatus::Failed | PollStatus::TimedOut)
    }

    pub fn user_message(&self) -> Option<String> {
        match self.status {
            PollStatus::TimedOut => Some(TIMED_OUT_MESSAGE.to_string()),
            PollStatus::Failed => Some(
                self.error
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "Failed to fetch results".to_string()),
            ),
            PollStatus::Polling if self.data.is_none() => Some(format!(
                "Your analysis is being processed (attempt {} of {})",
                self.retry_count + 1,
                self.max_retries
            )),
            _ => None,
        }
    }
}
