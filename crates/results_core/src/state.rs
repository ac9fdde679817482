use crate::view_model::PollSnapshot;
use crate::{NormalizedResult, Persona, PollConfig, PollError, PollKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollStatus {
    #[default]
    Idle,
    Polling,
    Succeeded,
    Failed,
    TimedOut,
}

impl PollStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PollStatus::Succeeded | PollStatus::Failed | PollStatus::TimedOut
        )
    }
}

/// Where the currently displayed data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// Warm start from the result cache, not yet confirmed by the backend.
    Cache,
    Network,
}

/// Poll lifecycle for one subscribed key.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PollState {
    config: PollConfig,
    pub(crate) key: Option<PollKey>,
    pub(crate) status: PollStatus,
    pub(crate) data: Option<NormalizedResult>,
    pub(crate) source: Option<DataSource>,
    pub(crate) error: Option<PollError>,
    pub(crate) retry_count: u32,
    /// Bumped whenever outstanding replies and timers must be ignored.
    pub(crate) generation: u64,
    pub(crate) awaiting_cache: bool,
    pub(crate) in_flight: bool,
    pub(crate) timer_pending: bool,
    /// A fresh fetch has succeeded for the current key.
    pub(crate) confirmed: bool,
    dirty: bool,
}

impl PollState {
    pub fn new(config: PollConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> PollConfig {
        self.config
    }

    pub fn key(&self) -> Option<&PollKey> {
        self.key.as_ref()
    }

    pub fn status(&self) -> PollStatus {
        self.status
    }

    /// Persona of the subscribed key, or the default one when unsubscribed.
    pub fn persona(&self) -> Persona {
        self.key
            .as_ref()
            .map(|key| key.persona.clone())
            .unwrap_or_default()
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn view(&self) -> PollSnapshot {
        PollSnapshot {
            key: self.key.clone(),
            status: self.status,
            data: self.data.clone(),
            source: self.source,
            error: self.error.clone(),
            retry_count: self.retry_count,
            max_retries: self.config.max_retries,
        }
    }

    /// Returns whether anything observable changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Drops everything tied to the current key and invalidates outstanding work.
    pub(crate) fn reset(&mut self, key: Option<PollKey>) {
        self.generation += 1;
        self.key = key;
        self.status = PollStatus::Idle;
        self.data = None;
        self.source = None;
        self.error = None;
        self.retry_count = 0;
        self.awaiting_cache = false;
        self.in_flight = false;
        self.timer_pending = false;
        self.confirmed = false;
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.key.is_some() && generation == self.generation
    }

    pub(crate) fn retries_exhausted(&self) -> bool {
        self.retry_count >= self.config.max_retries
    }
}
