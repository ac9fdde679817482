use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Handle to one scheduled callback.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(CancellationToken);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent; cancelling an already fired or cancelled timer does nothing.
    pub fn cancel(&self) {
        self.0.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }

    pub fn inner(&self) -> &CancellationToken {
        &self.0
    }
}

/// Runs callbacks after a delay, independent of any particular clock API.
pub trait PollScheduler: Send + Sync {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> CancelToken;

    fn cancel(&self, token: &CancelToken) {
        token.cancel();
    }
}

/// Scheduler backed by `tokio::time`; honours paused test clocks.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: tokio::runtime::Handle,
}

impl TokioScheduler {
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Uses the runtime of the calling task. Panics outside a Tokio runtime.
    pub fn current() -> Self {
        Self::new(tokio::runtime::Handle::current())
    }
}

impl PollScheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> CancelToken {
        let token = CancelToken::new();
        let cancelled = token.inner().clone();
        self.handle.spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if !cancelled.is_cancelled() {
                        callback();
                    }
                }
            }
        });
        token
    }
}

/// Holds at most one pending timer; arming again cancels the previous one.
pub struct TimerSlot {
    scheduler: Arc<dyn PollScheduler>,
    pending: Option<CancelToken>,
}

impl TimerSlot {
    pub fn new(scheduler: Arc<dyn PollScheduler>) -> Self {
        Self {
            scheduler,
            pending: None,
        }
    }

    pub fn arm(&mut self, delay: Duration, callback: TimerCallback) {
        self.disarm();
        self.pending = Some(self.scheduler.schedule(delay, callback));
    }

    pub fn disarm(&mut self) {
        if let Some(token) = self.pending.take() {
            self.scheduler.cancel(&token);
        }
    }

    pub fn is_armed(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }
}

impl Drop for TimerSlot {
    fn drop(&mut self) {
        self.disarm();
    }
}
