use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use engine_logging::{engine_debug, engine_info, engine_warn};
use results_core::{
    update, Effect, FetchReply, JobId, Msg, Persona, PollConfig, PollKey, PollSnapshot, PollState,
};
use tokio::sync::mpsc;

use crate::cache::{FileCache, MemoryCache, ResultCache};
use crate::fetch::{ReqwestFetcher, ResultsFetcher};
use crate::scheduler::{PollScheduler, TimerSlot, TokioScheduler};
use crate::{EngineConfig, FetchError};

type Listener = Box<dyn FnMut(&PollSnapshot) + Send + 'static>;

enum EngineCommand {
    Subscribe {
        id: u64,
        key: PollKey,
        listener: Listener,
    },
    Unsubscribe {
        id: u64,
    },
    Refresh,
    ChangePersona(Persona),
    FetchCompleted {
        generation: u64,
        reply: FetchReply,
    },
    TimerFired {
        generation: u64,
    },
}

/// Subscription surface over the polling state machine.
///
/// All state transitions run on a single task, so listener callbacks observe
/// them one at a time and in order. Cloning is not supported; share the engine
/// behind an `Arc` instead.
pub struct ResultsEngine {
    cmd_tx: mpsc::UnboundedSender<EngineCommand>,
    latest: Arc<Mutex<PollSnapshot>>,
    next_subscription: AtomicU64,
}

impl ResultsEngine {
    /// Starts the engine task on the current Tokio runtime.
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn new(
        config: PollConfig,
        fetcher: Arc<dyn ResultsFetcher>,
        cache: Arc<dyn ResultCache>,
        scheduler: Arc<dyn PollScheduler>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let latest = Arc::new(Mutex::new(PollState::new(config).view()));

        let actor = EngineActor {
            state: PollState::new(config),
            listener: None,
            fetcher,
            cache,
            timer: TimerSlot::new(scheduler),
            cmd_tx: cmd_tx.downgrade(),
            latest: latest.clone(),
        };
        tokio::spawn(actor.run(cmd_rx));

        Self {
            cmd_tx,
            latest,
            next_subscription: AtomicU64::new(1),
        }
    }

    /// Builds the HTTP fetcher, cache and scheduler described by `config`.
    pub fn from_config(config: EngineConfig) -> Result<Self, FetchError> {
        let fetcher = ReqwestFetcher::new(config.fetch)?;
        let cache: Arc<dyn ResultCache> = match config.cache_dir {
            Some(dir) => {
                engine_info!("Caching results in {:?}", dir);
                Arc::new(FileCache::new(dir))
            }
            None => Arc::new(MemoryCache::new()),
        };
        Ok(Self::new(
            config.poll,
            Arc::new(fetcher),
            cache,
            Arc::new(TokioScheduler::current()),
        ))
    }

    /// Starts polling `job_id` for `persona`, replacing any earlier subscription.
    ///
    /// `on_change` is called on the engine task for every transition.
    pub fn subscribe(
        &self,
        job_id: impl Into<JobId>,
        persona: Persona,
        on_change: impl FnMut(&PollSnapshot) + Send + 'static,
    ) -> Subscription {
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        self.send(EngineCommand::Subscribe {
            id,
            key: PollKey::new(job_id, persona),
            listener: Box::new(on_change),
        });
        Subscription {
            id,
            cmd_tx: self.cmd_tx.clone(),
        }
    }

    /// Polls again now and resets retry accounting.
    pub fn refresh(&self) {
        self.send(EngineCommand::Refresh);
    }

    /// Restarts polling for the same job under another persona.
    pub fn change_persona(&self, persona: Persona) {
        self.send(EngineCommand::ChangePersona(persona));
    }

    /// Most recently published snapshot.
    pub fn snapshot(&self) -> PollSnapshot {
        match self.latest.lock() {
            Ok(latest) => latest.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            engine_warn!("Results engine task has stopped; command dropped");
        }
    }
}

/// Keeps a subscription alive; dropping it stops polling.
pub struct Subscription {
    id: u64,
    cmd_tx: mpsc::UnboundedSender<EngineCommand>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(EngineCommand::Unsubscribe { id: self.id });
    }
}

struct EngineActor {
    state: PollState,
    listener: Option<(u64, Listener)>,
    fetcher: Arc<dyn ResultsFetcher>,
    cache: Arc<dyn ResultCache>,
    timer: TimerSlot,
    cmd_tx: mpsc::WeakUnboundedSender<EngineCommand>,
    latest: Arc<Mutex<PollSnapshot>>,
}

impl EngineActor {
    async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<EngineCommand>) {
        while let Some(command) = cmd_rx.recv().await {
            self.handle(command);
        }
        self.timer.disarm();
        engine_debug!("Results engine task finished");
    }

    fn handle(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::Subscribe { id, key, listener } => {
                engine_info!("Subscribing to {}", key);
                self.listener = Some((id, listener));
                self.dispatch(Msg::Subscribe(key));
                self.dispatch(Msg::Start);
            }
            EngineCommand::Unsubscribe { id } => {
                if self.listener.as_ref().is_some_and(|(current, _)| *current == id) {
                    engine_info!("Unsubscribed from {:?}", self.state.key());
                    self.listener = None;
                    self.dispatch(Msg::Unsubscribe);
                }
            }
            EngineCommand::Refresh => self.dispatch(Msg::Refresh),
            EngineCommand::ChangePersona(persona) => {
                engine_info!("Persona changed to {}", persona);
                self.dispatch(Msg::PersonaChanged(persona));
                self.dispatch(Msg::Start);
            }
            EngineCommand::FetchCompleted { generation, reply } => {
                if generation != self.state.generation() {
                    engine_debug!("Discarding stale reply from generation {}", generation);
                }
                self.dispatch(Msg::FetchCompleted { generation, reply });
            }
            EngineCommand::TimerFired { generation } => {
                self.dispatch(Msg::TimerFired { generation });
            }
        }
    }

    /// Runs `msg` and any follow-up messages produced by synchronous effects.
    fn dispatch(&mut self, msg: Msg) {
        let mut queue = VecDeque::from([msg]);
        while let Some(msg) = queue.pop_front() {
            let state = std::mem::take(&mut self.state);
            let (mut state, effects) = update(state, msg);
            let snapshot = state.consume_dirty().then(|| state.view());
            self.state = state;

            if let Some(snapshot) = snapshot {
                self.publish(snapshot);
            }
            for effect in effects {
                if let Some(follow_up) = self.run_effect(effect) {
                    queue.push_back(follow_up);
                }
            }
        }
    }

    fn publish(&mut self, snapshot: PollSnapshot) {
        engine_debug!(
            "{:?} retry={} source={:?} error={:?}",
            snapshot.status,
            snapshot.retry_count,
            snapshot.source,
            snapshot.error
        );
        match self.latest.lock() {
            Ok(mut latest) => *latest = snapshot.clone(),
            Err(poisoned) => *poisoned.into_inner() = snapshot.clone(),
        }
        if let Some((_, listener)) = self.listener.as_mut() {
            listener(&snapshot);
        }
    }

    fn run_effect(&mut self, effect: Effect) -> Option<Msg> {
        match effect {
            Effect::ReadCache { key, generation } => Some(Msg::CacheRead {
                generation,
                cached: self.cache.get(&key),
            }),
            Effect::WriteCache { key, result } => {
                self.cache.put(&key, &result);
                None
            }
            Effect::EvictCache { key } => {
                self.cache.evict(&key);
                None
            }
            Effect::Fetch { key, generation } => {
                let fetcher = self.fetcher.clone();
                let cmd_tx = self.cmd_tx.clone();
                tokio::spawn(async move {
                    let reply = match fetcher.fetch(&key).await {
                        Ok(body) => FetchReply::Body(body),
                        Err(err) => FetchReply::from(err),
                    };
                    if let Some(cmd_tx) = cmd_tx.upgrade() {
                        let _ = cmd_tx.send(EngineCommand::FetchCompleted { generation, reply });
                    }
                });
                None
            }
            Effect::ScheduleRetry {
                key,
                generation,
                delay,
            } => {
                engine_debug!("Next attempt for {} in {:?}", key, delay);
                let cmd_tx = self.cmd_tx.clone();
                self.timer.arm(
                    delay,
                    Box::new(move || {
                        if let Some(cmd_tx) = cmd_tx.upgrade() {
                            let _ = cmd_tx.send(EngineCommand::TimerFired { generation });
                        }
                    }),
                );
                None
            }
            Effect::CancelTimer => {
                self.timer.disarm();
                None
            }
        }
    }
}
