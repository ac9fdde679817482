#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use results_core::{PollConfig, PollKey, PollSnapshot, PollStatus};
use results_engine::{
    CancelToken, FailureKind, FetchError, MemoryCache, PollScheduler, ResultsEngine,
    ResultsFetcher, TimerCallback, TokioScheduler,
};
use serde_json::{json, Value};
use tokio::sync::mpsc;

pub type Reply = Result<Value, FetchError>;

/// Fetcher answering from a per-persona script; the last entry repeats.
#[derive(Default)]
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<PollKey>>,
}

impl ScriptedFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, persona: &str, replies: Vec<Reply>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(persona.to_string(), replies.into());
    }

    pub fn calls_for(&self, persona: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|key| key.persona.as_str() == persona)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl ResultsFetcher for ScriptedFetcher {
    async fn fetch(&self, key: &PollKey) -> Result<Value, FetchError> {
        self.calls.lock().unwrap().push(key.clone());
        let mut scripts = self.scripts.lock().unwrap();
        let script = scripts
            .get_mut(key.persona.as_str())
            .expect("no script for persona");
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().expect("empty script")
        }
    }
}

/// Wraps the Tokio scheduler and counts scheduled timers.
pub struct CountingScheduler {
    inner: TokioScheduler,
    scheduled: AtomicUsize,
}

impl CountingScheduler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: TokioScheduler::current(),
            scheduled: AtomicUsize::new(0),
        })
    }

    pub fn scheduled(&self) -> usize {
        self.scheduled.load(Ordering::SeqCst)
    }
}

impl PollScheduler for CountingScheduler {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> CancelToken {
        self.scheduled.fetch_add(1, Ordering::SeqCst);
        self.inner.schedule(delay, callback)
    }
}

pub fn processing() -> Reply {
    Ok(json!({ "status": "processing" }))
}

pub fn ready(total_requests: u32) -> Reply {
    Ok(json!({
        "metrics": {
            "primary": { "totalRequests": total_requests, "avgResponseTime": 210.0 },
            "domains": ["shop.example.com"]
        },
        "insights": [{ "category": "performance", "title": "Large images" }]
    }))
}

pub fn transport(code: u16) -> Reply {
    Err(FetchError::new(FailureKind::HttpStatus(code), "server error"))
}

pub fn not_found() -> Reply {
    Err(FetchError::new(FailureKind::NotFound, "404 Not Found"))
}

pub fn poll_config(max_retries: u32) -> PollConfig {
    PollConfig {
        max_retries,
        poll_interval: Duration::from_secs(5),
    }
}

pub struct Rig {
    pub engine: ResultsEngine,
    pub fetcher: Arc<ScriptedFetcher>,
    pub scheduler: Arc<CountingScheduler>,
    pub cache: Arc<MemoryCache>,
}

impl Rig {
    pub fn new(max_retries: u32, fetcher: Arc<ScriptedFetcher>) -> Self {
        Self::with_cache(max_retries, fetcher, Arc::new(MemoryCache::new()))
    }

    pub fn with_cache(
        max_retries: u32,
        fetcher: Arc<ScriptedFetcher>,
        cache: Arc<MemoryCache>,
    ) -> Self {
        engine_logging::initialize_for_tests();
        let scheduler = CountingScheduler::new();
        let engine = ResultsEngine::new(
            poll_config(max_retries),
            fetcher.clone(),
            cache.clone(),
            scheduler.clone(),
        );
        Self {
            engine,
            fetcher,
            scheduler,
            cache,
        }
    }
}

/// Listener forwarding every snapshot into a channel.
pub fn listener() -> (
    impl FnMut(&PollSnapshot) + Send + 'static,
    mpsc::UnboundedReceiver<PollSnapshot>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        move |snapshot: &PollSnapshot| {
            let _ = tx.send(snapshot.clone());
        },
        rx,
    )
}

/// Collects snapshots until one matches `done`.
pub async fn collect_until(
    rx: &mut mpsc::UnboundedReceiver<PollSnapshot>,
    done: impl Fn(&PollSnapshot) -> bool,
) -> Vec<PollSnapshot> {
    let mut seen = Vec::new();
    while let Some(snapshot) = rx.recv().await {
        let finished = done(&snapshot);
        seen.push(snapshot);
        if finished {
            return seen;
        }
    }
    panic!("engine stopped before the expected snapshot; saw {seen:?}");
}

pub fn is_terminal(snapshot: &PollSnapshot) -> bool {
    snapshot.status.is_terminal()
}

pub fn summary(snapshots: &[PollSnapshot]) -> Vec<(PollStatus, u32)> {
    snapshots
        .iter()
        .map(|snapshot| (snapshot.status, snapshot.retry_count))
        .collect()
}
