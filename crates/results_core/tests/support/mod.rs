#![allow(dead_code)]

use std::time::Duration;

use results_core::{
    update, Effect, FetchReply, JobId, Msg, Persona, PollConfig, PollKey, PollSnapshot, PollState,
};
use serde_json::{json, Value};

/// Drives the pure state machine the way the engine does and records what a
/// subscriber would see.
pub struct Harness {
    pub state: PollState,
    pub published: Vec<PollSnapshot>,
    pub effects: Vec<Effect>,
}

impl Harness {
    pub fn new(max_retries: u32) -> Self {
        engine_logging::initialize_for_tests();
        Self {
            state: PollState::new(PollConfig {
                max_retries,
                poll_interval: Duration::from_secs(5),
            }),
            published: Vec::new(),
            effects: Vec::new(),
        }
    }

    pub fn send(&mut self, msg: Msg) -> Vec<Effect> {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            self.published.push(state.view());
        }
        self.state = state;
        self.effects.extend(effects.iter().cloned());
        effects
    }

    /// Subscribe + start + empty cache read, leaving one fetch in flight.
    pub fn subscribe(&mut self, key: PollKey) -> Vec<Effect> {
        self.send(Msg::Subscribe(key));
        self.send(Msg::Start);
        self.cache_read(None)
    }

    pub fn cache_read(&mut self, cached: Option<results_core::NormalizedResult>) -> Vec<Effect> {
        let generation = self.state.generation();
        self.send(Msg::CacheRead { generation, cached })
    }

    pub fn reply(&mut self, reply: FetchReply) -> Vec<Effect> {
        let generation = self.state.generation();
        self.send(Msg::FetchCompleted { generation, reply })
    }

    pub fn fire_timer(&mut self) -> Vec<Effect> {
        let generation = self.state.generation();
        self.send(Msg::TimerFired { generation })
    }

    pub fn fetch_count(&self) -> usize {
        self.effects
            .iter()
            .filter(|effect| matches!(effect, Effect::Fetch { .. }))
            .count()
    }

    pub fn timer_count(&self) -> usize {
        self.effects
            .iter()
            .filter(|effect| matches!(effect, Effect::ScheduleRetry { .. }))
            .count()
    }
}

pub fn key(job: &str, persona: Persona) -> PollKey {
    PollKey::new(JobId::new(job), persona)
}

pub fn processing() -> FetchReply {
    FetchReply::Body(json!({ "status": "processing" }))
}

pub fn ready_body() -> Value {
    json!({
        "metrics": {
            "primary": {
                "errorRate": 0.05,
                "totalSize": 2048,
                "totalRequests": 40,
                "avgResponseTime": 120.5
            },
            "domains": ["app.example.com", "cdn.example.com"],
            "timeseries": [
                { "timestamp": 1000, "value": 80 },
                { "timestamp": 2000, "value": 95 }
            ]
        },
        "insights": [
            {
                "category": "performance",
                "severity": "warning",
                "title": "Slow API",
                "content": "The /api/items endpoint is slow",
                "recommendations": ["Add caching"]
            }
        ]
    })
}

pub fn ready() -> FetchReply {
    FetchReply::Body(ready_body())
}
