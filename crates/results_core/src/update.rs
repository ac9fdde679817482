use crate::normalize::{normalize, Payload};
use crate::{
    DataSource, Effect, FetchReply, Msg, NormalizationError, PollError, PollState, PollStatus,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: PollState, msg: Msg) -> (PollState, Vec<Effect>) {
    let effects = match msg {
        Msg::Subscribe(key) => {
            let effects = cancel_timer(&state);
            if state.status != PollStatus::Idle || state.data.is_some() {
                state.mark_dirty();
            }
            state.reset(Some(key));
            effects
        }
        Msg::Start => start(&mut state),
        Msg::CacheRead { generation, cached } => {
            if !state.is_current(generation) || !state.awaiting_cache {
                return (state, Vec::new());
            }
            state.awaiting_cache = false;
            if let Some(cached) = cached {
                if !state.confirmed {
                    state.data = Some(cached);
                    state.source = Some(DataSource::Cache);
                    state.mark_dirty();
                }
            }
            issue_fetch(&mut state)
        }
        Msg::FetchCompleted { generation, reply } => {
            if !state.is_current(generation) || !state.in_flight {
                return (state, Vec::new());
            }
            state.in_flight = false;
            state.mark_dirty();
            apply_reply(&mut state, reply)
        }
        Msg::TimerFired { generation } => {
            if !state.is_current(generation) || !state.timer_pending {
                return (state, Vec::new());
            }
            state.timer_pending = false;
            if state.status == PollStatus::Polling && !state.in_flight {
                issue_fetch(&mut state)
            } else {
                Vec::new()
            }
        }
        Msg::Refresh => refresh(&mut state),
        Msg::PersonaChanged(persona) => {
            let Some(current) = state.key.clone() else {
                return (state, Vec::new());
            };
            if current.persona == persona {
                return (state, Vec::new());
            }
            let effects = cancel_timer(&state);
            state.reset(Some(current.with_persona(persona)));
            state.mark_dirty();
            effects
        }
        Msg::Unsubscribe => {
            let effects = cancel_timer(&state);
            state.reset(None);
            effects
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn start(state: &mut PollState) -> Vec<Effect> {
    let Some(key) = state.key.clone() else {
        return Vec::new();
    };
    if state.status != PollStatus::Idle {
        return Vec::new();
    }
    state.status = PollStatus::Polling;
    state.awaiting_cache = true;
    state.mark_dirty();
    vec![Effect::ReadCache {
        key,
        generation: state.generation,
    }]
}

fn refresh(state: &mut PollState) -> Vec<Effect> {
    if state.key.is_none() {
        return Vec::new();
    }
    if state.status == PollStatus::Idle {
        return start(state);
    }

    let mut effects = cancel_timer(state);
    state.timer_pending = false;
    state.status = PollStatus::Polling;
    state.retry_count = 0;
    state.error = None;
    state.mark_dirty();

    // An outstanding cache read or fetch already serves as the immediate attempt.
    if !state.awaiting_cache && !state.in_flight {
        effects.extend(issue_fetch(state));
    }
    effects
}

fn issue_fetch(state: &mut PollState) -> Vec<Effect> {
    let Some(key) = state.key.clone() else {
        return Vec::new();
    };
    state.in_flight = true;
    vec![Effect::Fetch {
        key,
        generation: state.generation,
    }]
}

fn apply_reply(state: &mut PollState, reply: FetchReply) -> Vec<Effect> {
    match reply {
        FetchReply::Body(body) => match normalize(&body, &state.persona()) {
            Ok(Payload::Ready(result)) => succeed(state, result),
            Ok(Payload::Processing) => {
                state.error = None;
                state.retry_count += 1;
                if state.retries_exhausted() {
                    state.status = PollStatus::TimedOut;
                    state.error = Some(PollError::Exhausted {
                        attempts: state.retry_count,
                    });
                    Vec::new()
                } else {
                    schedule_retry(state)
                }
            }
            Err(err) => fail(state, err.into()),
        },
        FetchReply::NotFound if state.confirmed => {
            let key = state.key.clone();
            state.data = None;
            state.source = None;
            state.confirmed = false;
            let mut effects = fail(state, PollError::Gone);
            effects.extend(key.map(|key| Effect::EvictCache { key }));
            effects
        }
        FetchReply::NotFound => {
            state.retry_count += 1;
            let error = PollError::NotYetAvailable {
                attempts: state.retry_count,
            };
            if state.retries_exhausted() {
                fail(state, error)
            } else {
                state.error = Some(error);
                schedule_retry(state)
            }
        }
        FetchReply::Unreadable(reason) => {
            fail(state, NormalizationError::Unreadable { reason }.into())
        }
        FetchReply::Transport(message) => fail(state, PollError::Transport { message }),
    }
}

fn succeed(state: &mut PollState, result: crate::NormalizedResult) -> Vec<Effect> {
    state.status = PollStatus::Succeeded;
    state.error = None;
    state.confirmed = true;
    state.source = Some(DataSource::Network);
    state.data = Some(result.clone());
    match state.key.clone() {
        Some(key) => vec![Effect::WriteCache { key, result }],
        None => Vec::new(),
    }
}

fn fail(state: &mut PollState, error: PollError) -> Vec<Effect> {
    state.status = PollStatus::Failed;
    state.error = Some(error);
    Vec::new()
}

fn schedule_retry(state: &mut PollState) -> Vec<Effect> {
    let Some(key) = state.key.clone() else {
        return Vec::new();
    };
    state.status = PollStatus::Polling;
    state.timer_pending = true;
    vec![Effect::ScheduleRetry {
        key,
        generation: state.generation,
        delay: state.config().poll_interval,
    }]
}

fn cancel_timer(state: &PollState) -> Vec<Effect> {
    if state.timer_pending {
        vec![Effect::CancelTimer]
    } else {
        Vec::new()
    }
}
