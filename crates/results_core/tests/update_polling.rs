mod support;

use pretty_assertions::assert_eq;
use results_core::{DataSource, Effect, FetchReply, Msg, Persona, PollError, PollStatus};
use serde_json::json;
use support::{key, processing, ready, Harness};

fn statuses(harness: &Harness) -> Vec<(PollStatus, u32)> {
    harness
        .published
        .iter()
        .map(|snapshot| (snapshot.status, snapshot.retry_count))
        .collect()
}

#[test]
fn processing_twice_then_result_publishes_in_order() {
    let mut harness = Harness::new(30);
    harness.subscribe(key("abc", Persona::Developer));

    harness.reply(processing());
    harness.fire_timer();
    harness.reply(processing());
    harness.fire_timer();
    let effects = harness.reply(ready());

    // The first entry is the Idle -> Polling start transition.
    assert_eq!(
        statuses(&harness),
        vec![
            (PollStatus::Polling, 0),
            (PollStatus::Polling, 1),
            (PollStatus::Polling, 2),
            (PollStatus::Succeeded, 2),
        ]
    );
    assert!(matches!(effects.as_slice(), [Effect::WriteCache { .. }]));

    let last = harness.published.last().unwrap();
    assert_eq!(last.source, Some(DataSource::Network));
    let data = last.data.as_ref().expect("result data");
    assert_eq!(data.metrics.primary.total_requests, 40.0);
    assert_eq!(data.insights.len(), 1);
}

#[test]
fn success_after_n_minus_one_processing_replies_uses_n_fetches() {
    let n = 6;
    let mut harness = Harness::new(n);
    harness.subscribe(key("job-n", Persona::Qa));

    for _ in 0..n - 1 {
        harness.reply(processing());
        harness.fire_timer();
    }
    harness.reply(ready());

    assert_eq!(harness.state.status(), PollStatus::Succeeded);
    assert_eq!(harness.fetch_count(), n as usize);
    assert!(harness.timer_count() <= (n - 1) as usize);
    let succeeded = harness
        .published
        .iter()
        .filter(|snapshot| snapshot.status == PollStatus::Succeeded)
        .count();
    assert_eq!(succeeded, 1);
}

#[test]
fn exhausting_retries_while_processing_times_out() {
    let max = 4;
    let mut harness = Harness::new(max);
    harness.subscribe(key("slow", Persona::Developer));

    for attempt in 1..=max {
        let effects = harness.reply(processing());
        if attempt < max {
            assert!(matches!(effects.as_slice(), [Effect::ScheduleRetry { .. }]));
            harness.fire_timer();
        } else {
            assert!(effects.is_empty());
        }
    }

    let last = harness.published.last().unwrap();
    assert_eq!(last.status, PollStatus::TimedOut);
    assert_eq!(last.error, Some(PollError::Exhausted { attempts: max }));
    assert!(last.can_retry());
    assert_eq!(harness.fetch_count(), max as usize);

    // Nothing left to fire; a late timer message changes nothing.
    assert!(harness.fire_timer().is_empty());
    assert_eq!(harness.fetch_count(), max as usize);
}

#[test]
fn persona_change_mid_poll_cancels_timer_and_resets_retries() {
    let mut harness = Harness::new(10);
    harness.subscribe(key("abc", Persona::Developer));
    harness.reply(processing());
    harness.fire_timer();
    harness.reply(processing());
    assert_eq!(harness.state.retry_count(), 2);
    let old_generation = harness.state.generation();

    let effects = harness.send(Msg::PersonaChanged(Persona::Qa));
    assert_eq!(effects, vec![Effect::CancelTimer]);
    assert_eq!(harness.state.status(), PollStatus::Idle);
    assert_eq!(harness.state.retry_count(), 0);

    // The old timer firing late must not fetch for the old persona.
    let fetches_before = harness.fetch_count();
    let stale = harness.send(Msg::TimerFired {
        generation: old_generation,
    });
    assert!(stale.is_empty());
    assert_eq!(harness.fetch_count(), fetches_before);

    let effects = harness.send(Msg::Start);
    assert_eq!(
        effects,
        vec![Effect::ReadCache {
            key: key("abc", Persona::Qa),
            generation: harness.state.generation(),
        }]
    );
    let last = harness.published.last().unwrap();
    assert_eq!(last.status, PollStatus::Polling);
    assert_eq!(last.retry_count, 0);
    assert_eq!(last.key, Some(key("abc", Persona::Qa)));
}

#[test]
fn stale_reply_after_persona_change_is_discarded() {
    let mut harness = Harness::new(10);
    harness.subscribe(key("abc", Persona::Developer));
    let old_generation = harness.state.generation();

    harness.send(Msg::PersonaChanged(Persona::SalesEngineer));
    harness.send(Msg::Start);
    let published = harness.published.len();

    let effects = harness.send(Msg::FetchCompleted {
        generation: old_generation,
        reply: ready(),
    });
    assert!(effects.is_empty());
    assert_eq!(harness.published.len(), published);
    assert_eq!(harness.state.status(), PollStatus::Polling);
}

#[test]
fn changing_to_the_same_persona_is_a_noop() {
    let mut harness = Harness::new(10);
    harness.subscribe(key("abc", Persona::Developer));
    let generation = harness.state.generation();

    assert!(harness.send(Msg::PersonaChanged(Persona::Developer)).is_empty());
    assert_eq!(harness.state.generation(), generation);
}

#[test]
fn refresh_from_failed_fetches_immediately_with_reset_count() {
    let mut harness = Harness::new(10);
    harness.subscribe(key("abc", Persona::Developer));
    harness.reply(processing());
    harness.fire_timer();
    harness.reply(FetchReply::Transport("502 Bad Gateway".into()));
    assert_eq!(harness.state.status(), PollStatus::Failed);
    assert_eq!(harness.state.retry_count(), 1);

    let effects = harness.send(Msg::Refresh);
    assert_eq!(
        effects,
        vec![Effect::Fetch {
            key: key("abc", Persona::Developer),
            generation: harness.state.generation(),
        }]
    );
    let last = harness.published.last().unwrap();
    assert_eq!(last.status, PollStatus::Polling);
    assert_eq!(last.retry_count, 0);
    assert_eq!(last.error, None);
}

#[test]
fn refresh_while_timer_pending_cancels_it_and_fetches_now() {
    let mut harness = Harness::new(10);
    harness.subscribe(key("abc", Persona::Developer));
    harness.reply(processing());

    let effects = harness.send(Msg::Refresh);
    assert!(matches!(
        effects.as_slice(),
        [Effect::CancelTimer, Effect::Fetch { .. }]
    ));
    assert_eq!(harness.state.retry_count(), 0);

    // The cancelled timer does not produce a second request.
    assert!(harness.fire_timer().is_empty());
}

#[test]
fn refresh_while_fetch_outstanding_does_not_overlap_requests() {
    let mut harness = Harness::new(10);
    harness.subscribe(key("abc", Persona::Developer));
    assert_eq!(harness.fetch_count(), 1);

    let effects = harness.send(Msg::Refresh);
    assert!(effects.is_empty());
    assert_eq!(harness.fetch_count(), 1);

    harness.reply(ready());
    assert_eq!(harness.state.status(), PollStatus::Succeeded);
}

#[test]
fn transport_failure_is_not_retried() {
    let mut harness = Harness::new(10);
    harness.subscribe(key("abc", Persona::Developer));

    let effects = harness.reply(FetchReply::Transport("connection refused".into()));
    assert!(effects.is_empty());
    let last = harness.published.last().unwrap();
    assert_eq!(last.status, PollStatus::Failed);
    assert_eq!(
        last.error,
        Some(PollError::Transport {
            message: "connection refused".into()
        })
    );
    assert_eq!(harness.fetch_count(), 1);
}

#[test]
fn unrecognised_payload_fails_immediately() {
    let mut harness = Harness::new(10);
    harness.subscribe(key("abc", Persona::Developer));

    harness.reply(FetchReply::Body(json!({ "unexpected": true })));
    let last = harness.published.last().unwrap();
    assert_eq!(last.status, PollStatus::Failed);
    assert!(matches!(last.error, Some(PollError::Normalization(_))));
    assert_eq!(harness.timer_count(), 0);
}

#[test]
fn not_found_before_success_keeps_polling_until_limit() {
    let mut harness = Harness::new(3);
    harness.subscribe(key("new-job", Persona::Developer));

    let effects = harness.reply(FetchReply::NotFound);
    assert!(matches!(effects.as_slice(), [Effect::ScheduleRetry { .. }]));
    let last = harness.published.last().unwrap();
    assert_eq!(last.status, PollStatus::Polling);
    assert_eq!(last.error, Some(PollError::NotYetAvailable { attempts: 1 }));

    harness.fire_timer();
    harness.reply(FetchReply::NotFound);
    harness.fire_timer();
    harness.reply(FetchReply::NotFound);

    let last = harness.published.last().unwrap();
    assert_eq!(last.status, PollStatus::Failed);
    assert_eq!(last.error, Some(PollError::NotYetAvailable { attempts: 3 }));
}

#[test]
fn not_found_after_success_is_a_hard_error_and_evicts() {
    let mut harness = Harness::new(10);
    let job = key("gone", Persona::Developer);
    harness.subscribe(job.clone());
    harness.reply(ready());
    assert_eq!(harness.state.status(), PollStatus::Succeeded);

    harness.send(Msg::Refresh);
    let effects = harness.reply(FetchReply::NotFound);

    assert_eq!(effects, vec![Effect::EvictCache { key: job }]);
    let last = harness.published.last().unwrap();
    assert_eq!(last.status, PollStatus::Failed);
    assert_eq!(last.error, Some(PollError::Gone));
    assert_eq!(last.data, None);
}

#[test]
fn warm_cache_is_published_then_superseded_by_network() {
    let mut harness = Harness::new(10);
    let job = key("abc", Persona::Developer);
    harness.send(Msg::Subscribe(job.clone()));
    harness.send(Msg::Start);

    let cached = match results_core::normalize(&support::ready_body(), &Persona::Developer) {
        Ok(results_core::Payload::Ready(result)) => result,
        other => panic!("unexpected normalization outcome {other:?}"),
    };
    let effects = harness.cache_read(Some(cached.clone()));
    assert!(matches!(effects.as_slice(), [Effect::Fetch { .. }]));

    let warm = harness.published.last().unwrap();
    assert_eq!(warm.status, PollStatus::Polling);
    assert_eq!(warm.source, Some(DataSource::Cache));
    assert!(!warm.is_loading());
    assert!(warm.is_provisional());

    // Identical data still refreshes the cache entry.
    let effects = harness.reply(ready());
    assert_eq!(
        effects,
        vec![Effect::WriteCache {
            key: job,
            result: cached
        }]
    );
    let fresh = harness.published.last().unwrap();
    assert_eq!(fresh.status, PollStatus::Succeeded);
    assert_eq!(fresh.source, Some(DataSource::Network));
}

#[test]
fn unsubscribe_cancels_and_ignores_late_replies() {
    let mut harness = Harness::new(10);
    harness.subscribe(key("abc", Persona::Developer));
    harness.reply(processing());
    let generation = harness.state.generation();

    let effects = harness.send(Msg::Unsubscribe);
    assert_eq!(effects, vec![Effect::CancelTimer]);
    assert_eq!(harness.state.key(), None);

    assert!(harness
        .send(Msg::FetchCompleted {
            generation,
            reply: ready()
        })
        .is_empty());
    assert!(harness.send(Msg::Start).is_empty());
}

#[test]
fn succeeded_result_carries_only_the_subscribed_persona_insights() {
    let mut harness = Harness::new(10);
    harness.subscribe(key("abc", Persona::Qa));
    harness.reply(FetchReply::Body(json!({
        "metrics": {},
        "insights": {
            "baseInsights": [{"title": "Base"}],
            "personaInsights": {
                "developer": [{"title": "Dev"}],
                "qa": [{"title": "Flaky checkout test"}]
            }
        }
    })));

    let last = harness.published.last().unwrap();
    assert_eq!(last.status, PollStatus::Succeeded);
    let titles: Vec<_> = last
        .data
        .as_ref()
        .unwrap()
        .insights
        .iter()
        .map(|insight| insight.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Base", "Flaky checkout test"]);
}
