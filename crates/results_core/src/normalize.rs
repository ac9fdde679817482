use std::collections::BTreeMap;

use engine_logging::engine_debug;
use serde_json::{Map, Value};

use crate::{
    Insight, Metrics, NormalizationError, NormalizedResult, Persona, PrimaryMetrics,
    RequestSummary, SelectedMetrics, TimePoint, DEFAULT_ENVIRONMENT,
};

const PROCESSING_STATUS: &str = "processing";

/// Outcome of normalizing a well-formed response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// The job exists but has no result yet.
    Processing,
    Ready(NormalizedResult),
}

/// Turns a possibly partial server payload into a canonical result for `persona`.
///
/// Missing or mistyped nested fields never fail; they take their documented
/// defaults. Only a non-object payload, or one carrying neither a result marker
/// (`metrics`/`insights`) nor a processing status, is rejected. Grouped insights
/// keep the shared list and the requesting persona's list only.
pub fn normalize(raw: &Value, persona: &Persona) -> Result<Payload, NormalizationError> {
    let Value::Object(body) = raw else {
        return Err(NormalizationError::NotAnObject {
            found: kind_of(raw),
        });
    };

    if is_processing(body) {
        return Ok(Payload::Processing);
    }

    let metrics = non_null(body, "metrics");
    let insights = non_null(body, "insights");
    if metrics.is_none() && insights.is_none() {
        return Err(NormalizationError::MissingResultMarker);
    }

    let created_at = ["created_at", "createdAt"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string);

    Ok(Payload::Ready(NormalizedResult {
        metrics: metrics.map(normalize_metrics).unwrap_or_default(),
        insights: insights
            .map(|raw| normalize_insights(raw, persona))
            .unwrap_or_default(),
        created_at,
    }))
}

fn is_processing(body: &Map<String, Value>) -> bool {
    body.get("status")
        .and_then(Value::as_str)
        .is_some_and(|status| status.trim().eq_ignore_ascii_case(PROCESSING_STATUS))
}

fn non_null<'a>(body: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    body.get(key).filter(|value| !value.is_null())
}

fn normalize_metrics(raw: &Value) -> Metrics {
    let Value::Object(metrics) = raw else {
        engine_debug!("metrics is {}, using defaults", kind_of(raw));
        return Metrics::default();
    };

    Metrics {
        primary: normalize_primary(metrics),
        selected: metrics
            .get("selected")
            .and_then(Value::as_object)
            .map(normalize_selected)
            .unwrap_or_default(),
        timeseries: metrics
            .get("timeseries")
            .map(normalize_timeseries)
            .unwrap_or_default(),
        domains: metrics
            .get("domains")
            .map(flatten_domains)
            .unwrap_or_default(),
        requests_by_type: metrics
            .get("requestsByType")
            .map(number_map)
            .unwrap_or_default(),
        status_codes: metrics
            .get("statusCodes")
            .map(number_map)
            .unwrap_or_default(),
        environment: metrics
            .get("environment")
            .and_then(Value::as_str)
            .filter(|env| !env.trim().is_empty())
            .unwrap_or(DEFAULT_ENVIRONMENT)
            .to_string(),
    }
}

fn normalize_primary(metrics: &Map<String, Value>) -> PrimaryMetrics {
    let primary = metrics.get("primary").and_then(Value::as_object);
    // Older payloads put the aggregates directly on `metrics`.
    let read = |key: &str| {
        primary
            .and_then(|p| p.get(key))
            .or_else(|| metrics.get(key))
            .map(coerce_number)
            .unwrap_or(0.0)
    };
    PrimaryMetrics {
        error_rate: read("errorRate"),
        total_size: read("totalSize"),
        total_requests: read("totalRequests"),
        avg_response_time: read("avgResponseTime"),
    }
}

fn normalize_selected(selected: &Map<String, Value>) -> SelectedMetrics {
    let list = |key: &str| {
        selected
            .get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(normalize_request).collect())
            .unwrap_or_default()
    };
    SelectedMetrics {
        slowest_requests: list("slowestRequests"),
        largest_requests: list("largestRequests"),
        error_requests: list("errorRequests"),
    }
}

fn normalize_request(raw: &Value) -> Option<RequestSummary> {
    let request = raw.as_object()?;
    let number = |key: &str| request.get(key).map(coerce_number).unwrap_or(0.0);
    let text = |key: &str| {
        request
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    Some(RequestSummary {
        url: text("url"),
        time: number("time"),
        size: number("size"),
        status: number("status"),
        status_text: text("statusText"),
    })
}

fn normalize_timeseries(raw: &Value) -> Vec<TimePoint> {
    let Some(points) = raw.as_array() else {
        engine_debug!("timeseries is {}, using empty series", kind_of(raw));
        return Vec::new();
    };
    points
        .iter()
        .filter_map(Value::as_object)
        .map(|point| TimePoint {
            timestamp: point.get("timestamp").map(coerce_number).unwrap_or(0.0),
            value: point.get("value").map(coerce_number).unwrap_or(0.0),
        })
        .collect()
}

/// Flattens list-, set- or map-shaped domain collections into unique strings,
/// keeping first-seen order.
fn flatten_domains(raw: &Value) -> Vec<String> {
    let candidates: Vec<String> = match raw {
        Value::Array(items) => items.iter().filter_map(scalar_to_string).collect(),
        Value::Object(map) => map.keys().cloned().collect(),
        Value::String(single) => vec![single.clone()],
        _ => Vec::new(),
    };

    let mut domains: Vec<String> = Vec::with_capacity(candidates.len());
    for domain in candidates {
        let domain = domain.trim();
        if !domain.is_empty() && !domains.iter().any(|known| known == domain) {
            domains.push(domain.to_string());
        }
    }
    domains
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn number_map(raw: &Value) -> BTreeMap<String, f64> {
    raw.as_object()
        .map(|map| {
            map.iter()
                .map(|(key, value)| (key.clone(), coerce_number(value)))
                .collect()
        })
        .unwrap_or_default()
}

fn normalize_insights(raw: &Value, persona: &Persona) -> Vec<Insight> {
    match raw {
        Value::Array(items) => items.iter().filter_map(normalize_insight).collect(),
        Value::Object(grouped) => {
            let mut insights = grouped
                .get("baseInsights")
                .map(|base| normalize_insights(base, persona))
                .unwrap_or_default();
            let own = grouped
                .get("personaInsights")
                .and_then(Value::as_object)
                .and_then(|per_persona| per_persona.get(persona.as_str()));
            if let Some(list) = own {
                insights.extend(normalize_insights(list, persona));
            }
            insights
        }
        Value::String(_) => normalize_insight(raw).into_iter().collect(),
        _ => {
            engine_debug!("insights is {}, using empty list", kind_of(raw));
            Vec::new()
        }
    }
}

fn normalize_insight(raw: &Value) -> Option<Insight> {
    match raw {
        Value::String(content) if !content.trim().is_empty() => Some(Insight {
            content: content.clone(),
            ..Insight::default()
        }),
        Value::Object(insight) => {
            let text = |key: &str| {
                insight
                    .get(key)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            let recommendations = insight
                .get("recommendations")
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(scalar_to_string).collect())
                .unwrap_or_default();
            Some(Insight {
                category: text("category"),
                severity: text("severity"),
                title: text("title"),
                content: text("content"),
                recommendations,
            })
        }
        _ => None,
    }
}

/// Numbers and numeric strings pass through; anything else, including
/// non-finite values, becomes `0`.
fn coerce_number(value: &Value) -> f64 {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite()).unwrap_or(0.0)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
