use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const DEFAULT_ENVIRONMENT: &str = "Production";
pub const UNKNOWN_DOMAIN: &str = "Unknown Domain";

/// Canonical, default-complete analysis result.
///
/// Every container is always present; missing server fields become empty
/// containers or zeroes during normalization.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedResult {
    pub metrics: Metrics,
    pub insights: Vec<Insight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl NormalizedResult {
    /// Domain the report is about, for headings.
    pub fn primary_domain(&self) -> &str {
        self.metrics
            .domains
            .first()
            .map(String::as_str)
            .unwrap_or(UNKNOWN_DOMAIN)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub primary: PrimaryMetrics,
    pub selected: SelectedMetrics,
    pub timeseries: Vec<TimePoint>,
    pub domains: Vec<String>,
    pub requests_by_type: BTreeMap<String, f64>,
    pub status_codes: BTreeMap<String, f64>,
    pub environment: String,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            primary: PrimaryMetrics::default(),
            selected: SelectedMetrics::default(),
            timeseries: Vec::new(),
            domains: Vec::new(),
            requests_by_type: BTreeMap::new(),
            status_codes: BTreeMap::new(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
        }
    }
}

/// Aggregate scalar statistics of the capture.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryMetrics {
    pub error_rate: f64,
    pub total_size: f64,
    pub total_requests: f64,
    pub avg_response_time: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedMetrics {
    pub slowest_requests: Vec<RequestSummary>,
    pub largest_requests: Vec<RequestSummary>,
    pub error_requests: Vec<RequestSummary>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSummary {
    pub url: String,
    /// Response time in milliseconds.
    pub time: f64,
    /// Transfer size in bytes.
    pub size: f64,
    pub status: f64,
    pub status_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TimePoint {
    pub timestamp: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Insight {
    pub category: String,
    pub severity: String,
    pub title: String,
    pub content: String,
    pub recommendations: Vec<String>,
}
