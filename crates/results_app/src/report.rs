use results_core::{NormalizedResult, PollSnapshot, PollStatus};

const MAX_LISTED_INSIGHTS: usize = 5;

/// One line per published transition.
pub fn status_line(snapshot: &PollSnapshot) -> String {
    let subject = snapshot
        .key
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "-".to_string());
    let mut line = format!(
        "[{}] {:?} ({}/{})",
        subject, snapshot.status, snapshot.retry_count, snapshot.max_retries
    );
    if snapshot.is_provisional() {
        line.push_str(" cached");
    }
    if let Some(message) = snapshot.user_message() {
        line.push_str(": ");
        line.push_str(&message);
    }
    line
}

/// Short human-readable digest of a finished analysis.
pub fn summary(result: &NormalizedResult) -> Vec<String> {
    let primary = &result.metrics.primary;
    let mut lines = vec![
        format!("Domain: {}", result.primary_domain()),
        format!("Environment: {}", result.metrics.environment),
        format!(
            "Requests: {}  Total size: {} bytes  Avg response: {:.1} ms  Error rate: {:.1}%",
            primary.total_requests,
            primary.total_size,
            primary.avg_response_time,
            primary.error_rate
        ),
    ];

    if let Some(slowest) = result.metrics.selected.slowest_requests.first() {
        lines.push(format!("Slowest: {} ({:.0} ms)", slowest.url, slowest.time));
    }

    if !result.insights.is_empty() {
        lines.push(format!("Insights ({}):", result.insights.len()));
        for insight in result.insights.iter().take(MAX_LISTED_INSIGHTS) {
            lines.push(format!("  - [{}] {}", insight.severity, insight.title));
        }
        if result.insights.len() > MAX_LISTED_INSIGHTS {
            lines.push(format!(
                "  ... and {} more",
                result.insights.len() - MAX_LISTED_INSIGHTS
            ));
        }
    }
    lines
}

/// Process exit code for a terminal status.
pub fn exit_code(status: PollStatus) -> u8 {
    match status {
        PollStatus::Succeeded => 0,
        PollStatus::TimedOut => 2,
        _ => 1,
    }
}
