use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use serde::Serialize;

/// Destination for per-request counters.
pub trait MetricsSink: Send + Sync {
    fn record(&self, path: &str, status: StatusCode);
    fn snapshot(&self) -> MetricsSnapshot;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    /// Responses with status >= 400.
    pub errors_total: u64,
    /// Keyed by route template, e.g. `/api/pets/:pet_id`.
    pub per_path: BTreeMap<String, u64>,
}

/// In-process counters behind a mutex.
#[derive(Debug, Default)]
pub struct RequestMetrics {
    counters: Mutex<MetricsSnapshot>,
}

impl RequestMetrics {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MetricsSink for RequestMetrics {
    fn record(&self, path: &str, status: StatusCode) {
        let mut counters = match self.counters.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        counters.requests_total += 1;
        *counters.per_path.entry(path.to_string()).or_insert(0) += 1;
        if status.is_client_error() || status.is_server_error() {
            counters.errors_total += 1;
        }
    }

    fn snapshot(&self) -> MetricsSnapshot {
        match self.counters.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Log each request and count it once the response exists.
pub async fn log_requests(
    State(metrics): State<Arc<dyn MetricsSink>>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri_path = request.uri().path().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let start = Instant::now();
    tracing::info!("→ {} {}", method, uri_path);

    let response = next.run(request).await;
    let status = response.status();
    tracing::info!("← {} {} {} {:?}", method, uri_path, status.as_u16(), start.elapsed());

    metrics.record(&route, status);
    response
}
