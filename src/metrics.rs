//! Prometheus metrics: HTTP traffic plus a few domain counters.
//!
//! Everything here is a no-op when `METRICS_ENABLED` is `false` or `0`.

use axum::{Router, extract::Request, middleware::Next, response::Response, routing::get};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use crate::logging::route_of;

const REQUEST_DURATION: &str = "http_request_duration_seconds";
const LATENCY_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];
const UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

static ENABLED: OnceLock<bool> = OnceLock::new();

pub fn metrics_enabled() -> bool {
    *ENABLED.get_or_init(|| match std::env::var("METRICS_ENABLED") {
        Ok(value) => !(value.eq_ignore_ascii_case("false") || value == "0"),
        Err(_) => true,
    })
}

/// Installs the Prometheus recorder and its upkeep task.
///
/// Returns `Ok(None)` when metrics are disabled.
pub fn init_metrics() -> anyhow::Result<Option<PrometheusHandle>> {
    if !metrics_enabled() {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(REQUEST_DURATION.to_owned()), LATENCY_BUCKETS)?
        .install_recorder()?;

    let upkeep = handle.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(UPKEEP_INTERVAL);
        loop {
            interval.tick().await;
            upkeep.run_upkeep();
        }
    });

    Ok(Some(handle))
}

/// Serves the Prometheus exposition at `/metrics`.
pub fn metrics_app(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

/// Counts requests and records their latency, labelled by route template.
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !metrics_enabled() {
        return next.run(req).await;
    }

    let started = Instant::now();
    let method = req.method().to_string();
    let path = route_of(&req);

    let in_flight = gauge!("http_requests_in_flight");
    in_flight.increment(1.0);
    let response = next.run(req).await;
    in_flight.decrement(1.0);

    let status = response.status().as_u16().to_string();
    histogram!(REQUEST_DURATION, "method" => method.clone(), "path" => path.clone())
        .record(started.elapsed().as_secs_f64());
    counter!("http_requests_total", "method" => method, "path" => path, "status" => status)
        .increment(1);

    response
}

pub fn track_user_registered(role: &str) {
    if metrics_enabled() {
        counter!("devcamper_users_registered_total", "role" => role.to_owned()).increment(1);
    }
}

pub fn track_login(success: bool) {
    if metrics_enabled() {
        let outcome = if success { "success" } else { "failure" };
        counter!("devcamper_logins_total", "outcome" => outcome).increment(1);
    }
}

/// `stage` is `requested`, `delivery_failed` or `completed`.
pub fn track_password_reset(stage: &'static str) {
    if metrics_enabled() {
        counter!("devcamper_password_resets_total", "stage" => stage).increment(1);
    }
}

pub fn track_resource_created(resource: &'static str) {
    if metrics_enabled() {
        counter!("devcamper_resources_created_total", "resource" => resource).increment(1);
    }
}
