use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{Instrument, debug, error, info, info_span, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

const DEFAULT_DIRECTIVES: &str =
    "devcamper=info,devcamper_db=info,devcamper_cli=info,tower_http=warn,hyper=warn,sqlx=warn";

/// The route template a request matched, or its raw path when none did.
pub(crate) fn route_of(req: &Request) -> String {
    req.extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned())
}

/// Runs each request inside a `request` span and logs its outcome.
///
/// 5xx responses log at `error`, 4xx at `warn`, everything else at `info`.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = req.method().clone();
    let path = route_of(&req);
    let span = info_span!("request", request_id = %Uuid::new_v4(), %method, %path);

    async move {
        debug!("Request received");
        let response = next.run(req).await;

        let status = response.status().as_u16();
        let latency_ms = started.elapsed().as_millis() as u64;
        match status {
            500.. => error!(status, latency_ms, "Request failed"),
            400..=499 => warn!(status, latency_ms, "Request rejected"),
            _ => info!(status, latency_ms, "Request handled"),
        }

        response
    }
    .instrument(span)
    .await
}

/// Installs the global subscriber.
///
/// `RUST_LOG` overrides the default filter. `LOG_FORMAT=json` switches the
/// console output to one JSON object per event.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
    let json = matches!(std::env::var("LOG_FORMAT"), Ok(format) if format.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_current_span(true).with_span_list(false))
            .init();
    } else {
        registry
            .with(fmt::layer().compact().with_file(true).with_line_number(true))
            .init();
    }

    info!(json, "Tracing initialized");
}
