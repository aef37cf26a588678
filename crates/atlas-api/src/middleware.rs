//! Cross-cutting middleware: request timing, correlation-id echoing, and
//! security headers (§10.2 Logging & tracing, §8 "every response echoes
//! `x-correlation-id`").

use axum::{
    extract::Request,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use uuid::Uuid;

/// Logs slow requests at `warn`, everything else at `debug` - matches the
/// reference stack's `timing_middleware` threshold. Also records a request
/// counter and a latency histogram for the `metrics` exporter installed by
/// the service binary.
pub async fn timing_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let path = uri.path().to_string();

    let response = next.run(req).await;
    let elapsed = start.elapsed();
    let status = response.status().as_u16();

    metrics::counter!(
        "atlas_api_requests_total",
        "method" => method.to_string(),
        "path" => path.clone(),
        "status" => status.to_string(),
    )
    .increment(1);
    metrics::histogram!(
        "atlas_api_request_duration_ms",
        "method" => method.to_string(),
        "path" => path,
    )
    .record(elapsed.as_millis() as f64);

    if elapsed.as_millis() > 1000 {
        tracing::warn!(
            method = %method,
            uri = %uri,
            elapsed_ms = elapsed.as_millis(),
            "slow request"
        );
    } else {
        tracing::debug!(
            method = %method,
            uri = %uri,
            elapsed_ms = elapsed.as_millis(),
            status = status,
            "request completed"
        );
    }

    response
}

/// Ensures every response carries `x-correlation-id`, generating one if
/// the request arrived without it (the `CorrelationId` extractor already
/// resolves the same value for handlers; this middleware guarantees it
/// reaches the response even when a handler bails out early).
pub async fn correlation_id_middleware(req: Request, next: Next) -> Response {
    let incoming = req
        .headers()
        .get("x-correlation-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let mut response = next.run(req).await;

    let correlation_id = incoming.unwrap_or_else(|| Uuid::new_v4().to_string());
    if let Ok(value) = correlation_id.parse() {
        response.headers_mut().insert("x-correlation-id", value);
    }

    response
}

/// Security headers applied to every response, matching the reference
/// stack's `security_headers_middleware`.
pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert("X-Content-Type-Options", "nosniff".parse().unwrap());
    headers.insert("X-Frame-Options", "DENY".parse().unwrap());
    headers.insert(
        "Referrer-Policy",
        "strict-origin-when-cross-origin".parse().unwrap(),
    );

    response
}
