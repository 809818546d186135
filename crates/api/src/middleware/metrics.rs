//! Prometheus metrics middleware.
//!
//! Provides HTTP request/response metrics, portal business counters and the
//! Prometheus text export.

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Middleware to record HTTP request metrics.
///
/// - `http_requests_total`: counter (method, path, status)
/// - `http_request_duration_seconds`: histogram (method, path)
///
/// `path` is the matched route template, so identifiers in URLs do not
/// create new series.
pub async fn metrics_middleware(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = method_to_str(req.method());
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    counter!(
        "http_requests_total",
        "method" => method,
        "path" => path.clone(),
        "status" => status
    )
    .increment(1);

    histogram!(
        "http_request_duration_seconds",
        "method" => method,
        "path" => path
    )
    .record(duration);

    response
}

/// Convert HTTP method to string for metric labels.
fn method_to_str(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::POST => "POST",
        Method::PUT => "PUT",
        Method::DELETE => "DELETE",
        Method::PATCH => "PATCH",
        Method::HEAD => "HEAD",
        Method::OPTIONS => "OPTIONS",
        _ => "OTHER",
    }
}

pub fn record_registration(variant: &'static str) {
    counter!("portal_registrations_total", "variant" => variant).increment(1);
}

pub fn record_otp_issued(delivered: bool) {
    counter!(
        "portal_otp_challenges_issued_total",
        "delivered" => if delivered { "true" } else { "false" }
    )
    .increment(1);
}

pub fn record_otp_verified() {
    counter!("portal_otp_challenges_verified_total").increment(1);
}

/// Failed verification, labelled with the failure kind.
pub fn record_otp_failed(reason: &'static str) {
    counter!("portal_otp_challenges_failed_total", "reason" => reason).increment(1);
}

pub fn record_application_submitted(year_level: &'static str) {
    counter!("portal_applications_submitted_total", "year_level" => year_level).increment(1);
}

pub fn record_review_decision(status: &'static str) {
    counter!("portal_review_decisions_total", "status" => status).increment(1);
}

pub fn record_upload(class: &'static str) {
    counter!("portal_uploads_total", "class" => class).increment(1);
}

/// Handler for /metrics endpoint that returns Prometheus text format.
pub async fn metrics_handler() -> impl IntoResponse {
    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        (
            axum::http::StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
    } else {
        (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            [(axum::http::header::CONTENT_TYPE, "text/plain")],
            "Metrics not initialized".to_string(),
        )
    }
}

/// Install the global Prometheus recorder.
///
/// Only the first call installs a recorder; later calls are no-ops, so
/// building several routers in one process (tests) is fine.
pub fn init_metrics() -> Result<(), BuildError> {
    if PROMETHEUS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .set_buckets(&[0.001, 0.005, 0.01, 0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0])?
        .install_recorder()?;

    // Lost race with a concurrent initializer; the installed recorder wins.
    let _ = PROMETHEUS_HANDLE.set(handle);
    Ok(())
}
