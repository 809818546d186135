//! Security headers middleware.
//!
//! Adds security-related HTTP headers to all responses.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

/// Value sent with `Strict-Transport-Security` when HSTS is enabled.
pub const HSTS_VALUE: &str = "max-age=31536000; includeSubDomains";

/// Security header names as constants for testing and documentation.
pub mod headers {
    pub const X_CONTENT_TYPE_OPTIONS: &str = "x-content-type-options";
    pub const X_FRAME_OPTIONS: &str = "x-frame-options";
    pub const REFERRER_POLICY: &str = "referrer-policy";
}

/// Middleware that adds security headers to all responses.
///
/// - `X-Content-Type-Options: nosniff`
/// - `X-Frame-Options: DENY`
/// - `Referrer-Policy: same-origin`
/// - `Strict-Transport-Security`, only when `security.hsts_enabled` is set.
///   Enable it only when TLS is terminated in front of the service.
pub async fn security_headers_middleware(
    State(hsts_enabled): State<bool>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::HeaderName::from_static(headers::X_CONTENT_TYPE_OPTIONS),
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::HeaderName::from_static(headers::X_FRAME_OPTIONS),
        HeaderValue::from_static("DENY"),
    );
    headers.insert(
        header::HeaderName::from_static(headers::REFERRER_POLICY),
        HeaderValue::from_static("same-origin"),
    );

    if hsts_enabled {
        headers.insert(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static(HSTS_VALUE),
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware::from_fn_with_state, routing::get, Router};
    use tower::ServiceExt;

    async fn response_with(hsts_enabled: bool) -> Response {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(from_fn_with_state(hsts_enabled, security_headers_middleware));

        app.oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_headers_are_added() {
        let response = response_with(false).await;
        let headers = response.headers();
        assert_eq!(headers[headers::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(headers[headers::X_FRAME_OPTIONS], "DENY");
        assert_eq!(headers[headers::REFERRER_POLICY], "same-origin");
        assert!(headers.get(header::STRICT_TRANSPORT_SECURITY).is_none());
    }

    #[tokio::test]
    async fn test_hsts_only_when_enabled() {
        let response = response_with(true).await;
        assert_eq!(
            response.headers()[header::STRICT_TRANSPORT_SECURITY],
            HSTS_VALUE
        );
    }
}
