//! Rate limiting middleware.
//!
//! Throttles the login and code-verification endpoints per client address,
//! so one client cannot brute-force passwords or one-time codes.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use governor::{
    clock::{Clock, DefaultClock},
    DefaultKeyedRateLimiter, Quota, RateLimiter,
};
use serde_json::json;
use std::{net::SocketAddr, num::NonZeroU32};

use crate::app::AppState;

/// Key used when no client address is known.
pub const ANONYMOUS_CLIENT: &str = "anonymous";

/// Rate limiter state shared across all requests, keyed by client address.
pub struct RateLimiterState {
    limiter: DefaultKeyedRateLimiter<String>,
    clock: DefaultClock,
    rate_limit_per_minute: u32,
    trust_forwarded_for: bool,
}

impl RateLimiterState {
    /// Create a limiter allowing `rate_limit_per_minute` requests per client.
    ///
    /// `X-Forwarded-For` only identifies the client when `trust_forwarded_for`
    /// is set, i.e. when a proxy in front of the service overwrites it.
    /// Returns `None` when the limit is zero (limiting disabled).
    pub fn new(rate_limit_per_minute: u32, trust_forwarded_for: bool) -> Option<Self> {
        let per_minute = NonZeroU32::new(rate_limit_per_minute)?;
        Some(Self {
            limiter: RateLimiter::keyed(Quota::per_minute(per_minute)),
            clock: DefaultClock::default(),
            rate_limit_per_minute,
            trust_forwarded_for,
        })
    }

    /// Resolves the limiter key for a request.
    pub fn client_key(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
        let forwarded = if self.trust_forwarded_for {
            forwarded_for(headers)
        } else {
            None
        };
        forwarded
            .or_else(|| peer.map(|addr| addr.ip().to_string()))
            .unwrap_or_else(|| ANONYMOUS_CLIENT.to_string())
    }

    /// Check if a request from `client` should be allowed.
    /// Returns Ok(()) if allowed, or Err with retry_after seconds if rate limited.
    pub fn check(&self, client: &str) -> Result<(), u64> {
        match self.limiter.check_key(&client.to_string()) {
            Ok(_) => Ok(()),
            Err(not_until) => {
                let wait_time = not_until.wait_time_from(self.clock.now());
                Err(wait_time.as_secs().max(1))
            }
        }
    }

    /// Drops state for clients whose quota has fully replenished.
    pub fn prune(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }
}

impl std::fmt::Debug for RateLimiterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterState")
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("trust_forwarded_for", &self.trust_forwarded_for)
            .field("tracked_clients", &self.tracked_clients())
            .finish()
    }
}

/// First `X-Forwarded-For` entry.
fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Middleware that applies the authentication rate limit.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(rate_limiter) = state.rate_limiter.as_deref() {
        let peer = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let client = rate_limiter.client_key(req.headers(), peer);

        if let Err(retry_after) = rate_limiter.check(&client) {
            tracing::warn!(client = %client, "Authentication rate limit exceeded");
            return rate_limited_response(rate_limiter.rate_limit_per_minute, retry_after);
        }
    }

    next.run(req).await
}

/// Create a rate limited response with proper headers and body.
fn rate_limited_response(limit: u32, retry_after: u64) -> Response {
    let body = json!({
        "error": "rate_limited",
        "message": format!("Too many attempts. The limit is {} per minute.", limit),
        "retry_after": retry_after
    });

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, header::HeaderValue::from(retry_after));
    response
}
