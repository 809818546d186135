//! Server-side session store.
//!
//! Session payloads live in the `portal_sessions` table keyed by the SHA-256
//! of the cookie token. A session row is only written once there is
//! something to keep, and every write slides its expiry forward.

use axum::http::{header::SET_COOKIE, HeaderMap, HeaderValue};
use axum::response::{IntoResponseParts, ResponseParts};
use chrono::{Duration, Utc};
use domain::models::SessionData;
use persistence::repositories::SessionRepository;
use shared::crypto::{generate_session_token, sha256_hex};
use thiserror::Error;
use tracing::debug;

use crate::config::SessionConfig;
use crate::services::cookies::CookieHelper;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session storage error: {0}")]
    Database(#[from] sqlx::Error),
}

/// The session attached to the current request.
#[derive(Debug, Clone, Default)]
pub struct PortalSession {
    /// Raw cookie token, once the session has been stored.
    token: Option<String>,
    pub data: SessionData,
}

impl PortalSession {
    pub fn is_stored(&self) -> bool {
        self.token.is_some()
    }
}

/// `Set-Cookie` produced by a commit or destroy, added to the response.
#[derive(Debug, Clone, Default)]
pub struct SessionCookie(Option<HeaderValue>);

impl SessionCookie {
    pub fn none() -> Self {
        Self(None)
    }

    fn from_string(cookie: String) -> Self {
        Self(HeaderValue::from_str(&cookie).ok())
    }
}

impl IntoResponseParts for SessionCookie {
    type Error = std::convert::Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        if let Some(value) = self.0 {
            res.headers_mut().append(SET_COOKIE, value);
        }
        Ok(res)
    }
}

#[derive(Clone)]
pub struct SessionStore {
    repo: SessionRepository,
    cookies: CookieHelper,
    idle_timeout: Duration,
    draft_ttl: Duration,
}

impl SessionStore {
    pub fn new(repo: SessionRepository, config: &SessionConfig) -> Self {
        Self {
            repo,
            cookies: CookieHelper::new(config),
            idle_timeout: Duration::seconds(config.idle_timeout_secs),
            draft_ttl: Duration::seconds(config.draft_ttl_secs),
        }
    }

    /// Lifetime of an enrollment draft within a session.
    pub fn draft_ttl(&self) -> Duration {
        self.draft_ttl
    }

    /// Loads the session named by the request cookie.
    ///
    /// A missing, unknown or expired token yields a fresh empty session.
    pub async fn load(&self, headers: &HeaderMap) -> Result<PortalSession, SessionError> {
        let Some(token) = self.cookies.extract_session_token(headers) else {
            return Ok(PortalSession::default());
        };

        match self.repo.find_active(&sha256_hex(token)).await? {
            Some(row) => Ok(PortalSession {
                token: Some(token.to_string()),
                data: row.data.0,
            }),
            None => {
                debug!("Session cookie did not match an active session");
                Ok(PortalSession::default())
            }
        }
    }

    /// Persists the session and returns the cookie to send back.
    ///
    /// An empty session that was never stored is not written at all.
    pub async fn commit(&self, session: &mut PortalSession) -> Result<SessionCookie, SessionError> {
        if session.token.is_none() && session.data.is_empty() {
            return Ok(SessionCookie::none());
        }

        let token = session
            .token
            .get_or_insert_with(generate_session_token)
            .clone();
        let expires_at = Utc::now() + self.idle_timeout;
        self.repo
            .save(&sha256_hex(&token), &session.data, expires_at)
            .await?;

        Ok(SessionCookie::from_string(
            self.cookies.build_session_cookie(&token),
        ))
    }

    /// Drops the stored row so the next commit issues a new token.
    ///
    /// Used when the session changes privilege (successful login), so a
    /// token seen before authentication is never valid after it.
    pub async fn regenerate(&self, session: &mut PortalSession) -> Result<(), SessionError> {
        if let Some(old) = session.token.take() {
            self.repo.delete(&sha256_hex(&old)).await?;
        }
        Ok(())
    }

    /// Deletes the session and returns a cookie that clears it in the browser.
    pub async fn destroy(&self, mut session: PortalSession) -> Result<SessionCookie, SessionError> {
        session.data.clear();
        self.regenerate(&mut session).await?;
        Ok(SessionCookie::from_string(self.cookies.build_clear_cookie()))
    }

    /// Removes expired session rows and returns what they held.
    pub async fn purge_expired(&self) -> Result<Vec<SessionData>, SessionError> {
        Ok(self.repo.delete_expired().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn test_default_session_is_not_stored() {
        let session = PortalSession::default();
        assert!(!session.is_stored());
        assert!(session.data.is_empty());
    }

    #[test]
    fn test_session_cookie_sets_header() {
        let cookie = SessionCookie::from_string("portal_session=abc; Path=/".to_string());
        let response = (cookie, "ok").into_response();
        assert_eq!(
            response.headers().get(SET_COOKIE).unwrap(),
            "portal_session=abc; Path=/"
        );
    }

    #[test]
    fn test_empty_session_cookie_adds_nothing() {
        let response = (SessionCookie::none(), "ok").into_response();
        assert!(response.headers().get(SET_COOKIE).is_none());
    }
}
