//! Session cookie helper.
//!
//! The browser only ever holds the opaque session token, in an HttpOnly,
//! SameSite=Lax cookie scoped to the whole site.

use axum::http::{header::COOKIE, HeaderMap};

use crate::config::SessionConfig;

const COOKIE_PATH: &str = "/";
const SAME_SITE: &str = "Lax";

#[derive(Debug, Clone)]
pub struct CookieHelper {
    name: String,
    secure: bool,
    max_age_secs: i64,
}

impl CookieHelper {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            name: config.cookie_name.clone(),
            secure: config.cookie_secure,
            max_age_secs: config.idle_timeout_secs,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.name
    }

    /// Build a Set-Cookie header value carrying the session token.
    pub fn build_session_cookie(&self, token: &str) -> String {
        self.with_attributes(format!(
            "{}={}; Path={}; Max-Age={}",
            self.name, token, COOKIE_PATH, self.max_age_secs
        ))
    }

    /// Build a Set-Cookie header value that removes the session cookie.
    pub fn build_clear_cookie(&self) -> String {
        self.with_attributes(format!(
            "{}=; Path={}; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
            self.name, COOKIE_PATH
        ))
    }

    /// Extract the session token from the request's Cookie header.
    pub fn extract_session_token<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|h| h.to_str().ok())
            .flat_map(|header| header.split(';'))
            .map(str::trim)
            .find_map(|cookie| {
                let (name, value) = cookie.split_once('=')?;
                (name == self.name && !value.is_empty()).then_some(value)
            })
    }

    fn with_attributes(&self, mut cookie: String) -> String {
        cookie.push_str("; HttpOnly");
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str("; SameSite=");
        cookie.push_str(SAME_SITE);
        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn helper(secure: bool) -> CookieHelper {
        CookieHelper::new(&SessionConfig {
            cookie_name: "portal_session".to_string(),
            cookie_secure: secure,
            idle_timeout_secs: 7200,
            draft_ttl_secs: 3600,
        })
    }

    #[test]
    fn test_build_session_cookie() {
        let cookie = helper(true).build_session_cookie("abc123");

        assert!(cookie.starts_with("portal_session=abc123"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=7200"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Lax"));
    }

    #[test]
    fn test_cookie_without_secure() {
        let cookie = helper(false).build_session_cookie("abc123");
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn test_build_clear_cookie() {
        let cookie = helper(false).build_clear_cookie();

        assert!(cookie.starts_with("portal_session=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.contains("Expires=Thu, 01 Jan 1970 00:00:00 GMT"));
        assert!(cookie.contains("HttpOnly"));
    }

    #[test]
    fn test_extract_session_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; portal_session=xyz789; other=value"),
        );

        assert_eq!(helper(false).extract_session_token(&headers), Some("xyz789"));
    }

    #[test]
    fn test_extract_session_token_missing_or_empty() {
        let helper = helper(false);
        assert_eq!(helper.extract_session_token(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("portal_session="));
        assert_eq!(helper.extract_session_token(&headers), None);
    }
}
