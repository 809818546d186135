//! Session and identity extractors.
//!
//! The session row is loaded once per request and cached in the request
//! extensions, so a handler may take both a [`PortalSession`] and an
//! identity guard without a second lookup.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use domain::models::{AccountVariant, AuthenticatedIdentity};

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::sessions::PortalSession;

#[async_trait]
impl FromRequestParts<AppState> for PortalSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<PortalSession>() {
            return Ok(session.clone());
        }

        let session = state
            .sessions
            .load(&parts.headers)
            .await
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        parts.extensions.insert(session.clone());
        Ok(session)
    }
}

/// Returns the signed-in identity, optionally requiring a variant.
pub fn require_identity(
    session: &PortalSession,
    variant: Option<AccountVariant>,
) -> Result<AuthenticatedIdentity, ApiError> {
    let identity = session
        .data
        .identity
        .as_ref()
        .ok_or_else(|| ApiError::Unauthorized("Please sign in to continue".to_string()))?;

    match variant {
        Some(required) if identity.variant != required => Err(ApiError::Forbidden(format!(
            "This page is only available to {} accounts",
            required.as_str()
        ))),
        _ => Ok(identity.clone()),
    }
}

/// Any signed-in account.
#[derive(Debug, Clone)]
pub struct AccountAuth(pub AuthenticatedIdentity);

/// A signed-in staff account.
#[derive(Debug, Clone)]
pub struct StaffAuth(pub AuthenticatedIdentity);

/// A signed-in applicant account.
#[derive(Debug, Clone)]
pub struct ApplicantAuth(pub AuthenticatedIdentity);

macro_rules! identity_extractor {
    ($name:ident, $variant:expr) => {
        #[async_trait]
        impl FromRequestParts<AppState> for $name {
            type Rejection = ApiError;

            async fn from_request_parts(
                parts: &mut Parts,
                state: &AppState,
            ) -> Result<Self, Self::Rejection> {
                let session = PortalSession::from_request_parts(parts, state).await?;
                require_identity(&session, $variant).map($name)
            }
        }
    };
}

identity_extractor!(AccountAuth, None);
identity_extractor!(StaffAuth, Some(AccountVariant::Staff));
identity_extractor!(ApplicantAuth, Some(AccountVariant::Applicant));

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn session_with(variant: AccountVariant) -> PortalSession {
        let mut session = PortalSession::default();
        session.data.identity = Some(AuthenticatedIdentity {
            account_id: "S0001".to_string(),
            variant,
            full_name: "Ana Vula".to_string(),
            email: "ana@example.com".to_string(),
            photo: "photos/applicants/default.png".to_string(),
            authenticated_at: Utc::now(),
        });
        session
    }

    #[test]
    fn test_anonymous_session_is_unauthorized() {
        let result = require_identity(&PortalSession::default(), None);
        assert!(matches!(result, Err(ApiError::Unauthorized(_))));
    }

    #[test]
    fn test_wrong_variant_is_forbidden() {
        let session = session_with(AccountVariant::Applicant);
        let result = require_identity(&session, Some(AccountVariant::Staff));
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }

    #[test]
    fn test_matching_variant_returns_identity() {
        let session = session_with(AccountVariant::Applicant);
        let identity = require_identity(&session, Some(AccountVariant::Applicant)).unwrap();
        assert_eq!(identity.account_id, "S0001");

        assert!(require_identity(&session, None).is_ok());
    }
}
