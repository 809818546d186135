//! Registration, two-step login and session routes.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use domain::models::account::{RegisterAccountRequest, RegisterAccountResponse};
use domain::models::session::SessionStatusResponse;
use domain::models::{AccountVariant, AuthenticatedIdentity};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::auth::AuthError;
use crate::services::sessions::{PortalSession, SessionCookie, SessionError};

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailAlreadyExists => ApiError::Conflict(err.to_string()),
            AuthError::RegistrationClosed => ApiError::Forbidden(err.to_string()),
            AuthError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid login details".to_string())
            }
            AuthError::Validation(errors) => ApiError::from(errors),
            AuthError::PasswordError(e) => ApiError::Internal(format!("Password error: {}", e)),
            AuthError::DatabaseError(e) => ApiError::from(e),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// Account identifier or email.
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub code_sent: bool,
    pub expires_at: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogoutResponse {
    pub logged_out: bool,
}

/// Registers a staff or applicant account.
///
/// POST /api/v1/auth/:variant/register
pub async fn register(
    State(state): State<AppState>,
    Path(variant): Path<AccountVariant>,
    Json(request): Json<RegisterAccountRequest>,
) -> Result<(StatusCode, Json<RegisterAccountResponse>), ApiError> {
    let response = state.auth.register(variant, &request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Checks the password and mails a one-time code.
///
/// POST /api/v1/auth/:variant/login
pub async fn login(
    State(state): State<AppState>,
    Path(variant): Path<AccountVariant>,
    mut session: PortalSession,
    Json(request): Json<LoginRequest>,
) -> Result<(StatusCode, SessionCookie, Json<LoginResponse>), ApiError> {
    let challenge = state
        .auth
        .login(variant, &request.login, &request.password, &mut session.data)
        .await?;

    // The challenge is kept even if the mail fails, so the user can still
    // enter a code delivered late.
    let code_sent = state.auth.deliver_code(&challenge).await;
    let cookie = state.sessions.commit(&mut session).await?;

    let message = if code_sent {
        format!(
            "A verification code has been sent to {}",
            mask_email(&challenge.account.email)
        )
    } else {
        "We could not send your verification code. Please contact ICT support.".to_string()
    };

    Ok((
        StatusCode::ACCEPTED,
        cookie,
        Json(LoginResponse {
            code_sent,
            expires_at: challenge.expires_at,
            message,
        }),
    ))
}

/// Completes login with the mailed code.
///
/// POST /api/v1/auth/verify
pub async fn verify(
    State(state): State<AppState>,
    mut session: PortalSession,
    Json(request): Json<VerifyRequest>,
) -> Result<(SessionCookie, Json<AuthenticatedIdentity>), ApiError> {
    let result = state.auth.verify(&mut session.data, &request.code);

    match result {
        Ok(identity) => {
            // Fresh token for the authenticated session.
            state.sessions.regenerate(&mut session).await?;
            let cookie = state.sessions.commit(&mut session).await?;
            Ok((cookie, Json(identity)))
        }
        Err(e) => {
            // Failed attempts and discarded challenges must be persisted.
            if session.is_stored() {
                state.sessions.commit(&mut session).await?;
            }
            Err(e.into())
        }
    }
}

/// Reports whether the session is anonymous, challenged or authenticated.
///
/// GET /api/v1/auth/session
pub async fn session_status(
    State(state): State<AppState>,
    mut session: PortalSession,
) -> Json<SessionStatusResponse> {
    let now = Utc::now();
    let has_draft = session
        .data
        .current_draft(now, state.sessions.draft_ttl())
        .is_some();

    Json(SessionStatusResponse {
        status: session.data.status(),
        identity: session.data.identity.clone(),
        challenge_expires_at: session
            .data
            .challenge
            .as_ref()
            .filter(|c| !c.is_expired(now))
            .map(|c| c.expires_at),
        has_draft,
    })
}

/// Ends the session.
///
/// POST /api/v1/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    mut session: PortalSession,
) -> Result<(SessionCookie, Json<LogoutResponse>), ApiError> {
    let logged_out = session.data.identity.is_some();
    state.enrollment.discard_draft(&mut session.data).await;
    let cookie = state.sessions.destroy(session).await?;
    Ok((cookie, Json(LogoutResponse { logged_out })))
}

/// `jane.doe@example.com` becomes `j***@example.com`.
fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first: String = local.chars().take(1).collect();
            format!("{}***@{}", first, domain)
        }
        None => "your registered email".to_string(),
    }
}
