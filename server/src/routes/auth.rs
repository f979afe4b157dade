//! Auth routes: registration, login, logout, session refresh.
//!
//! Both tokens travel as HttpOnly cookies scoped to `/`, so the page guard
//! sees the refresh cookie and every API call carries the access cookie.

use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use session::{ACCESS_COOKIE, REFRESH_COOKIE, User};
use time::{Duration, OffsetDateTime};

use crate::services::accounts::AccountError;
use crate::services::tokens::TokenPair;
use crate::state::AppState;

fn session_cookie(name: &'static str, value: String, max_age: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(max_age)
        .build()
}

fn cleared_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    session_cookie(name, String::new(), Duration::ZERO, secure)
}

async fn with_session_cookies(state: &AppState, jar: CookieJar, pair: TokenPair) -> CookieJar {
    let secure = state.config.cookie_secure;
    let tokens = state.tokens.read().await;
    jar.add(session_cookie(ACCESS_COOKIE, pair.access, tokens.access_ttl(), secure))
        .add(session_cookie(REFRESH_COOKIE, pair.refresh, tokens.refresh_ttl(), secure))
}

fn without_session_cookies(state: &AppState, jar: CookieJar) -> CookieJar {
    let secure = state.config.cookie_secure;
    jar.add(cleared_cookie(ACCESS_COOKIE, secure)).add(cleared_cookie(REFRESH_COOKIE, secure))
}

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Authenticated user extracted from the access cookie.
/// Use as a handler parameter to require authentication.
pub struct AuthUser {
    pub user: User,
}

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(ACCESS_COOKIE).map(Cookie::value).unwrap_or_default();
        if token.is_empty() {
            return Err(StatusCode::UNAUTHORIZED);
        }

        let app_state = AppState::from_ref(state);
        let user_id = app_state
            .tokens
            .read()
            .await
            .validate_access(token, OffsetDateTime::now_utc())
            .map_err(|_| StatusCode::UNAUTHORIZED)?;
        let user = app_state.accounts.read().await.user(user_id).ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(Self { user })
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
    name: String,
    email: String,
    password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

/// `POST /api/auth/register`: create an account and start a session.
pub async fn register(State(state): State<AppState>, jar: CookieJar, Json(body): Json<RegisterRequest>) -> Response {
    let user = match state.accounts.write().await.register(&body.name, &body.email, &body.password) {
        Ok(user) => user,
        Err(AccountError::EmailTaken) => return (StatusCode::CONFLICT, "email already registered").into_response(),
        Err(AccountError::Hashing) => {
            tracing::error!("password hashing failed during registration");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
        Err(e) => return (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response(),
    };

    let pair = state.tokens.write().await.issue(user.id, OffsetDateTime::now_utc());
    let jar = with_session_cookies(&state, jar, pair).await;
    tracing::info!(user_id = %user.id, "account registered");
    (StatusCode::CREATED, jar, Json(user)).into_response()
}

/// `POST /api/auth/login`: check credentials and set session cookies.
pub async fn login(State(state): State<AppState>, jar: CookieJar, Json(body): Json<LoginRequest>) -> Response {
    let user = match state.accounts.read().await.authenticate(&body.email, &body.password) {
        Ok(user) => user,
        Err(e) => {
            tracing::debug!(error = %e, "login rejected");
            return (StatusCode::UNAUTHORIZED, e.to_string()).into_response();
        }
    };

    let pair = state.tokens.write().await.issue(user.id, OffsetDateTime::now_utc());
    let jar = with_session_cookies(&state, jar, pair).await;
    tracing::info!(user_id = %user.id, "session started");
    (jar, Json(user)).into_response()
}

/// `POST /api/auth/refresh-token`: mint a new access cookie from the refresh cookie.
pub async fn refresh_token(State(state): State<AppState>, jar: CookieJar) -> Response {
    let refresh = jar.get(REFRESH_COOKIE).map(Cookie::value).unwrap_or_default().to_owned();
    if refresh.is_empty() {
        return (StatusCode::UNAUTHORIZED, "missing refresh token").into_response();
    }

    let refreshed = state.tokens.write().await.refresh(&refresh, OffsetDateTime::now_utc());
    match refreshed {
        Ok((user_id, pair)) => {
            tracing::debug!(%user_id, "session refreshed");
            let jar = with_session_cookies(&state, jar, pair).await;
            (jar, StatusCode::NO_CONTENT).into_response()
        }
        Err(e) => {
            tracing::debug!(error = %e, "refresh rejected");
            let jar = without_session_cookies(&state, jar);
            (jar, (StatusCode::UNAUTHORIZED, e.to_string())).into_response()
        }
    }
}

/// `POST /api/auth/logout`: revoke the session and clear cookies.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if let Some(refresh) = jar.get(REFRESH_COOKIE).map(Cookie::value).filter(|v| !v.is_empty()) {
        state.tokens.write().await.revoke(refresh);
    }
    let jar = without_session_cookies(&state, jar);
    (jar, StatusCode::NO_CONTENT)
}

/// `GET /api/auth/me`: return current user.
pub async fn me(auth: AuthUser) -> Json<User> {
    Json(auth.user)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
