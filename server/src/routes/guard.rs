//! Page guard middleware.
//!
//! Runs before any page renders. The decision itself is the pure
//! [`session::RouteGuard::check`]; this layer only adapts it to the request's
//! cookie jar and turns a redirect decision into a `307`.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use session::GuardDecision;

use crate::state::AppState;

pub async fn require_session(State(state): State<AppState>, jar: CookieJar, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    match state.guard.check(&path, |name| jar.get(name).map(|c| c.value().to_owned())) {
        GuardDecision::Allow => next.run(request).await,
        GuardDecision::Redirect { location } => {
            tracing::debug!(%path, %location, "protected page without session");
            Redirect::temporary(&location).into_response()
        }
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
