//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One Axum router serves the JSON API under `/api` and the storefront page
//! shell for everything else. The page guard wraps the whole router; API
//! paths are never protected prefixes, so it only ever acts on pages.

pub mod account;
pub mod auth;
pub mod guard;
pub mod pages;

use axum::Router;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/refresh-token", post(auth::refresh_token))
        .route("/auth/me", get(auth::me))
        .route("/cart", get(account::get_cart).put(account::put_cart))
        .route("/wishlist", get(account::get_wishlist).put(account::put_wishlist))
}

/// Credentialed CORS for a separately hosted storefront. `None` when the
/// storefront is served same-origin.
fn cors_layer(origin: Option<&str>) -> Option<CorsLayer> {
    let origin = origin?;
    let Ok(value) = HeaderValue::from_str(origin) else {
        tracing::warn!(%origin, "ignoring unparsable CORS_ORIGIN");
        return None;
    };
    Some(
        CorsLayer::new()
            .allow_origin(value)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE]),
    )
}

pub fn app(state: AppState) -> Router {
    let cors = cors_layer(state.config.cors_origin.as_deref());

    let router = Router::new()
        .nest("/api", api_routes())
        .route("/healthz", get(healthz))
        .fallback(pages::render)
        .layer(middleware::from_fn_with_state(state.clone(), guard::require_session))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    match cors {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
