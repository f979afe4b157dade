//! In-process backend used by client and hydration tests.
//!
//! Mimics the session contract of the real server: login sets both cookies,
//! refresh re-issues the access cookie, and protected routes reject any
//! access cookie other than the latest one.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde_json::{Value, json};
use tokio::task::JoinHandle;

use crate::{ACCESS_COOKIE, ApiClient, ClientConfig, REFRESH_COOKIE};

#[derive(Default)]
pub(crate) struct Backend {
    access_token: Mutex<String>,
    issued: AtomicUsize,
    pub(crate) refresh_enabled: AtomicBool,
    pub(crate) refresh_calls: AtomicUsize,
    pub(crate) product_calls: AtomicUsize,
    pub(crate) me_calls: AtomicUsize,
    pub(crate) cart_calls: AtomicUsize,
    pub(crate) wishlist_calls: AtomicUsize,
    pub(crate) cart_writes: Mutex<Vec<Value>>,
    pub(crate) cart_clears: AtomicUsize,
    pub(crate) echo_bodies: Mutex<Vec<Value>>,
}

impl Backend {
    fn issue_access(&self) -> String {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let token = format!("access-{n}");
        *self.access_token.lock().expect("access mutex") = token.clone();
        token
    }

    /// Invalidate the current access cookie, as if it had expired.
    pub(crate) fn expire_access(&self) {
        *self.access_token.lock().expect("access mutex") = "expired".to_owned();
    }

    pub(crate) fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn authorized(&self, jar: &CookieJar) -> bool {
        let current = self.access_token.lock().expect("access mutex").clone();
        jar.get(ACCESS_COOKIE).is_some_and(|c| c.value() == current)
    }
}

pub(crate) struct TestServer {
    pub(crate) base_url: String,
    pub(crate) backend: Arc<Backend>,
    handle: JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl TestServer {
    pub(crate) async fn start() -> Self {
        let backend = Arc::new(Backend { refresh_enabled: AtomicBool::new(true), ..Backend::default() });
        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/refresh-token", post(refresh))
            .route("/api/auth/me", get(me))
            .route("/api/admin/products", get(products))
            .route("/api/cart", get(cart).put(replace_cart).delete(clear_cart))
            .route("/api/notifications", get(no_notifications))
            .route("/api/wishlist", get(wishlist))
            .route("/api/echo", post(echo))
            .route("/api/always-401", get(always_unauthorized))
            .route("/api/missing", get(missing))
            .with_state(backend.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind test server");
        let addr = listener.local_addr().expect("local addr");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("test server");
        });

        Self { base_url: format!("http://{addr}/api"), backend, handle }
    }

    pub(crate) fn client(&self) -> ApiClient {
        ApiClient::new(ClientConfig::new(&self.base_url).expect("test base url")).expect("client")
    }
}

type Shared = State<Arc<Backend>>;

fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value)).path("/").http_only(true).build()
}

fn user_json() -> Value {
    json!({
        "id": "00000000-0000-0000-0000-000000000042",
        "name": "Ada",
        "email": "ada@example.com",
        "role": "customer"
    })
}

async fn login(State(backend): Shared, jar: CookieJar) -> Response {
    let access = backend.issue_access();
    let jar = jar
        .add(session_cookie(REFRESH_COOKIE, "refresh-1".to_owned()))
        .add(session_cookie(ACCESS_COOKIE, access));
    (jar, Json(user_json())).into_response()
}

async fn refresh(State(backend): Shared, jar: CookieJar) -> Response {
    backend.refresh_calls.fetch_add(1, Ordering::SeqCst);
    let has_refresh = jar.get(REFRESH_COOKIE).is_some();
    if !has_refresh || !backend.refresh_enabled.load(Ordering::SeqCst) {
        return (StatusCode::UNAUTHORIZED, "refresh rejected").into_response();
    }
    let access = backend.issue_access();
    (jar.add(session_cookie(ACCESS_COOKIE, access)), StatusCode::OK).into_response()
}

async fn me(State(backend): Shared, jar: CookieJar) -> Response {
    backend.me_calls.fetch_add(1, Ordering::SeqCst);
    if !backend.authorized(&jar) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(user_json()).into_response()
}

#[derive(serde::Deserialize)]
struct PageQuery {
    page: Option<u32>,
}

async fn products(State(backend): Shared, jar: CookieJar, Query(query): Query<PageQuery>) -> Response {
    backend.product_calls.fetch_add(1, Ordering::SeqCst);
    if !backend.authorized(&jar) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({
        "page": query.page.unwrap_or(1),
        "products": [{ "id": "sku-1", "name": "Mug" }, { "id": "sku-2", "name": "Tee" }]
    }))
    .into_response()
}

async fn cart(State(backend): Shared, jar: CookieJar) -> Response {
    backend.cart_calls.fetch_add(1, Ordering::SeqCst);
    if !backend.authorized(&jar) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({
        "items": [{ "product_id": "sku-1", "name": "Mug", "quantity": 2, "unit_price_cents": 1250 }]
    }))
    .into_response()
}

async fn replace_cart(State(backend): Shared, jar: CookieJar, Json(body): Json<Value>) -> Response {
    backend.cart_calls.fetch_add(1, Ordering::SeqCst);
    if !backend.authorized(&jar) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    backend.cart_writes.lock().expect("cart mutex").push(body.clone());
    Json(body).into_response()
}

async fn clear_cart(State(backend): Shared, jar: CookieJar) -> StatusCode {
    backend.cart_calls.fetch_add(1, Ordering::SeqCst);
    if !backend.authorized(&jar) {
        return StatusCode::UNAUTHORIZED;
    }
    backend.cart_clears.fetch_add(1, Ordering::SeqCst);
    StatusCode::NO_CONTENT
}

/// Authorized callers get `204`: nothing pending.
async fn no_notifications(State(backend): Shared, jar: CookieJar) -> StatusCode {
    if backend.authorized(&jar) { StatusCode::NO_CONTENT } else { StatusCode::UNAUTHORIZED }
}

async fn wishlist(State(backend): Shared, jar: CookieJar) -> Response {
    backend.wishlist_calls.fetch_add(1, Ordering::SeqCst);
    if !backend.authorized(&jar) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({ "items": [{ "product_id": "sku-7", "name": "Lamp" }] })).into_response()
}

async fn echo(State(backend): Shared, jar: CookieJar, Json(body): Json<Value>) -> Response {
    backend.echo_bodies.lock().expect("echo mutex").push(body.clone());
    if !backend.authorized(&jar) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(body).into_response()
}

async fn always_unauthorized() -> StatusCode {
    StatusCode::UNAUTHORIZED
}

async fn missing() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "  no such thing  ")
}
