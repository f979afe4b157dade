//! Shared HTTP client for every feature module.
//!
//! The client keeps a cookie store so session cookies set by the backend
//! ride along on every later call, including cross-origin ones. All verbs
//! funnel through [`ApiClient::send`], which owns the retry-on-401 cycle.

use std::sync::Arc;

use reqwest::{Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::REFRESH_PATH;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::interceptor::{self, Navigator, NoopNavigator, PendingRequest, Step};

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Maximum number of error body characters kept in [`ClientError::Status`].
const MAX_ERROR_CHARS: usize = 200;

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
    navigator: Arc<dyn Navigator>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").field("base_url", &self.config.base_url).finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Build a client with a fresh cookie store and no navigation.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .cookie_store(true)
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { http, config: Arc::new(config), navigator: Arc::new(NoopNavigator) })
    }

    #[must_use]
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    /// # Errors
    ///
    /// Propagates transport, status and decode failures.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.send(PendingRequest::get(path)).await?;
        decode_json(path, response).await
    }

    /// Like [`get`](Self::get), but a 204 yields `None`.
    ///
    /// # Errors
    ///
    /// Propagates transport, status and decode failures.
    pub async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ClientError> {
        self.send_optional(PendingRequest::get(path)).await
    }

    /// Send `request` and decode a JSON body, treating 204 as `None`.
    pub(crate) async fn send_optional<T: DeserializeOwned>(
        &self,
        request: PendingRequest,
    ) -> Result<Option<T>, ClientError> {
        let path = request.path().to_owned();
        let response = self.send(request).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        decode_json(&path, response).await.map(Some)
    }

    /// # Errors
    ///
    /// Propagates serialization, transport, status and decode failures.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(PendingRequest::post(path).with_json(body)?).await?;
        decode_json(path, response).await
    }

    /// # Errors
    ///
    /// Propagates serialization, transport, status and decode failures.
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(PendingRequest::put(path).with_json(body)?).await?;
        decode_json(path, response).await
    }

    /// # Errors
    ///
    /// Propagates transport and status failures.
    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        self.send(PendingRequest::delete(path)).await.map(drop)
    }

    /// Issue `request`, refreshing the session and re-sending once on a 401.
    ///
    /// # Errors
    ///
    /// - [`ClientError::SessionExpired`] when the refresh call fails.
    /// - [`ClientError::Status`] for any other failure status, including a
    ///   401 on the retried attempt.
    /// - [`ClientError::Transport`] for network failures.
    #[instrument(skip(self, request), fields(method = %request.method(), path = %request.path()))]
    pub async fn send(&self, mut request: PendingRequest) -> Result<Response, ClientError> {
        loop {
            let response = self.execute(&request).await?;
            let status = response.status();

            match interceptor::next_step(request.attempt(), status) {
                Step::Resolve => return Ok(response),
                Step::Propagate => return Err(status_error(&request, response).await),
                Step::RefreshAndRetry => {
                    request.mark_retried();
                    debug!("access token rejected; refreshing session");

                    if let Err(e) = self.refresh_session().await {
                        warn!(error = %e, "session refresh failed");
                        if request.redirects_on_expiry() {
                            interceptor::redirect_to_login(self.navigator.as_ref());
                        }
                        return Err(ClientError::SessionExpired { status: e.status() });
                    }
                }
            }
        }
    }

    /// `POST /auth/refresh-token` with the current cookies. Not intercepted.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Status`] when the backend rejects the refresh
    /// and [`ClientError::Transport`] on network failure.
    pub async fn refresh_session(&self) -> Result<(), ClientError> {
        let request = PendingRequest::post(REFRESH_PATH);
        let response = self.execute(&request).await?;
        if response.status().is_success() {
            debug!("session refreshed");
            Ok(())
        } else {
            Err(status_error(&request, response).await)
        }
    }

    async fn execute(&self, request: &PendingRequest) -> Result<Response, ClientError> {
        let url = self.config.url_for(request.path());
        let mut builder = self.http.request(request.method().clone(), &url);
        if !request.query().is_empty() {
            builder = builder.query(request.query());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }
        Ok(builder.send().await?)
    }
}

async fn decode_json<T: DeserializeOwned>(path: &str, response: Response) -> Result<T, ClientError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode { path: path.to_owned(), message: e.to_string() })
}

async fn status_error(request: &PendingRequest, response: Response) -> ClientError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    ClientError::Status {
        method: request.method().clone(),
        path: request.path().to_owned(),
        status,
        message: sanitize_body(&body),
    }
}

/// Trim and truncate an error body for display.
fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_owned()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
