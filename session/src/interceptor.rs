//! Retry-on-401 state machine.
//!
//! DESIGN
//! ======
//! Each [`PendingRequest`] carries its own [`Attempt`] marker, so the
//! "already retried" decision never leaks between concurrent calls. A 401 on
//! an `Initial` attempt triggers one refresh followed by one re-send; a 401
//! on a `RetriedOnce` attempt, or any other failure status, goes back to the
//! caller untouched.
//!
//! Concurrent 401s each run their own refresh. The refresh endpoint is
//! idempotent, so the duplicate calls are wasted work, not a hazard.

use std::sync::Mutex;

use reqwest::{Method, StatusCode};
use serde::Serialize;

use crate::error::ClientError;
use crate::guard::login_redirect_location;
use crate::is_unauthenticated_entry;

/// Where a single request sits in the refresh-and-retry cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Initial,
    RetriedOnce,
}

/// What the client should do with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Resolve,
    RefreshAndRetry,
    Propagate,
}

pub(crate) fn next_step(attempt: Attempt, status: StatusCode) -> Step {
    if status.is_success() || status.is_redirection() || status.is_informational() {
        return Step::Resolve;
    }
    match (status, attempt) {
        (StatusCode::UNAUTHORIZED, Attempt::Initial) => Step::RefreshAndRetry,
        _ => Step::Propagate,
    }
}

/// An outbound call that can be re-issued with the same parameters.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    attempt: Attempt,
    redirect_on_expiry: bool,
}

impl PendingRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            attempt: Attempt::Initial,
            redirect_on_expiry: true,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attach a JSON body. The body is kept as a value so a retry re-sends it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Serialization`] if `body` cannot be encoded.
    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ClientError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Skip the forced login redirect when the session turns out to be gone.
    /// Used for checks such as "who is the current user", where a guest is
    /// an expected answer.
    #[must_use]
    pub fn quiet(mut self) -> Self {
        self.redirect_on_expiry = false;
        self
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    #[must_use]
    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    #[must_use]
    pub fn attempt(&self) -> Attempt {
        self.attempt
    }

    #[must_use]
    pub fn redirects_on_expiry(&self) -> bool {
        self.redirect_on_expiry
    }

    pub(crate) fn mark_retried(&mut self) {
        self.attempt = Attempt::RetriedOnce;
    }
}

// =============================================================================
// NAVIGATION
// =============================================================================

/// Full-page navigation capability used when the session cannot be renewed.
pub trait Navigator: Send + Sync {
    /// Path of the page currently shown.
    fn current_path(&self) -> String;
    /// Replace the current page with `location`.
    fn redirect(&self, location: &str);
}

/// Ignores navigation. Suits headless callers that only need the error.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn current_path(&self) -> String {
        "/".to_owned()
    }

    fn redirect(&self, _location: &str) {}
}

/// Tracks the current path in memory and records every redirect.
#[derive(Debug)]
pub struct MemoryNavigator {
    current: Mutex<String>,
    redirects: Mutex<Vec<String>>,
}

impl MemoryNavigator {
    #[must_use]
    pub fn new(current_path: impl Into<String>) -> Self {
        Self { current: Mutex::new(current_path.into()), redirects: Mutex::new(Vec::new()) }
    }

    pub fn set_current_path(&self, path: impl Into<String>) {
        *lock(&self.current) = path.into();
    }

    /// Redirects issued so far, oldest first.
    #[must_use]
    pub fn redirects(&self) -> Vec<String> {
        lock(&self.redirects).clone()
    }
}

impl Navigator for MemoryNavigator {
    fn current_path(&self) -> String {
        lock(&self.current).clone()
    }

    fn redirect(&self, location: &str) {
        tracing::info!(%location, "navigating");
        lock(&self.redirects).push(location.to_owned());
        // A full navigation lands on the new page.
        let path = location.split('?').next().unwrap_or(location).to_owned();
        *lock(&self.current) = path;
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Send the user to login after a failed refresh, unless they are already
/// on an unauthenticated entry page. Returns the location when a redirect
/// was issued.
pub(crate) fn redirect_to_login(navigator: &dyn Navigator) -> Option<String> {
    let current = navigator.current_path();
    if is_unauthenticated_entry(&current) {
        tracing::debug!(%current, "already on an entry page; skipping login redirect");
        return None;
    }
    let location = login_redirect_location(&current);
    navigator.redirect(&location);
    Some(location)
}

#[cfg(test)]
#[path = "interceptor_test.rs"]
mod tests;
