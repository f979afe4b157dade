//! Route guard: cookie-presence gate in front of protected pages.
//!
//! The guard only checks that a refresh cookie exists. A stale or forged
//! cookie passes and is rejected later by the backend; the interceptor then
//! handles the 401. Cookie access is injected as a reader closure so the
//! decision stays a pure function of `(path, cookies)`.

use crate::{LOGIN_PATH, REDIRECT_PARAM, REFRESH_COOKIE, is_unauthenticated_entry};

/// Path prefixes that require a session.
pub const PROTECTED_PREFIXES: &[&str] = &["/dashboard", "/profile", "/orders", "/wishlist", "/checkout"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect { location: String },
}

impl GuardDecision {
    #[must_use]
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuard {
    protected_prefixes: Vec<String>,
    login_path: String,
    cookie_name: String,
    redirect_param: String,
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self {
            protected_prefixes: PROTECTED_PREFIXES.iter().map(|p| (*p).to_owned()).collect(),
            login_path: LOGIN_PATH.to_owned(),
            cookie_name: REFRESH_COOKIE.to_owned(),
            redirect_param: REDIRECT_PARAM.to_owned(),
        }
    }
}

impl RouteGuard {
    /// Guard a custom prefix set, keeping the default login path and cookie.
    #[must_use]
    pub fn with_prefixes<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { protected_prefixes: prefixes.into_iter().map(Into::into).collect(), ..Self::default() }
    }

    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    #[must_use]
    pub fn is_protected(&self, path: &str) -> bool {
        self.protected_prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Decide whether `path` may render, given a cookie reader.
    pub fn check<F>(&self, path: &str, read_cookie: F) -> GuardDecision
    where
        F: Fn(&str) -> Option<String>,
    {
        if !self.is_protected(path) {
            return GuardDecision::Allow;
        }

        let has_session = read_cookie(&self.cookie_name).is_some_and(|value| !value.is_empty());
        if has_session {
            GuardDecision::Allow
        } else {
            GuardDecision::Redirect { location: build_redirect(&self.login_path, &self.redirect_param, path) }
        }
    }
}

/// Login location that brings the user back to `path` after sign-in.
#[must_use]
pub fn login_redirect_location(path: &str) -> String {
    build_redirect(LOGIN_PATH, REDIRECT_PARAM, path)
}

/// The `redirect` value from a login page query string, if it names a local
/// page. Protocol-relative (`//host`), backslash and absolute URLs are
/// refused so the login page cannot be used as an open redirect, and entry
/// pages are refused so sign-in cannot loop back onto itself.
#[must_use]
pub fn redirect_target(query: &str) -> Option<String> {
    let query = query.strip_prefix('?').unwrap_or(query);
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == REDIRECT_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|target| is_local_path(target) && !is_unauthenticated_entry(target))
}

/// Where to land after signing in on `location` (a login page path plus
/// query). Falls back to `/`.
#[must_use]
pub fn post_login_location(location: &str) -> String {
    let query = location.split_once('?').map_or("", |(_, query)| query);
    redirect_target(query).unwrap_or_else(|| "/".to_owned())
}

fn is_local_path(target: &str) -> bool {
    target.starts_with('/')
        && !target.starts_with("//")
        && !target.contains('\\')
        && !target.chars().any(char::is_control)
}

fn build_redirect(login_path: &str, param: &str, path: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(path.as_bytes()).collect();
    format!("{login_path}?{param}={encoded}")
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
