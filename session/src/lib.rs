//! Client-side session plumbing for the storefront and admin apps.
//!
//! ARCHITECTURE
//! ============
//! Every feature module talks to the backend through one [`ApiClient`].
//! The client forwards cookies, and a 401 on any call is retried once after
//! a `POST /auth/refresh-token`. A [`PeriodicRefresher`] keeps idle sessions
//! alive, the [`RouteGuard`] gates protected pages on refresh-cookie
//! presence, and [`Hydrator`] reconciles user, cart and wishlist state with
//! the server on startup.
//!
//! The guard is a coarse UX gate only. Token validity is decided by the
//! backend, and expiry surfaces through the interceptor.

pub mod client;
pub mod config;
pub mod error;
pub mod guard;
pub mod hydration;
pub mod interceptor;
pub mod refresher;
pub mod storage;
pub mod types;

#[cfg(test)]
mod test_support;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::ClientError;
pub use guard::{GuardDecision, RouteGuard, post_login_location, redirect_target};
pub use hydration::{AuthStatus, ClientState, Hydrator};
pub use interceptor::{Attempt, MemoryNavigator, Navigator, NoopNavigator, PendingRequest};
pub use refresher::{PeriodicRefresher, Refresh, RefresherHandle};
pub use storage::{FileGuestCart, GuestCartStore, MemoryGuestCart};
pub use types::{Cart, CartItem, User, Wishlist, WishlistItem};

/// Path of the session refresh endpoint, relative to the API base URL.
pub const REFRESH_PATH: &str = "/auth/refresh-token";
/// Login entry point used for forced and guard redirects.
pub const LOGIN_PATH: &str = "/auth/login";
/// Cookie whose presence marks a (possibly stale) session.
pub const REFRESH_COOKIE: &str = "refreshToken";
/// Cookie carrying the short-lived access credential.
pub const ACCESS_COOKIE: &str = "accessToken";
/// Query parameter carrying the originally requested path.
pub const REDIRECT_PARAM: &str = "redirect";

/// Pages a logged-out user must be able to reach without being bounced.
pub const UNAUTHENTICATED_ENTRY_PATHS: &[&str] = &[
    "/auth/login",
    "/auth/register",
    "/auth/forgot-password",
    "/auth/reset-password",
    "/auth/verify",
];

/// Returns true when `path` is one of the unauthenticated entry pages.
#[must_use]
pub fn is_unauthenticated_entry(path: &str) -> bool {
    UNAUTHENTICATED_ENTRY_PATHS.iter().any(|entry| path.starts_with(entry))
}
