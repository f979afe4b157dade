//! Startup reconciliation of client state with the backend.
//!
//! ORDERING
//! ========
//! User resolution runs first. Cart and wishlist hydration each block on the
//! auth status leaving `Loading`, because their source depends on it: a
//! guest cart comes from the device store and a guest has no wishlist, while
//! an authenticated user gets both from the backend.
//!
//! ERROR HANDLING
//! ==============
//! User resolution always completes (falling back to `Guest`) so dependents
//! never hang. Cart and wishlist failures are logged and leave that slice of
//! state untouched.

use std::sync::Arc;

use tokio::sync::{RwLock, watch};
use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::error::ClientError;
use crate::interceptor::PendingRequest;
use crate::storage::GuestCartStore;
use crate::types::{Cart, User, Wishlist};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStatus {
    Loading,
    Guest,
    Authenticated(User),
}

impl AuthStatus {
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// Client-side state shared by every view.
#[derive(Debug)]
pub struct ClientState {
    auth: watch::Sender<AuthStatus>,
    cart: RwLock<Cart>,
    wishlist: RwLock<Wishlist>,
}

impl Default for ClientState {
    fn default() -> Self {
        Self {
            auth: watch::Sender::new(AuthStatus::Loading),
            cart: RwLock::new(Cart::default()),
            wishlist: RwLock::new(Wishlist::default()),
        }
    }
}

impl ClientState {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    #[must_use]
    pub fn auth_status(&self) -> AuthStatus {
        self.auth.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.auth.subscribe()
    }

    pub fn set_auth(&self, status: AuthStatus) {
        self.auth.send_replace(status);
    }

    /// Wait until user resolution has finished.
    pub async fn resolved_auth(&self) -> AuthStatus {
        let mut rx = self.auth.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        match rx.wait_for(|status| !status.is_loading()).await {
            Ok(status) => status.clone(),
            Err(_) => AuthStatus::Guest,
        }
    }

    pub async fn cart(&self) -> Cart {
        self.cart.read().await.clone()
    }

    pub async fn set_cart(&self, cart: Cart) {
        *self.cart.write().await = cart;
    }

    pub async fn wishlist(&self) -> Wishlist {
        self.wishlist.read().await.clone()
    }

    pub async fn set_wishlist(&self, wishlist: Wishlist) {
        *self.wishlist.write().await = wishlist;
    }
}

#[derive(Clone)]
pub struct Hydrator {
    client: ApiClient,
    state: Arc<ClientState>,
    guest_cart: Arc<dyn GuestCartStore>,
}

impl Hydrator {
    #[must_use]
    pub fn new(client: ApiClient, state: Arc<ClientState>, guest_cart: Arc<dyn GuestCartStore>) -> Self {
        Self { client, state, guest_cart }
    }

    #[must_use]
    pub fn state(&self) -> &Arc<ClientState> {
        &self.state
    }

    /// Run all three hydrations concurrently and return the resolved auth
    /// status. User resolution is polled first so dependents observe
    /// `Loading` until it completes.
    pub async fn run(&self) -> AuthStatus {
        let (status, cart, wishlist) = tokio::join!(self.hydrate_user(), self.hydrate_cart(), self.hydrate_wishlist());
        if let Err(e) = cart {
            warn!(error = %e, "cart hydration failed");
        }
        if let Err(e) = wishlist {
            warn!(error = %e, "wishlist hydration failed");
        }
        status
    }

    /// Resolve the current user with a quiet `GET /auth/me`.
    pub async fn hydrate_user(&self) -> AuthStatus {
        self.state.set_auth(AuthStatus::Loading);

        let status = match self.fetch_user().await {
            Ok(Some(user)) => AuthStatus::Authenticated(user),
            Ok(None) => AuthStatus::Guest,
            Err(e) if e.is_unauthorized() => AuthStatus::Guest,
            Err(e) => {
                warn!(error = %e, "user resolution failed; continuing as guest");
                AuthStatus::Guest
            }
        };
        debug!(authenticated = status.user().is_some(), "user resolved");
        self.state.set_auth(status.clone());
        status
    }

    /// # Errors
    ///
    /// Propagates backend or guest store failures; state is left untouched.
    pub async fn hydrate_cart(&self) -> Result<(), ClientError> {
        let cart = match self.state.resolved_auth().await {
            AuthStatus::Authenticated(_) => self.client.get::<Cart>("/cart").await?,
            _ => self.guest_cart.load()?,
        };
        debug!(items = cart.items.len(), "cart hydrated");
        self.state.set_cart(cart).await;
        Ok(())
    }

    /// # Errors
    ///
    /// Propagates backend failures; state is left untouched.
    pub async fn hydrate_wishlist(&self) -> Result<(), ClientError> {
        let wishlist = match self.state.resolved_auth().await {
            AuthStatus::Authenticated(_) => self.client.get::<Wishlist>("/wishlist").await?,
            _ => Wishlist::default(),
        };
        debug!(items = wishlist.items.len(), "wishlist hydrated");
        self.state.set_wishlist(wishlist).await;
        Ok(())
    }

    async fn fetch_user(&self) -> Result<Option<User>, ClientError> {
        self.client.send_optional(PendingRequest::get("/auth/me").quiet()).await
    }
}

#[cfg(test)]
#[path = "hydration_test.rs"]
mod tests;
