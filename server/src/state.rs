//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers and middleware via the `State`
//! extractor. Accounts and session grants live in memory behind async
//! locks; the route guard is immutable and shared.

use std::sync::Arc;

use session::RouteGuard;
use tokio::sync::RwLock;

use crate::config::ServerConfig;
use crate::services::accounts::{AccountError, AccountStore};
use crate::services::tokens::TokenStore;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<RwLock<AccountStore>>,
    pub tokens: Arc<RwLock<TokenStore>>,
    pub guard: Arc<RouteGuard>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self {
            accounts: Arc::new(RwLock::new(AccountStore::default())),
            tokens: Arc::new(RwLock::new(TokenStore::new(config.access_ttl, config.refresh_ttl))),
            guard: Arc::new(RouteGuard::default()),
            config: Arc::new(config),
        }
    }

    /// Register the configured seed account, if any.
    ///
    /// # Errors
    ///
    /// Returns the registration error for an invalid seed account.
    pub async fn seed(&self) -> Result<(), AccountError> {
        let Some(seed) = &self.config.seed_account else {
            return Ok(());
        };
        let user = self.accounts.write().await.register(&seed.name, &seed.email, &seed.password)?;
        tracing::info!(email = %user.email, "seed account registered");
        Ok(())
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
