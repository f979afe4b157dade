//! Session token issuance, validation and refresh.
//!
//! ARCHITECTURE
//! ============
//! A login creates a token pair: a short-lived access token and a long-lived
//! refresh token. Only SHA-256 digests are stored, never the raw tokens.
//! Every access token belongs to the refresh token ("family") it was minted
//! under, so revoking the refresh token ends the whole session.
//!
//! TRADE-OFFS
//! ==========
//! Refresh keeps the refresh token value and slides its expiry instead of
//! rotating it. Two refreshes racing each other (timer and interceptor) then
//! both succeed and leave one consistent session, at the cost of weaker
//! replay protection than one-time rotation.

use std::collections::HashMap;
use std::fmt::Write;
use std::time::Duration;

use rand::Rng;
use sha2::{Digest, Sha256};
use time::{OffsetDateTime, PrimitiveDateTime};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::state::AppState;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("unknown token")]
    Unknown,
    #[error("token expired")]
    Expired,
}

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a cryptographically random 32-byte hex token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Storage key for a raw token.
#[must_use]
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    bytes_to_hex(&hasher.finalize())
}

/// Raw tokens handed to the client as cookies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Clone)]
struct Grant {
    user_id: Uuid,
    /// Digest of the refresh token this grant belongs to.
    family: String,
    expires_at: OffsetDateTime,
}

#[derive(Debug)]
pub struct TokenStore {
    access: HashMap<String, Grant>,
    refresh: HashMap<String, Grant>,
    access_ttl: time::Duration,
    refresh_ttl: time::Duration,
}

impl TokenStore {
    #[must_use]
    pub fn new(access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            access: HashMap::new(),
            refresh: HashMap::new(),
            access_ttl: to_time(access_ttl),
            refresh_ttl: to_time(refresh_ttl),
        }
    }

    #[must_use]
    pub fn access_ttl(&self) -> time::Duration {
        self.access_ttl
    }

    #[must_use]
    pub fn refresh_ttl(&self) -> time::Duration {
        self.refresh_ttl
    }

    /// Start a new session for `user_id`.
    pub fn issue(&mut self, user_id: Uuid, now: OffsetDateTime) -> TokenPair {
        let refresh = generate_token();
        let family = hash_token(&refresh);
        self.refresh
            .insert(family.clone(), Grant { user_id, family: family.clone(), expires_at: expiry(now, self.refresh_ttl) });
        let access = self.mint_access(user_id, family, now);
        TokenPair { access, refresh }
    }

    /// Resolve an access token to its user.
    ///
    /// # Errors
    ///
    /// [`TokenError::Unknown`] for tokens never issued or already revoked,
    /// [`TokenError::Expired`] past their TTL.
    pub fn validate_access(&self, token: &str, now: OffsetDateTime) -> Result<Uuid, TokenError> {
        let grant = self.access.get(&hash_token(token)).ok_or(TokenError::Unknown)?;
        if grant.expires_at <= now {
            return Err(TokenError::Expired);
        }
        Ok(grant.user_id)
    }

    /// Mint a new access token under an existing refresh token and push the
    /// refresh expiry forward. The refresh token value is unchanged.
    ///
    /// # Errors
    ///
    /// [`TokenError::Unknown`] or [`TokenError::Expired`] for a refresh
    /// token that cannot be used.
    pub fn refresh(&mut self, refresh_token: &str, now: OffsetDateTime) -> Result<(Uuid, TokenPair), TokenError> {
        let family = hash_token(refresh_token);
        let refresh_ttl = self.refresh_ttl;
        let grant = self.refresh.get_mut(&family).ok_or(TokenError::Unknown)?;
        if grant.expires_at <= now {
            self.revoke_family(&family);
            return Err(TokenError::Expired);
        }
        grant.expires_at = expiry(now, refresh_ttl);
        let user_id = grant.user_id;

        let access = self.mint_access(user_id, family, now);
        Ok((user_id, TokenPair { access, refresh: refresh_token.to_owned() }))
    }

    /// End the session a refresh token belongs to. Unknown tokens are ignored.
    pub fn revoke(&mut self, refresh_token: &str) {
        self.revoke_family(&hash_token(refresh_token));
    }

    /// Drop every expired grant. Returns how many were removed.
    pub fn prune(&mut self, now: OffsetDateTime) -> usize {
        let before = self.access.len() + self.refresh.len();
        self.refresh.retain(|_, grant| grant.expires_at > now);
        let live = &self.refresh;
        self.access.retain(|_, grant| grant.expires_at > now && live.contains_key(&grant.family));
        before - (self.access.len() + self.refresh.len())
    }

    #[must_use]
    pub fn active_sessions(&self) -> usize {
        self.refresh.len()
    }

    fn mint_access(&mut self, user_id: Uuid, family: String, now: OffsetDateTime) -> String {
        let access = generate_token();
        self.access.insert(hash_token(&access), Grant { user_id, family, expires_at: expiry(now, self.access_ttl) });
        access
    }

    fn revoke_family(&mut self, family: &str) {
        self.refresh.remove(family);
        self.access.retain(|_, grant| grant.family != family);
    }
}

/// `now + ttl`, pinned to the latest representable instant on overflow.
fn expiry(now: OffsetDateTime, ttl: time::Duration) -> OffsetDateTime {
    now.checked_add(ttl).unwrap_or_else(|| PrimitiveDateTime::MAX.assume_utc())
}

fn to_time(duration: Duration) -> time::Duration {
    time::Duration::try_from(duration).unwrap_or(time::Duration::MAX)
}

/// Spawn the background task that drops expired grants. Returns a handle for shutdown.
pub fn spawn_prune_task(state: AppState, interval: Duration) -> JoinHandle<()> {
    info!(interval_secs = interval.as_secs(), "session prune task configured");
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            let removed = state.tokens.write().await.prune(OffsetDateTime::now_utc());
            if removed > 0 {
                debug!(removed, "pruned expired session grants");
            }
        }
    })
}

#[cfg(test)]
#[path = "tokens_test.rs"]
mod tests;
