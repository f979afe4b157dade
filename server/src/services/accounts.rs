//! Customer accounts plus the per-user cart and wishlist.
//!
//! Kept in memory. Passwords are stored as Argon2id PHC strings; verification
//! goes through the argon2 verifier, which compares in constant time.

use std::collections::HashMap;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::Rng;
use session::{Cart, User, Wishlist};
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AccountError {
    #[error("invalid email")]
    InvalidEmail,
    #[error("name must not be empty")]
    InvalidName,
    #[error("password must be at least {} characters", MIN_PASSWORD_LEN)]
    WeakPassword,
    #[error("email already registered")]
    EmailTaken,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("password hashing failed")]
    Hashing,
}

#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    if normalized.is_empty() || !normalized.contains('@') {
        return None;
    }
    let parts = normalized.split('@').collect::<Vec<_>>();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return None;
    }
    Some(normalized)
}

#[cfg(not(test))]
fn kdf_params() -> Params {
    Params::default()
}

// Minimum cost keeps the test suite fast; the hash format is unchanged.
#[cfg(test)]
fn kdf_params() -> Params {
    Params::new(Params::MIN_M_COST, Params::MIN_T_COST, Params::MIN_P_COST, None).unwrap_or_default()
}

fn hasher() -> Argon2<'static> {
    Argon2::new(Algorithm::Argon2id, Version::V0x13, kdf_params())
}

/// Hash `password` with a fresh random salt into a PHC string.
///
/// # Errors
///
/// [`AccountError::Hashing`] if argon2 rejects the input.
pub fn hash_password(password: &str) -> Result<String, AccountError> {
    let salt_bytes: [u8; 16] = rand::rng().random();
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|_| AccountError::Hashing)?;
    let hash = hasher().hash_password(password.as_bytes(), &salt).map_err(|_| AccountError::Hashing)?;
    Ok(hash.to_string())
}

/// Check `password` against a stored PHC string. Malformed hashes never match.
#[must_use]
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash).is_ok_and(|parsed| hasher().verify_password(password.as_bytes(), &parsed).is_ok())
}

#[derive(Debug, Clone)]
struct Account {
    user: User,
    password_hash: String,
}

#[derive(Debug, Default)]
pub struct AccountStore {
    accounts: HashMap<Uuid, Account>,
    by_email: HashMap<String, Uuid>,
    carts: HashMap<Uuid, Cart>,
    wishlists: HashMap<Uuid, Wishlist>,
}

impl AccountStore {
    /// Create a customer account.
    ///
    /// # Errors
    ///
    /// Rejects malformed emails, empty names, short passwords and emails
    /// that are already registered. [`AccountError::Hashing`] if the
    /// password cannot be hashed.
    pub fn register(&mut self, name: &str, email: &str, password: &str) -> Result<User, AccountError> {
        let email = normalize_email(email).ok_or(AccountError::InvalidEmail)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(AccountError::InvalidName);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AccountError::WeakPassword);
        }
        if self.by_email.contains_key(&email) {
            return Err(AccountError::EmailTaken);
        }

        let user = User { id: Uuid::new_v4(), name: name.to_owned(), email: email.clone(), role: "customer".to_owned() };
        let password_hash = hash_password(password)?;
        self.by_email.insert(email, user.id);
        self.accounts.insert(user.id, Account { user: user.clone(), password_hash });
        Ok(user)
    }

    /// Check credentials and return the account's user.
    ///
    /// # Errors
    ///
    /// [`AccountError::InvalidCredentials`] for unknown emails and wrong
    /// passwords alike.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<User, AccountError> {
        let account = normalize_email(email)
            .and_then(|email| self.by_email.get(&email))
            .and_then(|id| self.accounts.get(id))
            .ok_or(AccountError::InvalidCredentials)?;

        if verify_password(password, &account.password_hash) {
            Ok(account.user.clone())
        } else {
            Err(AccountError::InvalidCredentials)
        }
    }

    #[must_use]
    pub fn user(&self, id: Uuid) -> Option<User> {
        self.accounts.get(&id).map(|account| account.user.clone())
    }

    #[must_use]
    pub fn cart(&self, id: Uuid) -> Cart {
        self.carts.get(&id).cloned().unwrap_or_default()
    }

    pub fn set_cart(&mut self, id: Uuid, cart: Cart) {
        self.carts.insert(id, cart);
    }

    #[must_use]
    pub fn wishlist(&self, id: Uuid) -> Wishlist {
        self.wishlists.get(&id).cloned().unwrap_or_default()
    }

    pub fn set_wishlist(&mut self, id: Uuid, wishlist: Wishlist) {
        self.wishlists.insert(id, wishlist);
    }
}

#[cfg(test)]
#[path = "accounts_test.rs"]
mod tests;
