//! Guest cart persistence.
//!
//! Guests keep their cart on the device; only signed-in users have a
//! backend cart. The file store writes JSON atomically (temp file + rename)
//! so a crash never leaves a half-written cart behind.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::ClientError;
use crate::types::Cart;

pub trait GuestCartStore: Send + Sync {
    /// Load the stored cart. A missing cart is an empty cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read or decoded.
    fn load(&self) -> Result<Cart, ClientError>;

    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn save(&self, cart: &Cart) -> Result<(), ClientError>;
}

/// JSON file on disk, the device-local equivalent of browser storage.
#[derive(Debug, Clone)]
pub struct FileGuestCart {
    path: PathBuf,
}

impl FileGuestCart {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GuestCartStore for FileGuestCart {
    fn load(&self) -> Result<Cart, ClientError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Cart::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, cart: &Cart) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(cart)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryGuestCart {
    cart: Mutex<Cart>,
}

impl MemoryGuestCart {
    #[must_use]
    pub fn new(cart: Cart) -> Self {
        Self { cart: Mutex::new(cart) }
    }
}

impl GuestCartStore for MemoryGuestCart {
    fn load(&self) -> Result<Cart, ClientError> {
        Ok(self.cart.lock().unwrap_or_else(std::sync::PoisonError::into_inner).clone())
    }

    fn save(&self, cart: &Cart) -> Result<(), ClientError> {
        *self.cart.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = cart.clone();
        Ok(())
    }
}
