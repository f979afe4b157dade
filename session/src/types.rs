//! Payloads shared by the backend API and hydration.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authenticated account as returned by `GET /auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "customer".to_owned()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price_cents: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Total units across all lines. Saturates rather than wrapping on
    /// hostile input.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().fold(0_u32, |total, item| total.saturating_add(item.quantity))
    }

    /// Sum of `unit_price_cents * quantity`, saturating at `u64::MAX`.
    #[must_use]
    pub fn subtotal_cents(&self) -> u64 {
        self.items.iter().fold(0_u64, |total, item| {
            total.saturating_add(item.unit_price_cents.saturating_mul(u64::from(item.quantity)))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistItem {
    pub product_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wishlist {
    #[serde(default)]
    pub items: Vec<WishlistItem>,
}
