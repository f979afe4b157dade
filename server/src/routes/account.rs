//! Per-user cart and wishlist endpoints read during hydration.

use axum::extract::{Json, State};
use session::{Cart, Wishlist};

use super::auth::AuthUser;
use crate::state::AppState;

/// `GET /api/cart`
pub async fn get_cart(State(state): State<AppState>, auth: AuthUser) -> Json<Cart> {
    Json(state.accounts.read().await.cart(auth.user.id))
}

/// `PUT /api/cart`: replace the cart. Zero-quantity lines are dropped.
pub async fn put_cart(State(state): State<AppState>, auth: AuthUser, Json(mut cart): Json<Cart>) -> Json<Cart> {
    cart.items.retain(|item| item.quantity > 0);
    state.accounts.write().await.set_cart(auth.user.id, cart.clone());
    Json(cart)
}

/// `GET /api/wishlist`
pub async fn get_wishlist(State(state): State<AppState>, auth: AuthUser) -> Json<Wishlist> {
    Json(state.accounts.read().await.wishlist(auth.user.id))
}

/// `PUT /api/wishlist`
pub async fn put_wishlist(State(state): State<AppState>, auth: AuthUser, Json(wishlist): Json<Wishlist>) -> Json<Wishlist> {
    state.accounts.write().await.set_wishlist(auth.user.id, wishlist.clone());
    Json(wishlist)
}
