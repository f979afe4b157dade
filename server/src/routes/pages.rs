//! Page shell.
//!
//! The storefront renders client-side; the server only answers known page
//! routes with a document shell and everything else with a 404.

use axum::http::{StatusCode, Uri};
use axum::response::{Html, IntoResponse, Response};

const EXACT_PAGES: &[(&str, &str)] = &[
    ("/", "Home"),
    ("/search", "Search"),
    ("/cart", "Cart"),
    ("/auth/login", "Sign in"),
    ("/auth/register", "Create account"),
    ("/auth/forgot-password", "Forgot password"),
    ("/auth/reset-password", "Reset password"),
    ("/auth/verify", "Verify email"),
];

/// Sections that also own their sub-paths (`/orders/42`).
const SECTION_PAGES: &[(&str, &str)] = &[
    ("/dashboard", "Dashboard"),
    ("/profile", "Profile"),
    ("/orders", "Orders"),
    ("/wishlist", "Wishlist"),
    ("/checkout", "Checkout"),
];

pub(crate) fn page_title(path: &str) -> Option<&'static str> {
    if let Some((_, title)) = EXACT_PAGES.iter().find(|(p, _)| *p == path) {
        return Some(*title);
    }
    SECTION_PAGES
        .iter()
        .find(|(prefix, _)| path == *prefix || path.strip_prefix(*prefix).is_some_and(|rest| rest.starts_with('/')))
        .map(|(_, title)| *title)
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn shell(title: &str, path: &str) -> String {
    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>{title} | Shop</title></head>\n\
         <body><div id=\"app\" data-route=\"{}\"></div></body>\n</html>\n",
        escape_html(path)
    )
}

pub async fn render(uri: Uri) -> Response {
    let path = uri.path();
    match page_title(path) {
        Some(title) => Html(shell(title, path)).into_response(),
        None => (StatusCode::NOT_FOUND, Html(shell("Not found", path))).into_response(),
    }
}
