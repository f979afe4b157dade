//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own session and account logic so route handlers can stay
//! focused on cookie plumbing and status mapping.

pub mod accounts;
pub mod tokens;
