//! Data models
//!
//! Shared between the server and API clients.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` snowflakes; account ids issued by the identity
//! provider stay opaque strings.

pub mod admin;
pub mod department;
pub mod issue;

// Re-exports
pub use admin::*;
pub use department::*;
pub use issue::*;
