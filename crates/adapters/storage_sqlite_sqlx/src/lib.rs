//! # propdesk-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement `ListingRepository` from `propdesk-app::ports::storage`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//! - Translate resolved list queries into SQL over JSON field documents
//!
//! ## Dependency rule
//! Depends on `propdesk-app` (for port traits) and `propdesk-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod error;
mod listing_repo;
mod pool;

pub use error::StorageError;
pub use listing_repo::SqliteListingRepository;
pub use pool::{Config, Database};
