//! # sqlx-sqlite-conn-mgr
//!
//! Read/write connection pools over SQLx for SQLite. The keyset pagination
//! engine runs its page and window fetches on the read pool; fixtures and
//! other mutations go through the single writer.
//!
//! ## Core Types
//!
//! - **[`SqliteDatabase`]**: separate read and write pools plus close/remove lifecycle
//! - **[`SqliteDatabaseConfig`]**: pool sizing and timeouts
//! - **[`WriteGuard`]**: RAII guard ensuring exclusive write access
//! - **[`Error`]**: error type for database operations
//!
//! ## Architecture
//!
//! - **Dual pools**: read-only pool (default 6 connections) and write pool (1 connection)
//! - **Lazy WAL mode**: enabled on the first writer acquisition
//! - **Exclusive writes**: the single-connection write pool serializes writers

mod config;
mod database;
mod error;
mod write_guard;

pub use config::SqliteDatabaseConfig;
pub use database::SqliteDatabase;
pub use error::{Error, Result};
pub use write_guard::WriteGuard;
