//! Error types for sqlx-sqlite-conn-mgr

use thiserror::Error;

/// Errors raised while opening, using or tearing down a [`SqliteDatabase`](crate::SqliteDatabase)
#[derive(Error, Debug)]
pub enum Error {
   /// Creating directories or deleting database files failed.
   #[error("IO error: {0}")]
   Io(#[from] std::io::Error),

   /// Connecting, acquiring or querying through sqlx failed.
   #[error("Sqlx error: {0}")]
   Sqlx(#[from] sqlx::Error),

   /// The database was closed and its pools can no longer be used
   #[error("Database has been closed")]
   DatabaseClosed,
}

/// A type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
