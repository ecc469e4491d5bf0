//! Exclusive writer access

use std::ops::{Deref, DerefMut};

use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection};

/// RAII guard over the single writer connection.
///
/// Dereferences to [`SqliteConnection`], so `&mut *guard` can be passed to
/// sqlx as an executor. The connection returns to the write pool on drop.
#[must_use = "dropping the guard releases the writer immediately"]
#[derive(Debug)]
pub struct WriteGuard {
   conn: PoolConnection<Sqlite>,
}

impl WriteGuard {
   pub(crate) fn new(conn: PoolConnection<Sqlite>) -> Self {
      Self { conn }
   }
}

impl Deref for WriteGuard {
   type Target = SqliteConnection;

   fn deref(&self) -> &Self::Target {
      &self.conn
   }
}

impl DerefMut for WriteGuard {
   fn deref_mut(&mut self) -> &mut Self::Target {
      &mut self.conn
   }
}
