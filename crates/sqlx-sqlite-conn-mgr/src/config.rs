//! Pool configuration for [`SqliteDatabase`](crate::SqliteDatabase)

use std::time::Duration;

/// Connection pool settings used by [`SqliteDatabase::connect`](crate::SqliteDatabase::connect).
///
/// # Examples
///
/// ```
/// use sqlx_sqlite_conn_mgr::SqliteDatabaseConfig;
/// use std::time::Duration;
///
/// // Defaults: 6 readers, 30s idle timeout, 5s busy timeout
/// let config = SqliteDatabaseConfig::default();
///
/// // Fewer readers for a page-fetching worker
/// let config = SqliteDatabaseConfig {
///     max_read_connections: 2,
///     ..Default::default()
/// };
///
/// let config = SqliteDatabaseConfig::default().with_busy_timeout(Duration::from_secs(1));
/// ```
#[derive(Debug, Clone)]
pub struct SqliteDatabaseConfig {
   /// Upper bound of the read-only pool. Page and window fetches all run here.
   ///
   /// Default: 6
   pub max_read_connections: u32,

   /// Idle connections in either pool are closed after this long.
   ///
   /// Default: 30 seconds
   pub idle_timeout: Duration,

   /// How long a connection waits on a locked database before SQLite reports
   /// `SQLITE_BUSY`.
   ///
   /// Default: 5 seconds
   pub busy_timeout: Duration,
}

impl SqliteDatabaseConfig {
   /// Return a copy with a different busy timeout.
   pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
      self.busy_timeout = busy_timeout;
      self
   }

   /// The read pool needs at least one connection to be usable.
   pub(crate) fn read_connections(&self) -> u32 {
      self.max_read_connections.max(1)
   }
}

impl Default for SqliteDatabaseConfig {
   fn default() -> Self {
      Self {
         max_read_connections: 6,
         idle_timeout: Duration::from_secs(30),
         busy_timeout: Duration::from_secs(5),
      }
   }
}
