//! SQLite database with a concurrent read pool and a serialized writer

use std::fs::{create_dir_all, remove_file};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::SqliteDatabaseConfig;
use crate::error::{Error, Result};
use crate::write_guard::WriteGuard;

/// SQLite database with connection pooling for concurrent reads and exclusive writes.
///
/// ## Architecture
///
/// - **`read_pool`**: read-only connections, used for every page and window fetch
/// - **`write_conn`**: single-connection pool (max_connections=1), so writes serialize
///
/// ## State Management
///
/// - **`wal_initialized`**: WAL journal mode is enabled on the first writer acquisition
/// - **`closed`**: set by [`close`](Self::close); later pool access fails with
///   [`Error::DatabaseClosed`]
/// - **`path`**: database file, needed by [`remove`](Self::remove)
#[derive(Debug)]
pub struct SqliteDatabase {
   read_pool: Pool<Sqlite>,
   write_conn: Pool<Sqlite>,
   wal_initialized: AtomicBool,
   wal_lock: Mutex<()>,
   closed: AtomicBool,
   path: PathBuf,
}

impl SqliteDatabase {
   /// Open (creating if needed) the database at `path`.
   ///
   /// Parent directories are created. The writer connects eagerly so the file
   /// exists before any reader opens it read-only.
   pub async fn connect(
      path: impl AsRef<Path>,
      custom_config: Option<SqliteDatabaseConfig>,
   ) -> Result<Arc<Self>> {
      let config = custom_config.unwrap_or_default();
      let path = path.as_ref().to_path_buf();

      if let Some(parent) = path.parent()
         && !parent.as_os_str().is_empty()
      {
         create_dir_all(parent)?;
      }

      let write_options = SqliteConnectOptions::new()
         .filename(&path)
         .create_if_missing(true)
         .busy_timeout(config.busy_timeout);

      let write_conn = SqlitePoolOptions::new()
         .max_connections(1)
         .idle_timeout(Some(config.idle_timeout))
         .connect_with(write_options.clone())
         .await?;

      let read_pool = SqlitePoolOptions::new()
         .max_connections(config.read_connections())
         .idle_timeout(Some(config.idle_timeout))
         .connect_lazy_with(write_options.create_if_missing(false).read_only(true));

      debug!(
         path = %path.display(),
         readers = config.read_connections(),
         "opened sqlite database"
      );

      Ok(Arc::new(Self {
         read_pool,
         write_conn,
         wal_initialized: AtomicBool::new(false),
         wal_lock: Mutex::new(()),
         closed: AtomicBool::new(false),
         path,
      }))
   }

   /// Path of the database file.
   pub fn path(&self) -> &Path {
      &self.path
   }

   /// Whether [`close`](Self::close) has been called.
   pub fn is_closed(&self) -> bool {
      self.closed.load(Ordering::Acquire)
   }

   /// The read-only pool.
   pub fn read_pool(&self) -> Result<&Pool<Sqlite>> {
      if self.is_closed() {
         return Err(Error::DatabaseClosed);
      }
      Ok(&self.read_pool)
   }

   /// Acquire the single writer connection, waiting for any current holder.
   ///
   /// The first acquisition switches the database to WAL journal mode so
   /// readers keep working while a write is in progress.
   pub async fn acquire_writer(&self) -> Result<WriteGuard> {
      if self.is_closed() {
         return Err(Error::DatabaseClosed);
      }

      let mut conn = self.write_conn.acquire().await?;

      if !self.wal_initialized.load(Ordering::Acquire) {
         let _guard = self.wal_lock.lock().await;
         if !self.wal_initialized.load(Ordering::Acquire) {
            sqlx::query("PRAGMA journal_mode = WAL")
               .execute(&mut *conn)
               .await?;
            self.wal_initialized.store(true, Ordering::Release);
            debug!(path = %self.path.display(), "enabled WAL journal mode");
         }
      }

      Ok(WriteGuard::new(conn))
   }

   /// Close both pools. Idempotent.
   pub async fn close(&self) -> Result<()> {
      if self.closed.swap(true, Ordering::AcqRel) {
         return Ok(());
      }

      self.read_pool.close().await;
      self.write_conn.close().await;
      debug!(path = %self.path.display(), "closed sqlite database");
      Ok(())
   }

   /// Close the database and delete its file along with the WAL and shared
   /// memory side files.
   pub async fn remove(&self) -> Result<()> {
      self.close().await?;

      let base = self.path.as_os_str().to_owned();
      for suffix in ["", "-wal", "-shm"] {
         let mut file = base.clone();
         file.push(suffix);
         match remove_file(&file) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(Error::Io(e)),
         }
      }

      Ok(())
   }
}
