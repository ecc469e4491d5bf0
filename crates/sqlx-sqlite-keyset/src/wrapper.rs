use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx_sqlite_conn_mgr::{SqliteDatabase, SqliteDatabaseConfig};

use crate::Error;
use crate::builders::{FetchPageBuilder, FetchWindowBuilder};
use crate::config::PaginationConfig;
use crate::fetch::{DataFetcher, Row, bind_value};
use crate::ordering::OrderingSpecification;
use crate::relation::Relation;

/// Result returned from write operations (e.g. INSERT, UPDATE, DELETE).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteQueryResult {
   /// The number of rows affected by the write operation.
   pub rows_affected: u64,
   /// The last inserted row ID (SQLite ROWID).
   ///
   /// Only set for INSERT operations on tables with a ROWID.
   /// Tables created with `WITHOUT ROWID` will not set this value (returns 0).
   pub last_insert_id: i64,
}

/// A database handle with keyset pagination on top of the connection manager.
///
/// Cloning is cheap; clones share the same pools.
#[derive(Clone)]
pub struct DatabaseWrapper {
   inner: Arc<SqliteDatabase>,
   config: PaginationConfig,
}

impl DatabaseWrapper {
   /// Connect to (creating if needed) the SQLite database at `path`.
   pub async fn connect(
      path: impl AsRef<Path>,
      custom_config: Option<SqliteDatabaseConfig>,
   ) -> Result<Self, Error> {
      let db = SqliteDatabase::connect(path, custom_config).await?;

      Ok(Self {
         inner: db,
         config: PaginationConfig::default(),
      })
   }

   /// Replace the pagination limits used by page and window requests.
   pub fn with_pagination_config(mut self, config: PaginationConfig) -> Self {
      self.config = config;
      self
   }

   pub fn pagination_config(&self) -> &PaginationConfig {
      &self.config
   }

   /// Execute a write query (INSERT/UPDATE/DELETE)
   pub async fn execute(
      &self,
      query: String,
      values: Vec<JsonValue>,
   ) -> Result<WriteQueryResult, Error> {
      // Acquire writer for mutations
      let mut writer = self.inner.acquire_writer().await?;

      let mut q = sqlx::query(&query);
      for value in values {
         q = bind_value(q, value);
      }

      let result = q.execute(&mut *writer).await?;
      Ok(WriteQueryResult {
         rows_affected: result.rows_affected(),
         last_insert_id: result.last_insert_rowid(),
      })
   }

   /// Execute a SELECT query, possibly returning multiple rows
   pub async fn fetch_all(&self, query: String, values: Vec<JsonValue>) -> Result<Vec<Row>, Error> {
      self.inner.fetch(&query, values).await
   }

   /// Fetch one page of `relation` in the order given by `spec`.
   ///
   /// ```no_run
   /// # async fn demo(db: sqlx_sqlite_keyset::DatabaseWrapper) -> sqlx_sqlite_keyset::Result<()> {
   /// use sqlx_sqlite_keyset::{ColumnSpec, OrderingSpecification, Relation};
   ///
   /// let spec = OrderingSpecification::new(vec![
   ///    ColumnSpec::desc("score").nulls_last(),
   ///    ColumnSpec::asc("id").primary_key(),
   /// ])?;
   ///
   /// let first = db.fetch_page(Relation::table("posts"), spec.clone(), 20).await?;
   /// if let Some(cursor) = first.next_cursor {
   ///    let second = db.fetch_page(Relation::table("posts"), spec, 20).cursor(cursor).await?;
   ///    println!("{} more rows", second.rows.len());
   /// }
   /// # Ok(())
   /// # }
   /// ```
   pub fn fetch_page(
      &self,
      relation: Relation,
      spec: OrderingSpecification,
      limit: usize,
   ) -> FetchPageBuilder<SqliteDatabase> {
      FetchPageBuilder::new(Arc::clone(&self.inner), relation, spec, limit).config(self.config)
   }

   /// Fetch a batch of anchor snapshots for page jumps of up to `max_jump`
   /// pages of `limit` rows.
   pub fn fetch_window(
      &self,
      relation: Relation,
      spec: OrderingSpecification,
      limit: usize,
      max_jump: Option<usize>,
   ) -> FetchWindowBuilder<SqliteDatabase> {
      FetchWindowBuilder::new(
         Arc::clone(&self.inner),
         relation,
         spec,
         limit,
         max_jump.unwrap_or(self.config.default_max_jump),
      )
   }

   /// Close the database connection
   pub async fn close(self) -> Result<(), Error> {
      self.inner.close().await?;
      Ok(())
   }

   /// Close the database connection and remove all database files
   pub async fn remove(self) -> Result<(), Error> {
      self.inner.remove().await?;
      Ok(())
   }

   /// Get the underlying connection manager database
   pub fn inner(&self) -> &Arc<SqliteDatabase> {
      &self.inner
   }
}

impl DataFetcher for DatabaseWrapper {
   async fn fetch(&self, sql: &str, values: Vec<JsonValue>) -> Result<Vec<Row>, Error> {
      self.inner.fetch(sql, values).await
   }
}
