//! Running rendered relations against a database.

use std::future::Future;

use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteRow};
use sqlx::{Column, Executor, Row as _};
use sqlx_sqlite_conn_mgr::SqliteDatabase;

use crate::Error;

/// A decoded result row, columns in select-list order.
pub type Row = IndexMap<String, JsonValue>;

/// Executes SQL with positional JSON binds and returns decoded rows.
///
/// The pagination builders only ever read through this trait, so they can
/// run against anything that can answer a SELECT.
pub trait DataFetcher: Send + Sync {
   fn fetch(
      &self,
      sql: &str,
      values: Vec<JsonValue>,
   ) -> impl Future<Output = Result<Vec<Row>, Error>> + Send;
}

impl DataFetcher for SqliteDatabase {
   async fn fetch(&self, sql: &str, values: Vec<JsonValue>) -> Result<Vec<Row>, Error> {
      // Use read pool for queries
      let pool = self.read_pool()?;

      let mut q = sqlx::query(sql);
      for value in values {
         q = bind_value(q, value);
      }

      let rows = pool.fetch_all(q).await?;
      decode_rows(rows)
   }
}

pub(crate) fn decode_rows(rows: Vec<SqliteRow>) -> Result<Vec<Row>, Error> {
   let mut decoded = Vec::with_capacity(rows.len());
   for row in rows {
      let mut value = Row::default();
      for (i, column) in row.columns().iter().enumerate() {
         let v = row.try_get_raw(i)?;
         let v = crate::decode::to_json(v)?;
         value.insert(column.name().to_string(), v);
      }
      decoded.push(value);
   }
   Ok(decoded)
}

/// Helper function to bind a JSON value to a SQLx query
pub(crate) fn bind_value<'a>(
   query: sqlx::query::Query<'a, Sqlite, SqliteArguments<'a>>,
   value: JsonValue,
) -> sqlx::query::Query<'a, Sqlite, SqliteArguments<'a>> {
   match value {
      JsonValue::Null => query.bind(None::<JsonValue>),
      JsonValue::String(s) => query.bind(s),
      JsonValue::Bool(b) => query.bind(b),
      JsonValue::Number(number) => {
         // Preserve integer precision by binding as i64 when possible
         if let Some(int_val) = number.as_i64() {
            query.bind(int_val)
         } else if let Some(uint_val) = number.as_u64() {
            // Value too large for i64, use f64 (will lose precision)
            query.bind(uint_val as f64)
         } else {
            query.bind(number.as_f64().unwrap_or_default())
         }
      }
      other => query.bind(other),
   }
}
