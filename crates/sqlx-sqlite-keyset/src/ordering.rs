//! Ordering specifications: the ordered columns a keyset is compared against.
//!
//! # Example
//!
//! ```
//! use sqlx_sqlite_keyset::{ColumnSpec, OrderingSpecification};
//!
//! let spec = OrderingSpecification::new(vec![
//!    ColumnSpec::asc("category"),
//!    ColumnSpec::desc("score").nulls_last(),
//!    ColumnSpec::asc("id").primary_key(),
//! ])
//! .unwrap();
//!
//! assert_eq!(spec.primary_keys().count(), 1);
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::Error;
use crate::anchor::Keyset;
use crate::direction::Direction;
use crate::fetch::Row;
use crate::relation::OrderTerm;
use crate::sql::{Expr, validate_identifier};

/// Sort direction for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortDirection {
   /// Ascending order (smallest first)
   Asc,
   /// Descending order (largest first)
   Desc,
}

impl SortDirection {
   /// Return the opposite sort direction.
   pub fn reversed(self) -> Self {
      match self {
         SortDirection::Asc => SortDirection::Desc,
         SortDirection::Desc => SortDirection::Asc,
      }
   }

   pub(crate) fn as_sql(self) -> &'static str {
      match self {
         SortDirection::Asc => "ASC",
         SortDirection::Desc => "DESC",
      }
   }
}

impl FromStr for SortDirection {
   type Err = Error;

   fn from_str(token: &str) -> Result<Self, Self::Err> {
      match token.to_ascii_lowercase().as_str() {
         "asc" => Ok(SortDirection::Asc),
         "desc" => Ok(SortDirection::Desc),
         _ => Err(Error::UnsupportedToken {
            kind: "sort direction",
            token: token.to_string(),
         }),
      }
   }
}

/// Where NULLs of a column sort.
///
/// `Default` leaves the column out of NULL handling entirely: the predicate
/// uses plain comparisons (which never match NULL) and ORDER BY gets no
/// `NULLS` clause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NullsOrder {
   #[default]
   Default,
   First,
   Last,
}

impl NullsOrder {
   pub(crate) fn as_sql(self) -> Option<&'static str> {
      match self {
         NullsOrder::Default => None,
         NullsOrder::First => Some("NULLS FIRST"),
         NullsOrder::Last => Some("NULLS LAST"),
      }
   }
}

impl FromStr for NullsOrder {
   type Err = Error;

   fn from_str(token: &str) -> Result<Self, Self::Err> {
      match token.to_ascii_lowercase().as_str() {
         "" | "default" => Ok(NullsOrder::Default),
         "first" => Ok(NullsOrder::First),
         "last" => Ok(NullsOrder::Last),
         _ => Err(Error::UnsupportedToken {
            kind: "nulls order",
            token: token.to_string(),
         }),
      }
   }
}

/// Resolves the SQL expression for a column key against a table handle.
///
/// Closures `Fn(&str, &str) -> Expr` taking `(key, table_handle)` implement
/// this trait.
pub trait AttributeResolver: Send + Sync {
   fn attribute(&self, key: &str, table: &str) -> Expr;
}

impl<F> AttributeResolver for F
where
   F: Fn(&str, &str) -> Expr + Send + Sync,
{
   fn attribute(&self, key: &str, table: &str) -> Expr {
      self(key, table)
   }
}

/// One column of an [`OrderingSpecification`].
#[derive(Clone)]
pub struct ColumnSpec {
   key: String,
   direction: SortDirection,
   nulls: NullsOrder,
   primary_key: bool,
   attribute: Option<Arc<dyn AttributeResolver>>,
}

impl ColumnSpec {
   pub fn new(key: impl Into<String>, direction: SortDirection) -> Self {
      Self {
         key: key.into(),
         direction,
         nulls: NullsOrder::Default,
         primary_key: false,
         attribute: None,
      }
   }

   pub fn asc(key: impl Into<String>) -> Self {
      Self::new(key, SortDirection::Asc)
   }

   pub fn desc(key: impl Into<String>) -> Self {
      Self::new(key, SortDirection::Desc)
   }

   /// Build a column from configuration tokens, e.g. `("score", "desc", "last")`.
   pub fn from_tokens(key: impl Into<String>, direction: &str, nulls: &str) -> Result<Self, Error> {
      Ok(Self::new(key, direction.parse()?).nulls(nulls.parse()?))
   }

   pub fn primary_key(mut self) -> Self {
      self.primary_key = true;
      self
   }

   pub fn nulls(mut self, nulls: NullsOrder) -> Self {
      self.nulls = nulls;
      self
   }

   pub fn nulls_first(self) -> Self {
      self.nulls(NullsOrder::First)
   }

   pub fn nulls_last(self) -> Self {
      self.nulls(NullsOrder::Last)
   }

   /// Read this key from a differently named column of the same table.
   pub fn from_column(self, column: impl Into<String>) -> Self {
      let column = column.into();
      self.attribute(move |_key: &str, table: &str| Expr::qualified(table, column.as_str()))
   }

   /// Use a custom expression for this key.
   pub fn attribute(mut self, resolver: impl AttributeResolver + 'static) -> Self {
      self.attribute = Some(Arc::new(resolver));
      self
   }

   pub fn key(&self) -> &str {
      &self.key
   }

   pub fn direction(&self) -> SortDirection {
      self.direction
   }

   pub fn nulls_order(&self) -> NullsOrder {
      self.nulls
   }

   pub fn is_primary_key(&self) -> bool {
      self.primary_key
   }

   /// The column's expression against `table`. Without a custom resolver
   /// this is the same-named column of the table.
   pub fn attr(&self, table: &str) -> Expr {
      match &self.attribute {
         Some(resolver) => resolver.attribute(&self.key, table),
         None => Expr::qualified(table, self.key.as_str()),
      }
   }
}

impl fmt::Debug for ColumnSpec {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("ColumnSpec")
         .field("key", &self.key)
         .field("direction", &self.direction)
         .field("nulls", &self.nulls)
         .field("primary_key", &self.primary_key)
         .field("custom_attribute", &self.attribute.is_some())
         .finish()
   }
}

/// Ordered, validated list of [`ColumnSpec`]s. Cheap to clone and share.
///
/// The primary-key columns must identify a row on their own; the keyset
/// predicate stops comparing at the last of them.
#[derive(Debug, Clone)]
pub struct OrderingSpecification {
   columns: Arc<[ColumnSpec]>,
   last_primary_key: usize,
}

impl OrderingSpecification {
   pub fn new(columns: Vec<ColumnSpec>) -> Result<Self, Error> {
      if columns.is_empty() {
         return Err(Error::EmptyOrdering);
      }

      for (i, column) in columns.iter().enumerate() {
         validate_identifier(&column.key)?;
         if columns[..i].iter().any(|c| c.key == column.key) {
            return Err(Error::DuplicateColumnKey {
               key: column.key.clone(),
            });
         }
      }

      let last_primary_key = columns
         .iter()
         .rposition(ColumnSpec::is_primary_key)
         .ok_or(Error::MissingPrimaryKey)?;

      Ok(Self {
         columns: columns.into(),
         last_primary_key,
      })
   }

   pub fn columns(&self) -> &[ColumnSpec] {
      &self.columns
   }

   pub fn column(&self, key: &str) -> Option<&ColumnSpec> {
      self.columns.iter().find(|c| c.key == key)
   }

   pub fn primary_keys(&self) -> impl Iterator<Item = &ColumnSpec> {
      self.columns.iter().filter(|c| c.primary_key)
   }

   /// Index of the last primary-key column; predicates never look past it.
   pub fn last_primary_key_index(&self) -> usize {
      self.last_primary_key
   }

   /// True when every primary-key column has a non-NULL value in `keyset`.
   pub fn identifies_anchor(&self, keyset: &Keyset) -> bool {
      self
         .primary_keys()
         .all(|c| keyset.get(&c.key).is_some_and(|v| !v.is_null()))
   }

   /// ORDER BY terms for fetching rows in `direction`'s fetch order.
   pub fn order_terms(&self, direction: Direction, table: &str) -> Vec<OrderTerm> {
      self
         .columns
         .iter()
         .map(|c| {
            let tendency = direction.tendency(c.direction);
            let nulls = direction
               .nulls(c.nulls)
               .map_or(NullsOrder::Default, |n| n.nulls_order());
            OrderTerm::new(c.attr(table), tendency.sort_direction(), nulls)
         })
         .collect()
   }

   /// Pull this specification's keys out of a fetched row.
   pub fn keyset_of(&self, row: &Row) -> Result<Keyset, Error> {
      self
         .columns
         .iter()
         .map(|c| {
            row.get(&c.key)
               .map(|v| (c.key.clone(), v.clone()))
               .ok_or_else(|| Error::CursorColumnNotFound {
                  column: c.key.clone(),
               })
         })
         .collect()
   }

   /// The row's values for every column, in order. Rows sharing a tuple
   /// belong to the same anchor.
   pub(crate) fn tuple_of(&self, row: &Row) -> Vec<JsonValue> {
      self
         .columns
         .iter()
         .map(|c| row.get(&c.key).cloned().unwrap_or(JsonValue::Null))
         .collect()
   }
}
