//! # sqlx-sqlite-keyset
//!
//! Keyset (cursor) pagination for SQLite on top of SQLx and
//! `sqlx-sqlite-conn-mgr`.
//!
//! A page is described by a [`Relation`] (the rows to page through) and an
//! [`OrderingSpecification`] (the columns they are ordered by, at least one of
//! them a primary key). A page request carries an anchor [`Keyset`] and a
//! [`Direction`]; the engine turns them into a tuple comparison over the
//! ordering columns and applies it with the matching ORDER BY and LIMIT.
//!
//! ## Features
//!
//! - **Mixed directions and NULL placement**: every column sorts ASC or DESC
//!   with default, `NULLS FIRST` or `NULLS LAST` handling
//! - **Derived anchors**: keysets may carry only the primary key; missing
//!   values are read from the anchor row in the same statement
//! - **Join-safe paging**: relations with joins are paged through a
//!   `DISTINCT` window of primary keys
//! - **Page jumps**: [`WindowedKeysets`] answers "jump N pages" from one batch
//!
//! ## Example
//!
//! ```no_run
//! use sqlx_sqlite_keyset::{ColumnSpec, DatabaseWrapper, OrderingSpecification, Relation};
//!
//! # async fn example() -> sqlx_sqlite_keyset::Result<()> {
//! let db = DatabaseWrapper::connect("app.db", None).await?;
//!
//! let spec = OrderingSpecification::new(vec![
//!    ColumnSpec::asc("category"),
//!    ColumnSpec::desc("score").nulls_last(),
//!    ColumnSpec::asc("id").primary_key(),
//! ])?;
//!
//! let page = db.fetch_page(Relation::table("posts"), spec.clone(), 25).await?;
//!
//! if let Some(cursor) = page.next_cursor {
//!    let next = db.fetch_page(Relation::table("posts"), spec, 25).cursor(cursor).await?;
//!    assert!(next.rows.len() <= 25);
//! }
//! # Ok(())
//! # }
//! ```

mod anchor;
mod apply;
mod builders;
mod config;
mod cursor;
mod decode;
mod direction;
mod error;
mod fetch;
mod ordering;
mod predicate;
mod relation;
mod sql;
mod tendency;
mod window;
mod wrapper;

pub use anchor::{AnchorAttribute, AnchorBinding, AnchorLookup, Keyset, anchor_lookup_name};
pub use apply::PaginationStrategy;
pub use builders::{FetchPageBuilder, FetchWindowBuilder};
pub use config::PaginationConfig;
pub use cursor::{Cursor, KeysetPage};
pub use direction::Direction;
pub use error::{Error, Result};
pub use fetch::{DataFetcher, Row};
pub use ordering::{AttributeResolver, ColumnSpec, NullsOrder, OrderingSpecification, SortDirection};
pub use predicate::{KeysetPredicate, keyset_predicate};
pub use relation::{Join, JoinKind, NamedSubquery, OrderTerm, Projection, Relation, Source};
pub use sql::{CompareOp, Expr, TableRef};
pub use tendency::{NullsStrategy, Tendency};
pub use window::{KeysetTransform, PageJump, WindowedKeysets};
pub use wrapper::{DatabaseWrapper, WriteQueryResult};

// Re-export the connection manager configuration used by `DatabaseWrapper::connect`.
pub use sqlx_sqlite_conn_mgr::SqliteDatabaseConfig;
