//! Awaitable page and window requests

use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::debug;

use crate::Error;
use crate::anchor::Keyset;
use crate::apply::PaginationStrategy;
use crate::config::PaginationConfig;
use crate::cursor::{Cursor, KeysetPage};
use crate::direction::Direction;
use crate::fetch::{DataFetcher, Row};
use crate::ordering::OrderingSpecification;
use crate::predicate::{KeysetPredicate, keyset_predicate};
use crate::relation::Relation;
use crate::window::{KeysetTransform, WindowedKeysets};

/// Builder for one keyset-paginated page.
///
/// Without a cursor the first page is fetched. Rows always come back in
/// display order, including for `before` pages.
pub struct FetchPageBuilder<F> {
   fetcher: Arc<F>,
   config: PaginationConfig,
   relation: Relation,
   spec: OrderingSpecification,
   limit: usize,
   anchor: Option<(Direction, Keyset)>,
   strategy: Option<PaginationStrategy>,
   permit_cursor: bool,
}

impl<F: DataFetcher + 'static> FetchPageBuilder<F> {
   pub fn new(fetcher: Arc<F>, relation: Relation, spec: OrderingSpecification, limit: usize) -> Self {
      Self {
         fetcher,
         config: PaginationConfig::default(),
         relation,
         spec,
         limit,
         anchor: None,
         strategy: None,
         permit_cursor: true,
      }
   }

   pub fn config(mut self, config: PaginationConfig) -> Self {
      self.config = config;
      self
   }

   /// Fetch the page that follows `keyset` in display order.
   pub fn after(mut self, keyset: Keyset) -> Self {
      self.anchor = Some((Direction::After, keyset));
      self
   }

   /// Fetch the page that precedes `keyset` in display order.
   pub fn before(mut self, keyset: Keyset) -> Self {
      self.anchor = Some((Direction::Before, keyset));
      self
   }

   /// Resume from a cursor returned by a previous page. The cursor's limit
   /// replaces the builder's.
   pub fn cursor(mut self, cursor: Cursor) -> Self {
      self.limit = cursor.limit;
      self.anchor = Some((cursor.direction, cursor.keyset));
      self
   }

   /// Override the automatically selected strategy.
   pub fn strategy(mut self, strategy: PaginationStrategy) -> Self {
      self.strategy = Some(strategy);
      self
   }

   /// When `false`, any cursor is ignored and the first page is fetched.
   pub fn permit_cursor(mut self, permit: bool) -> Self {
      self.permit_cursor = permit;
      self
   }

   /// Execute the paginated query and return a page of results
   pub async fn execute(self) -> Result<KeysetPage, Error> {
      self.config.validate_limit(self.limit)?;

      let anchor = match self.anchor {
         Some(_) if !self.permit_cursor => {
            debug!("cursor not permitted, fetching the first page");
            None
         }
         anchor => anchor,
      };
      let (direction, predicate) = resolve_anchor(&self.spec, &self.relation, anchor);

      let strategy = self
         .strategy
         .unwrap_or_else(|| PaginationStrategy::for_relation(&self.relation));

      // One extra row tells whether another page exists.
      let relation = strategy.apply(self.relation, &self.spec, direction, predicate, self.limit + 1)?;
      let (sql, values) = relation.to_sql();
      debug!(%sql, "fetching keyset page");

      let rows = self.fetcher.fetch(&sql, values).await?;
      let (mut rows, has_more) = take_tuples(&self.spec, rows, self.limit);

      let cursor_row = if direction.reverses_fetch_order() {
         // Restore display order
         rows.reverse();
         rows.first()
      } else {
         rows.last()
      };

      let next_cursor = match cursor_row {
         Some(row) if has_more => Some(Cursor {
            direction,
            limit: self.limit,
            keyset: self.spec.keyset_of(row)?,
         }),
         _ => None,
      };

      Ok(KeysetPage {
         rows,
         next_cursor,
         has_more,
      })
   }
}

impl<F: DataFetcher + 'static> IntoFuture for FetchPageBuilder<F> {
   type Output = Result<KeysetPage, Error>;
   type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

   fn into_future(self) -> Self::IntoFuture {
      Box::pin(self.execute())
   }
}

/// Builder for a batch of anchor snapshots answering page jumps.
///
/// Fetches snapshots (ordering columns only) past the anchor and wraps them
/// in [`WindowedKeysets`]. An `after` batch holds up to `max_jump × limit`
/// snapshots. A `before` batch starts with the anchor itself followed by up
/// to `(max_jump + 1) × limit` snapshots, so jump 0 is the current page.
pub struct FetchWindowBuilder<F> {
   fetcher: Arc<F>,
   relation: Relation,
   spec: OrderingSpecification,
   limit: usize,
   max_jump: usize,
   anchor: Option<(Direction, Keyset)>,
   transform: Option<KeysetTransform>,
}

impl<F: DataFetcher + 'static> FetchWindowBuilder<F> {
   pub fn new(
      fetcher: Arc<F>,
      relation: Relation,
      spec: OrderingSpecification,
      limit: usize,
      max_jump: usize,
   ) -> Self {
      Self {
         fetcher,
         relation,
         spec,
         limit,
         max_jump,
         anchor: None,
         transform: None,
      }
   }

   pub fn after(mut self, keyset: Keyset) -> Self {
      self.anchor = Some((Direction::After, keyset));
      self
   }

   pub fn before(mut self, keyset: Keyset) -> Self {
      self.anchor = Some((Direction::Before, keyset));
      self
   }

   /// Applied to every snapshot a jump returns from the batch.
   pub fn transform(mut self, transform: impl Fn(&Keyset) -> Keyset + Send + Sync + 'static) -> Self {
      self.transform = Some(Box::new(transform));
      self
   }

   /// Fetch the batch and build the window
   pub async fn execute(self) -> Result<WindowedKeysets, Error> {
      if self.limit == 0 || self.max_jump == 0 {
         return Err(Error::InvalidPageSize);
      }

      let (direction, keyset) = self.anchor.ok_or(Error::MissingWindowAnchor)?;

      // A before window starts at the anchor itself and needs one page past
      // the deepest jump to tell a full page from the boundary page.
      let pages = match direction {
         Direction::Before => self.max_jump.checked_add(1),
         Direction::After => Some(self.max_jump),
      };
      let batch_size = pages
         .and_then(|pages| pages.checked_mul(self.limit))
         .ok_or(Error::InvalidPageSize)?;

      let Some(predicate) = keyset_predicate(&self.spec, &keyset, direction, self.relation.source())
      else {
         debug!(%direction, "window anchor does not identify a row");
         return Err(Error::MissingWindowAnchor);
      };

      let handle = self.relation.source().handle().to_string();
      let narrow = self
         .spec
         .columns()
         .iter()
         .fold(self.relation.without_projection().distinct(), |narrow, column| {
            narrow.select_as(column.attr(&handle), column.key())
         });

      let relation =
         PaginationStrategy::Direct.apply(narrow, &self.spec, direction, Some(predicate), batch_size)?;
      let (sql, values) = relation.to_sql();
      debug!(%sql, %direction, batch_size, "fetching keyset window");

      let rows = self.fetcher.fetch(&sql, values).await?;
      let mut batch = Vec::with_capacity(rows.len() + 1);
      if direction == Direction::Before {
         batch.push(keyset.clone());
      }
      for row in &rows {
         batch.push(self.spec.keyset_of(row)?);
      }

      let window = direction.keysets(batch, Some(keyset))?;
      Ok(match self.transform {
         Some(transform) => window.with_transform(transform),
         None => window,
      })
   }
}

impl<F: DataFetcher + 'static> IntoFuture for FetchWindowBuilder<F> {
   type Output = Result<WindowedKeysets, Error>;
   type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

   fn into_future(self) -> Self::IntoFuture {
      Box::pin(self.execute())
   }
}

/// The fetch direction and predicate for an optional anchor. Anchors that do
/// not identify a row fall back to the first page.
fn resolve_anchor(
   spec: &OrderingSpecification,
   relation: &Relation,
   anchor: Option<(Direction, Keyset)>,
) -> (Direction, Option<KeysetPredicate>) {
   anchor
      .and_then(|(direction, keyset)| {
         keyset_predicate(spec, &keyset, direction, relation.source())
            .map(|predicate| (direction, Some(predicate)))
      })
      .unwrap_or((Direction::After, None))
}

/// Keep the rows of the first `limit` distinct ordering tuples.
///
/// Rows arrive ordered by the full tuple, so rows sharing a tuple (one
/// entity fanned out by a join) are adjacent. Returns whether a further
/// tuple was present.
fn take_tuples(spec: &OrderingSpecification, rows: Vec<Row>, limit: usize) -> (Vec<Row>, bool) {
   let mut kept = Vec::with_capacity(rows.len().min(limit));
   let mut tuples = 0;
   let mut current: Option<Vec<JsonValue>> = None;

   for row in rows {
      let tuple = spec.tuple_of(&row);
      if current.as_ref() != Some(&tuple) {
         if tuples == limit {
            return (kept, true);
         }
         tuples += 1;
         current = Some(tuple);
      }
      kept.push(row);
   }

   (kept, false)
}
