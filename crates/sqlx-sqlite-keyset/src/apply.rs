//! Applying a keyset predicate to a relation.
//!
//! Two strategies produce the same rows:
//!
//! - [`PaginationStrategy::Direct`] filters, orders and limits the relation
//!   itself.
//! - [`PaginationStrategy::SemiJoin`] pages a narrow `DISTINCT` projection of
//!   the ordering columns (joins and filters kept) and selects the full rows
//!   whose primary key falls in that window. Joins that fan out one row into
//!   several cannot then shift the page boundary.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Error;
use crate::direction::Direction;
use crate::ordering::OrderingSpecification;
use crate::predicate::KeysetPredicate;
use crate::relation::Relation;
use crate::sql::Expr;

/// Alias of the page window inside the semi-join's EXISTS.
const WINDOW_ALIAS: &str = "keyset_window";

/// How a page query is assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaginationStrategy {
   Direct,
   SemiJoin,
}

impl PaginationStrategy {
   /// `SemiJoin` for relations with joins, `Direct` otherwise.
   pub fn for_relation(relation: &Relation) -> Self {
      if relation.has_joins() {
         PaginationStrategy::SemiJoin
      } else {
         PaginationStrategy::Direct
      }
   }

   /// Page `relation` in `direction`'s fetch order.
   ///
   /// The result projects every ordering column under its key, so a cursor
   /// can be read back from any returned row. The relation must not already
   /// be ordered or limited.
   pub fn apply(
      self,
      relation: Relation,
      spec: &OrderingSpecification,
      direction: Direction,
      predicate: Option<KeysetPredicate>,
      limit: usize,
   ) -> Result<Relation, Error> {
      if !relation.order().is_empty() || relation.limit_value().is_some() {
         return Err(Error::InvalidPaginationQuery);
      }

      debug!(strategy = ?self, %direction, limit, "applying keyset pagination");

      Ok(match self {
         PaginationStrategy::Direct => direct(relation, spec, direction, predicate, limit),
         PaginationStrategy::SemiJoin => semi_join(relation, spec, direction, predicate, limit),
      })
   }
}

fn direct(
   relation: Relation,
   spec: &OrderingSpecification,
   direction: Direction,
   predicate: Option<KeysetPredicate>,
   limit: usize,
) -> Relation {
   let handle = relation.source().handle().to_string();

   let relation = match predicate {
      Some(predicate) => {
         let (expr, lookup) = predicate.into_parts();
         let relation = match lookup {
            Some(lookup) => lookup.attach_to(relation),
            None => relation,
         };
         relation.filter(expr)
      }
      None => relation,
   };

   let relation = relation
      .order_by_all(spec.order_terms(direction, &handle))
      .limit(limit);

   project_ordering(relation, spec, &handle)
}

fn semi_join(
   relation: Relation,
   spec: &OrderingSpecification,
   direction: Direction,
   predicate: Option<KeysetPredicate>,
   limit: usize,
) -> Relation {
   let handle = relation.source().handle().to_string();

   let narrow = spec
      .columns()
      .iter()
      .fold(relation.clone().without_projection().distinct(), |narrow, column| {
         narrow.select_as(column.attr(&handle), column.key())
      });
   let window = direct(narrow, spec, direction, predicate, limit);

   let in_window = spec.primary_keys().fold(
      Relation::from_subquery(window, WINDOW_ALIAS).select(Expr::raw("1")),
      |in_window, pk| in_window.filter(Expr::qualified(WINDOW_ALIAS, pk.key()).equals(pk.attr(&handle))),
   );

   let relation = relation
      .filter(Expr::exists(in_window))
      .order_by_all(spec.order_terms(direction, &handle));

   project_ordering(relation, spec, &handle)
}

fn project_ordering(relation: Relation, spec: &OrderingSpecification, handle: &str) -> Relation {
   spec.columns().iter().fold(relation, |relation, column| {
      relation.ensure_projected(column.attr(handle), column.key())
   })
}
