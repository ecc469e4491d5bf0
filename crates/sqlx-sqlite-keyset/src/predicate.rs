//! Keyset predicate construction.
//!
//! For an ordering `(c1, c2, ..., pk)` and an anchor `(v1, v2, ..., k)` the
//! predicate selects rows strictly after the anchor in fetch order:
//!
//! ```text
//! (c1 = v1 AND ((c2 = v2 AND pk > k) OR c2 > v2)) OR c1 > v1
//! ```
//!
//! with each operator chosen by the column's [`Tendency`](crate::Tendency) and
//! nullable columns expanded by their [`NullsStrategy`](crate::NullsStrategy).
//! The comparison stops at the last primary-key column, since the primary
//! key alone already orders the rows that tie on everything before it.

use tracing::debug;

use crate::anchor::{AnchorAttribute, AnchorBinding, AnchorLookup, Keyset};
use crate::direction::Direction;
use crate::ordering::OrderingSpecification;
use crate::relation::Source;
use crate::sql::Expr;

/// A keyset filter and the lookup subquery it refers to, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct KeysetPredicate {
   expr: Expr,
   lookup: Option<AnchorLookup>,
}

impl KeysetPredicate {
   pub fn expr(&self) -> &Expr {
      &self.expr
   }

   /// The lookup subquery that must be attached to whatever relation this
   /// predicate filters.
   pub fn lookup(&self) -> Option<&AnchorLookup> {
      self.lookup.as_ref()
   }

   pub fn into_parts(self) -> (Expr, Option<AnchorLookup>) {
      (self.expr, self.lookup)
   }
}

/// Build the predicate selecting rows after `keyset` in `direction`'s fetch
/// order, with columns resolved against `source`.
///
/// Returns `None` when the keyset lacks a non-NULL value for some
/// primary-key column; the request then degrades to a first page.
pub fn keyset_predicate(
   spec: &OrderingSpecification,
   keyset: &Keyset,
   direction: Direction,
   source: &Source,
) -> Option<KeysetPredicate> {
   let Some(binding) = AnchorBinding::bind(spec, keyset, source) else {
      debug!(%direction, "keyset does not identify an anchor row, paginating from the start");
      return None;
   };

   let expr = Builder {
      spec,
      binding: &binding,
      direction,
      handle: source.handle(),
   }
   .build(0)
   .grouped();

   Some(KeysetPredicate {
      expr,
      lookup: binding.into_lookup(),
   })
}

struct Builder<'a> {
   spec: &'a OrderingSpecification,
   binding: &'a AnchorBinding,
   direction: Direction,
   handle: &'a str,
}

impl Builder<'_> {
   fn build(&self, index: usize) -> Expr {
      let (Some(column), Some(anchor)) = (
         self.spec.columns().get(index),
         self.binding.attribute_at(index),
      ) else {
         // Unreachable while the last primary key terminates the recursion.
         return Expr::Bool(false);
      };

      let tendency = self.direction.tendency(column.direction());
      let attr = column.attr(self.handle);
      let value = anchor.rvalue();

      if index == self.spec.last_primary_key_index() {
         return tendency.comparison_predicate(attr, value);
      }

      let nested = self.build(index + 1);

      let Some(nulls) = self.direction.nulls(column.nulls_order()) else {
         return tendency.non_nullable_predicate(attr, value, nested);
      };

      match anchor {
         AnchorAttribute::Literal { value: literal, .. } if literal.is_null() => {
            nulls.if_null(attr, nested)
         }
         AnchorAttribute::Literal { .. } => nulls.if_not_null(tendency, attr, value, nested),
         AnchorAttribute::Selector { .. } => Expr::case(
            value.clone().is_null(),
            nulls.if_null(attr.clone(), nested.clone()),
            nulls.if_not_null(tendency, attr, value, nested),
         ),
      }
   }
}
