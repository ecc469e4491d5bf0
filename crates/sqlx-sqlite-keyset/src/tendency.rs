//! Per-column comparison strategies.
//!
//! A keyset predicate is a lexicographic tuple comparison spelled out one
//! column at a time. [`Tendency`] decides which operator means "later" for a
//! column, and [`NullsStrategy`] decides how a nullable column's NULLs take
//! part in the comparison.
//!
//! Both are phrased as "rows after the anchor in fetch order".
//! [`Direction`](crate::Direction) picks the strategy that makes that true for
//! the requested page.

use crate::ordering::{NullsOrder, SortDirection};
use crate::sql::Expr;

/// Whether later rows hold greater or smaller values of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tendency {
   /// Later rows are greater: `col > val`.
   Growing,
   /// Later rows are smaller: `col < val`.
   Falling,
}

impl Tendency {
   /// Rows strictly after `value` on this column alone.
   pub fn comparison_predicate(self, column: Expr, value: Expr) -> Expr {
      match self {
         Tendency::Growing => column.gt(value),
         Tendency::Falling => column.lt(value),
      }
   }

   /// One position of a tuple comparison:
   /// `(col = val AND nested) OR col <op> val`.
   ///
   /// Either the column ties with the anchor and the remaining columns
   /// decide, or the column decides alone.
   pub fn non_nullable_predicate(self, column: Expr, value: Expr, nested: Expr) -> Expr {
      let tie = column.clone().equals(value.clone()).and(nested);
      Expr::Or(vec![tie, self.comparison_predicate(column, value)])
   }

   /// The ORDER BY direction that fetches rows in this tendency's order.
   pub fn sort_direction(self) -> SortDirection {
      match self {
         Tendency::Growing => SortDirection::Asc,
         Tendency::Falling => SortDirection::Desc,
      }
   }
}

/// Where NULLs sit relative to non-NULL values in fetch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NullsStrategy {
   First,
   Last,
}

impl NullsStrategy {
   /// Predicate for an anchor whose value in this column is NULL.
   ///
   /// - `First`: `(col IS NULL AND nested) OR col IS NOT NULL`; every
   ///   non-NULL row already comes after a NULL anchor.
   /// - `Last`: `col IS NULL AND nested`; only other NULL rows can follow.
   pub fn if_null(self, column: Expr, nested: Expr) -> Expr {
      let tie = column.clone().is_null().and(nested);
      match self {
         NullsStrategy::First => Expr::Or(vec![tie, column.is_not_null()]),
         NullsStrategy::Last => tie,
      }
   }

   /// Predicate for an anchor with a non-NULL value in this column.
   ///
   /// - `First`: the ordinary tuple position; NULL rows sort before the
   ///   anchor and are excluded by the comparison anyway.
   /// - `Last`: the ordinary tuple position, plus every NULL row.
   pub fn if_not_null(self, tendency: Tendency, column: Expr, value: Expr, nested: Expr) -> Expr {
      match self {
         NullsStrategy::First => tendency.non_nullable_predicate(column, value, nested),
         NullsStrategy::Last => Expr::Or(vec![
            tendency.non_nullable_predicate(column.clone(), value, nested),
            column.is_null(),
         ]),
      }
   }

   /// The ORDER BY NULLS placement matching this strategy.
   pub fn nulls_order(self) -> NullsOrder {
      match self {
         NullsStrategy::First => NullsOrder::First,
         NullsStrategy::Last => NullsOrder::Last,
      }
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   fn col() -> Expr {
      Expr::column("score")
   }

   fn val() -> Expr {
      Expr::raw("7")
   }

   fn nested() -> Expr {
      Expr::column("id").gt(Expr::raw("3"))
   }

   #[test]
   fn comparison_predicate() {
      assert_eq!(
         Tendency::Growing.comparison_predicate(col(), val()).to_sql().0,
         r#""score" > 7"#
      );
      assert_eq!(
         Tendency::Falling.comparison_predicate(col(), val()).to_sql().0,
         r#""score" < 7"#
      );
   }

   #[test]
   fn non_nullable_predicate() {
      let expr = Tendency::Falling.non_nullable_predicate(col(), val(), nested());
      assert_eq!(
         expr.to_sql().0,
         r#"("score" = 7 AND "id" > 3) OR "score" < 7"#
      );
   }

   #[test]
   fn nulls_first_if_null() {
      let expr = NullsStrategy::First.if_null(col(), nested());
      assert_eq!(
         expr.to_sql().0,
         r#"("score" IS NULL AND "id" > 3) OR "score" IS NOT NULL"#
      );
   }

   #[test]
   fn nulls_last_if_null() {
      let expr = NullsStrategy::Last.if_null(col(), nested());
      assert_eq!(expr.to_sql().0, r#""score" IS NULL AND "id" > 3"#);
   }

   #[test]
   fn nulls_first_if_not_null_is_plain_tuple_position() {
      let expr = NullsStrategy::First.if_not_null(Tendency::Growing, col(), val(), nested());
      assert_eq!(
         expr,
         Tendency::Growing.non_nullable_predicate(col(), val(), nested())
      );
   }

   #[test]
   fn nulls_last_if_not_null_adds_null_rows() {
      let expr = NullsStrategy::Last.if_not_null(Tendency::Growing, col(), val(), nested());
      assert_eq!(
         expr.to_sql().0,
         r#"(("score" = 7 AND "id" > 3) OR "score" > 7) OR "score" IS NULL"#
      );
   }

   #[test]
   fn order_mapping() {
      assert_eq!(Tendency::Growing.sort_direction(), SortDirection::Asc);
      assert_eq!(Tendency::Falling.sort_direction(), SortDirection::Desc);
      assert_eq!(NullsStrategy::First.nulls_order(), NullsOrder::First);
      assert_eq!(NullsStrategy::Last.nulls_order(), NullsOrder::Last);
   }
}
