//! A minimal SELECT builder.
//!
//! [`Relation`] covers what keyset pagination needs from a query: a root
//! table (or subquery), joins, filters, ordering, a limit, projections, named
//! auxiliary subqueries (`WITH`) and correlation through [`Expr::exists`].
//!
//! ```
//! use sqlx_sqlite_keyset::{Expr, Relation, TableRef};
//!
//! let posts = TableRef::aliased("posts", "p");
//! let relation = Relation::from(posts.clone())
//!    .filter(posts.column("category").equals(Expr::value("tech")))
//!    .limit(10);
//!
//! let (sql, values) = relation.to_sql();
//! assert_eq!(
//!    sql,
//!    r#"SELECT * FROM "posts" AS "p" WHERE "p"."category" = $1 LIMIT 10"#
//! );
//! assert_eq!(values.len(), 1);
//! ```

use serde_json::Value as JsonValue;

use crate::ordering::{NullsOrder, SortDirection};
use crate::sql::{Expr, SqlWriter, TableRef, quote_identifier};

/// What a relation selects from.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
   Table(TableRef),
   Subquery {
      relation: Box<Relation>,
      alias: String,
   },
}

impl Source {
   /// The name used to qualify columns of this source.
   pub fn handle(&self) -> &str {
      match self {
         Source::Table(table) => table.handle(),
         Source::Subquery { alias, .. } => alias,
      }
   }

   fn render(&self, out: &mut SqlWriter) {
      match self {
         Source::Table(table) => table.render(out),
         Source::Subquery { relation, alias } => {
            out.push("(");
            relation.render(out);
            out.push(") AS ");
            out.push(&quote_identifier(alias));
         }
      }
   }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
   Inner,
   Left,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
   pub kind: JoinKind,
   pub table: TableRef,
   pub on: Expr,
}

/// One item of the SELECT list.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
   /// `*`, or `"handle".*` when qualified.
   All(Option<String>),
   Expr { expr: Expr, alias: Option<String> },
}

impl Projection {
   fn alias(&self) -> Option<&str> {
      match self {
         Projection::Expr { alias, .. } => alias.as_deref(),
         Projection::All(_) => None,
      }
   }

   fn render(&self, out: &mut SqlWriter) {
      match self {
         Projection::All(None) => out.push("*"),
         Projection::All(Some(handle)) => {
            out.push(&quote_identifier(handle));
            out.push(".*");
         }
         Projection::Expr { expr, alias } => {
            expr.render(out);
            if let Some(alias) = alias {
               out.push(" AS ");
               out.push(&quote_identifier(alias));
            }
         }
      }
   }
}

/// One ORDER BY term.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTerm {
   pub expr: Expr,
   pub direction: SortDirection,
   pub nulls: NullsOrder,
}

impl OrderTerm {
   pub fn new(expr: Expr, direction: SortDirection, nulls: NullsOrder) -> Self {
      Self {
         expr,
         direction,
         nulls,
      }
   }

   fn render(&self, out: &mut SqlWriter) {
      self.expr.render(out);
      out.push(" ");
      out.push(self.direction.as_sql());
      if let Some(nulls) = self.nulls.as_sql() {
         out.push(" ");
         out.push(nulls);
      }
   }
}

/// A named subquery attached with `WITH name AS (...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedSubquery {
   pub name: String,
   pub relation: Relation,
}

/// A SELECT statement under construction. Every method consumes and returns
/// the relation.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
   with: Vec<NamedSubquery>,
   distinct: bool,
   projection: Vec<Projection>,
   source: Source,
   joins: Vec<Join>,
   filters: Vec<Expr>,
   order: Vec<OrderTerm>,
   limit: Option<usize>,
}

impl From<TableRef> for Relation {
   fn from(table: TableRef) -> Self {
      Self::from_source(Source::Table(table))
   }
}

impl Relation {
   /// `SELECT * FROM "table"`
   pub fn table(name: impl Into<String>) -> Self {
      Self::from(TableRef::new(name))
   }

   pub fn from_source(source: Source) -> Self {
      Self {
         with: Vec::new(),
         distinct: false,
         projection: Vec::new(),
         source,
         joins: Vec::new(),
         filters: Vec::new(),
         order: Vec::new(),
         limit: None,
      }
   }

   pub fn from_subquery(relation: Relation, alias: impl Into<String>) -> Self {
      Self::from_source(Source::Subquery {
         relation: Box::new(relation),
         alias: alias.into(),
      })
   }

   // ─── building ───

   /// Attach a named subquery. A second subquery under the same name is
   /// ignored, so repeated attachment embeds it once.
   pub fn with(mut self, name: impl Into<String>, relation: Relation) -> Self {
      let name = name.into();
      if !self.with.iter().any(|w| w.name == name) {
         self.with.push(NamedSubquery { name, relation });
      }
      self
   }

   pub fn distinct(mut self) -> Self {
      self.distinct = true;
      self
   }

   pub fn select(mut self, expr: Expr) -> Self {
      self.projection.push(Projection::Expr { expr, alias: None });
      self
   }

   pub fn select_as(mut self, expr: Expr, alias: impl Into<String>) -> Self {
      self.projection.push(Projection::Expr {
         expr,
         alias: Some(alias.into()),
      });
      self
   }

   /// `SELECT "handle".*`
   pub fn select_all_of(mut self, handle: impl Into<String>) -> Self {
      self.projection.push(Projection::All(Some(handle.into())));
      self
   }

   pub fn join(mut self, kind: JoinKind, table: TableRef, on: Expr) -> Self {
      self.joins.push(Join { kind, table, on });
      self
   }

   pub fn inner_join(self, table: TableRef, on: Expr) -> Self {
      self.join(JoinKind::Inner, table, on)
   }

   pub fn left_join(self, table: TableRef, on: Expr) -> Self {
      self.join(JoinKind::Left, table, on)
   }

   /// Add a filter; filters are combined with AND.
   pub fn filter(mut self, expr: Expr) -> Self {
      self.filters.push(expr);
      self
   }

   pub fn order_by(mut self, term: OrderTerm) -> Self {
      self.order.push(term);
      self
   }

   pub fn order_by_all(mut self, terms: impl IntoIterator<Item = OrderTerm>) -> Self {
      self.order.extend(terms);
      self
   }

   pub fn limit(mut self, limit: usize) -> Self {
      self.limit = Some(limit);
      self
   }

   /// Drop the SELECT list and DISTINCT, keeping everything else.
   pub fn without_projection(mut self) -> Self {
      self.projection.clear();
      self.distinct = false;
      self
   }

   /// Project `expr AS alias` unless something is already projected under
   /// `alias`. An implicit `*` is kept as an explicit item.
   pub(crate) fn ensure_projected(mut self, expr: Expr, alias: &str) -> Self {
      if self.projection.iter().any(|p| p.alias() == Some(alias)) {
         return self;
      }
      if self.projection.is_empty() {
         self.projection.push(Projection::All(None));
      }
      self.select_as(expr, alias)
   }

   // ─── inspection ───

   pub fn source(&self) -> &Source {
      &self.source
   }

   pub fn joins(&self) -> &[Join] {
      &self.joins
   }

   pub fn has_joins(&self) -> bool {
      !self.joins.is_empty()
   }

   pub fn filters(&self) -> &[Expr] {
      &self.filters
   }

   pub fn order(&self) -> &[OrderTerm] {
      &self.order
   }

   pub fn limit_value(&self) -> Option<usize> {
      self.limit
   }

   pub fn named_subqueries(&self) -> &[NamedSubquery] {
      &self.with
   }

   // ─── rendering ───

   /// Render with placeholders starting at `$1`.
   pub fn to_sql(&self) -> (String, Vec<JsonValue>) {
      self.to_sql_with_offset(0)
   }

   /// Render with placeholders starting at `$param_offset + 1`.
   pub fn to_sql_with_offset(&self, param_offset: usize) -> (String, Vec<JsonValue>) {
      let mut out = SqlWriter::new(param_offset);
      self.render(&mut out);
      out.finish()
   }

   pub(crate) fn render(&self, out: &mut SqlWriter) {
      if !self.with.is_empty() {
         out.push("WITH ");
         for (i, named) in self.with.iter().enumerate() {
            if i > 0 {
               out.push(", ");
            }
            out.push(&quote_identifier(&named.name));
            out.push(" AS (");
            named.relation.render(out);
            out.push(")");
         }
         out.push(" ");
      }

      out.push("SELECT ");
      if self.distinct {
         out.push("DISTINCT ");
      }
      if self.projection.is_empty() {
         out.push("*");
      }
      for (i, projection) in self.projection.iter().enumerate() {
         if i > 0 {
            out.push(", ");
         }
         projection.render(out);
      }

      out.push(" FROM ");
      self.source.render(out);

      for join in &self.joins {
         out.push(match join.kind {
            JoinKind::Inner => " INNER JOIN ",
            JoinKind::Left => " LEFT JOIN ",
         });
         join.table.render(out);
         out.push(" ON ");
         join.on.render(out);
      }

      if !self.filters.is_empty() {
         out.push(" WHERE ");
         Expr::And(self.filters.clone()).render(out);
      }

      if !self.order.is_empty() {
         out.push(" ORDER BY ");
         for (i, term) in self.order.iter().enumerate() {
            if i > 0 {
               out.push(", ");
            }
            term.render(out);
         }
      }

      if let Some(limit) = self.limit {
         out.push(&format!(" LIMIT {limit}"));
      }
   }
}

#[cfg(test)]
mod tests {
   use super::*;
   use serde_json::json;

   #[test]
   fn bare_table() {
      assert_eq!(Relation::table("posts").to_sql().0, r#"SELECT * FROM "posts""#);
   }

   #[test]
   fn full_select() {
      let posts = TableRef::new("posts");
      let users = TableRef::aliased("users", "u");
      let relation = Relation::from(posts.clone())
         .select_all_of("posts")
         .select_as(users.column("name"), "author")
         .inner_join(users.clone(), users.column("id").equals(posts.column("user_id")))
         .filter(users.column("active").equals(Expr::value(true)))
         .filter(posts.column("score").gt(Expr::value(10)).or(posts.column("score").is_null()))
         .order_by(OrderTerm::new(
            posts.column("score"),
            SortDirection::Desc,
            NullsOrder::Last,
         ))
         .order_by(OrderTerm::new(
            posts.column("id"),
            SortDirection::Asc,
            NullsOrder::Default,
         ))
         .limit(5);

      let (sql, values) = relation.to_sql();

      assert_eq!(
         sql,
         r#"SELECT "posts".*, "u"."name" AS "author" FROM "posts" INNER JOIN "users" AS "u" ON "u"."id" = "posts"."user_id" WHERE "u"."active" = $1 AND ("posts"."score" > $2 OR "posts"."score" IS NULL) ORDER BY "posts"."score" DESC NULLS LAST, "posts"."id" ASC LIMIT 5"#
      );
      assert_eq!(values, vec![json!(true), json!(10)]);
   }

   #[test]
   fn with_clause_is_rendered_first_and_once() {
      let anchor = Relation::table("posts")
         .select(Expr::column("score"))
         .filter(Expr::column("id").equals(Expr::value(3)))
         .limit(1);

      let relation = Relation::table("posts")
         .with("anchor", anchor.clone())
         .with("anchor", anchor)
         .filter(Expr::column("score").lt(Expr::value(50)));

      let (sql, values) = relation.to_sql();

      assert_eq!(
         sql,
         r#"WITH "anchor" AS (SELECT "score" FROM "posts" WHERE "id" = $1 LIMIT 1) SELECT * FROM "posts" WHERE "score" < $2"#
      );
      assert_eq!(values, vec![json!(3), json!(50)]);
      assert_eq!(relation.named_subqueries().len(), 1);
   }

   #[test]
   fn subquery_source_and_exists() {
      let window = Relation::table("posts")
         .select_as(Expr::qualified("posts", "id"), "id")
         .limit(3);
      let exists = Relation::from_subquery(window, "w")
         .select(Expr::raw("1"))
         .filter(Expr::qualified("w", "id").equals(Expr::qualified("p", "id")));
      let outer = Relation::from(TableRef::aliased("posts", "p")).filter(Expr::exists(exists));

      assert_eq!(
         outer.to_sql().0,
         r#"SELECT * FROM "posts" AS "p" WHERE EXISTS (SELECT 1 FROM (SELECT "posts"."id" AS "id" FROM "posts" LIMIT 3) AS "w" WHERE "w"."id" = "p"."id")"#
      );
   }

   #[test]
   fn ensure_projected_keeps_star_and_skips_existing_alias() {
      let relation = Relation::table("posts")
         .ensure_projected(Expr::qualified("posts", "id"), "id")
         .ensure_projected(Expr::qualified("posts", "id"), "id");

      assert_eq!(
         relation.to_sql().0,
         r#"SELECT *, "posts"."id" AS "id" FROM "posts""#
      );
   }

   #[test]
   fn placeholder_offset() {
      let relation = Relation::table("t").filter(Expr::column("a").equals(Expr::value(1)));
      assert_eq!(
         relation.to_sql_with_offset(2).0,
         r#"SELECT * FROM "t" WHERE "a" = $3"#
      );
   }

   #[test]
   fn distinct_and_left_join() {
      let relation = Relation::table("posts")
         .distinct()
         .select(Expr::qualified("posts", "id"))
         .left_join(
            TableRef::new("tags"),
            Expr::qualified("tags", "post_id").equals(Expr::qualified("posts", "id")),
         );

      assert!(relation.has_joins());
      assert_eq!(
         relation.to_sql().0,
         r#"SELECT DISTINCT "posts"."id" FROM "posts" LEFT JOIN "tags" ON "tags"."post_id" = "posts"."id""#
      );
      assert!(!relation.without_projection().to_sql().0.contains("DISTINCT"));
   }
}
