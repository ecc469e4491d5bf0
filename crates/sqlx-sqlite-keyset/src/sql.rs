//! SQL expression tree and rendering.
//!
//! Predicates are built as [`Expr`] values and only turned into text at the
//! very end, so the same predicate can be compared structurally (the keyset
//! builder is deterministic) and rendered with any placeholder offset.
//!
//! Values never appear inline in the SQL: every [`Expr::Value`] becomes a
//! numbered `$N` placeholder and its JSON value is appended to the bind list
//! in the order placeholders are written.

use serde_json::Value as JsonValue;

use crate::Error;
use crate::relation::Relation;

/// Validate that a name is safe to use as an identifier.
///
/// Accepts names matching `[a-zA-Z_][a-zA-Z0-9_]*`. Table and column names
/// are additionally quoted when rendered, so this is the first of two guards.
pub(crate) fn validate_identifier(name: &str) -> Result<(), Error> {
   let mut chars = name.chars();
   let valid = match chars.next() {
      Some(first) if first.is_ascii_alphabetic() || first == '_' => {
         chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
      }
      _ => false,
   };

   if valid {
      Ok(())
   } else {
      Err(Error::InvalidColumnName {
         name: name.to_string(),
      })
   }
}

/// Quote an identifier with double quotes.
///
/// Any embedded double quotes are doubled per SQL standard (`"` → `""`).
pub(crate) fn quote_identifier(name: &str) -> String {
   format!("\"{}\"", name.replace('"', "\"\""))
}

/// A table in a FROM or JOIN clause, optionally aliased.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
   name: String,
   alias: Option<String>,
}

impl TableRef {
   pub fn new(name: impl Into<String>) -> Self {
      Self {
         name: name.into(),
         alias: None,
      }
   }

   pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
      Self {
         name: name.into(),
         alias: Some(alias.into()),
      }
   }

   pub fn name(&self) -> &str {
      &self.name
   }

   /// The name other clauses use to qualify this table's columns.
   pub fn handle(&self) -> &str {
      self.alias.as_deref().unwrap_or(&self.name)
   }

   /// Shorthand for a column of this table.
   pub fn column(&self, name: impl Into<String>) -> Expr {
      Expr::qualified(self.handle(), name)
   }

   pub(crate) fn render(&self, out: &mut SqlWriter) {
      out.push(&quote_identifier(&self.name));
      if let Some(alias) = &self.alias {
         out.push(" AS ");
         out.push(&quote_identifier(alias));
      }
   }
}

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
   Eq,
   NotEq,
   Gt,
   GtEq,
   Lt,
   LtEq,
}

impl CompareOp {
   fn as_sql(self) -> &'static str {
      match self {
         CompareOp::Eq => "=",
         CompareOp::NotEq => "<>",
         CompareOp::Gt => ">",
         CompareOp::GtEq => ">=",
         CompareOp::Lt => "<",
         CompareOp::LtEq => "<=",
      }
   }
}

/// A SQL scalar or boolean expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
   /// Column reference, optionally qualified by a table handle.
   Column {
      table: Option<String>,
      name: String,
   },
   /// A bound parameter.
   Value(JsonValue),
   /// Constant boolean, rendered as `1`/`0`.
   Bool(bool),
   /// Trusted SQL text, emitted verbatim. Must not contain placeholders.
   Raw(String),
   Compare {
      op: CompareOp,
      lhs: Box<Expr>,
      rhs: Box<Expr>,
   },
   IsNull(Box<Expr>),
   IsNotNull(Box<Expr>),
   And(Vec<Expr>),
   Or(Vec<Expr>),
   /// Explicit parentheses.
   Group(Box<Expr>),
   /// `CASE WHEN condition THEN then ELSE otherwise END`
   Case {
      condition: Box<Expr>,
      then: Box<Expr>,
      otherwise: Box<Expr>,
   },
   /// `(SELECT "column" FROM "source")` against a named subquery.
   ScalarSubquery {
      column: String,
      source: String,
   },
   /// `EXISTS (...)`
   Exists(Box<Relation>),
}

impl Expr {
   pub fn column(name: impl Into<String>) -> Self {
      Expr::Column {
         table: None,
         name: name.into(),
      }
   }

   pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
      Expr::Column {
         table: Some(table.into()),
         name: name.into(),
      }
   }

   pub fn value(value: impl Into<JsonValue>) -> Self {
      Expr::Value(value.into())
   }

   pub fn raw(sql: impl Into<String>) -> Self {
      Expr::Raw(sql.into())
   }

   pub fn exists(relation: Relation) -> Self {
      Expr::Exists(Box::new(relation))
   }

   pub fn compare(self, op: CompareOp, rhs: Expr) -> Self {
      Expr::Compare {
         op,
         lhs: Box::new(self),
         rhs: Box::new(rhs),
      }
   }

   pub fn equals(self, rhs: Expr) -> Self {
      self.compare(CompareOp::Eq, rhs)
   }

   pub fn gt(self, rhs: Expr) -> Self {
      self.compare(CompareOp::Gt, rhs)
   }

   pub fn lt(self, rhs: Expr) -> Self {
      self.compare(CompareOp::Lt, rhs)
   }

   pub fn is_null(self) -> Self {
      Expr::IsNull(Box::new(self))
   }

   pub fn is_not_null(self) -> Self {
      Expr::IsNotNull(Box::new(self))
   }

   pub fn and(self, rhs: Expr) -> Self {
      match self {
         Expr::And(mut parts) => {
            parts.push(rhs);
            Expr::And(parts)
         }
         lhs => Expr::And(vec![lhs, rhs]),
      }
   }

   pub fn or(self, rhs: Expr) -> Self {
      match self {
         Expr::Or(mut parts) => {
            parts.push(rhs);
            Expr::Or(parts)
         }
         lhs => Expr::Or(vec![lhs, rhs]),
      }
   }

   pub fn grouped(self) -> Self {
      Expr::Group(Box::new(self))
   }

   pub fn case(condition: Expr, then: Expr, otherwise: Expr) -> Self {
      Expr::Case {
         condition: Box::new(condition),
         then: Box::new(then),
         otherwise: Box::new(otherwise),
      }
   }

   /// Render as a standalone fragment with placeholders starting at `$1`.
   pub fn to_sql(&self) -> (String, Vec<JsonValue>) {
      let mut out = SqlWriter::new(0);
      self.render(&mut out);
      out.finish()
   }

   pub(crate) fn render(&self, out: &mut SqlWriter) {
      match self {
         Expr::Column { table, name } => {
            if let Some(table) = table {
               out.push(&quote_identifier(table));
               out.push(".");
            }
            out.push(&quote_identifier(name));
         }
         Expr::Value(value) => out.bind(value.clone()),
         Expr::Bool(value) => out.push(if *value { "1" } else { "0" }),
         Expr::Raw(sql) => out.push(sql),
         Expr::Compare { op, lhs, rhs } => {
            lhs.render_operand(out);
            out.push(" ");
            out.push(op.as_sql());
            out.push(" ");
            rhs.render_operand(out);
         }
         Expr::IsNull(inner) => {
            inner.render_operand(out);
            out.push(" IS NULL");
         }
         Expr::IsNotNull(inner) => {
            inner.render_operand(out);
            out.push(" IS NOT NULL");
         }
         Expr::And(parts) => render_connective(out, parts, " AND "),
         Expr::Or(parts) => render_connective(out, parts, " OR "),
         Expr::Group(inner) => {
            out.push("(");
            inner.render(out);
            out.push(")");
         }
         Expr::Case {
            condition,
            then,
            otherwise,
         } => {
            out.push("CASE WHEN ");
            condition.render(out);
            out.push(" THEN ");
            then.render(out);
            out.push(" ELSE ");
            otherwise.render(out);
            out.push(" END");
         }
         Expr::ScalarSubquery { column, source } => {
            out.push("(SELECT ");
            out.push(&quote_identifier(column));
            out.push(" FROM ");
            out.push(&quote_identifier(source));
            out.push(")");
         }
         Expr::Exists(relation) => {
            out.push("EXISTS (");
            relation.render(out);
            out.push(")");
         }
      }
   }

   /// Operands of comparisons and null tests get parentheses when they are
   /// themselves compound.
   fn render_operand(&self, out: &mut SqlWriter) {
      if self.is_compound() {
         out.push("(");
         self.render(out);
         out.push(")");
      } else {
         self.render(out);
      }
   }

   fn is_compound(&self) -> bool {
      matches!(
         self,
         Expr::Compare { .. }
            | Expr::IsNull(_)
            | Expr::IsNotNull(_)
            | Expr::And(_)
            | Expr::Or(_)
            | Expr::Case { .. }
      )
   }
}

fn render_connective(out: &mut SqlWriter, parts: &[Expr], separator: &str) {
   if parts.is_empty() {
      // Empty AND is true, empty OR is false.
      out.push(if separator == " AND " { "1" } else { "0" });
      return;
   }

   for (i, part) in parts.iter().enumerate() {
      if i > 0 {
         out.push(separator);
      }
      if matches!(part, Expr::And(_) | Expr::Or(_) | Expr::Case { .. }) {
         out.push("(");
         part.render(out);
         out.push(")");
      } else {
         part.render(out);
      }
   }
}

/// Accumulates SQL text and the bind values for its placeholders.
///
/// Placeholders are numbered `$N` starting from `param_offset + 1`, so a
/// fragment can be appended after caller SQL that already uses `$1..$offset`.
#[derive(Debug)]
pub(crate) struct SqlWriter {
   sql: String,
   values: Vec<JsonValue>,
   param_offset: usize,
}

impl SqlWriter {
   pub(crate) fn new(param_offset: usize) -> Self {
      Self {
         sql: String::new(),
         values: Vec::new(),
         param_offset,
      }
   }

   pub(crate) fn push(&mut self, sql: &str) {
      self.sql.push_str(sql);
   }

   pub(crate) fn bind(&mut self, value: JsonValue) {
      self.values.push(value);
      self.sql.push_str(&format!("${}", self.param_offset + self.values.len()));
   }

   pub(crate) fn finish(self) -> (String, Vec<JsonValue>) {
      (self.sql, self.values)
   }
}

#[cfg(test)]
mod tests {
   use super::*;
   use serde_json::json;

   // ─── identifiers ───

   #[test]
   fn identifier_valid() {
      assert!(validate_identifier("id").is_ok());
      assert!(validate_identifier("_private").is_ok());
      assert!(validate_identifier("col_123").is_ok());
   }

   #[test]
   fn identifier_rejects_injection() {
      assert!(validate_identifier("").is_err());
      assert!(validate_identifier("id; DROP TABLE posts --").is_err());
      assert!(validate_identifier("1bad").is_err());
      assert!(validate_identifier("col name").is_err());
      assert!(validate_identifier("t.id").is_err());
   }

   #[test]
   fn quote_identifier_doubles_quotes() {
      assert_eq!(quote_identifier("id"), r#""id""#);
      assert_eq!(quote_identifier(r#"we"ird"#), r#""we""ird""#);
   }

   // ─── rendering ───

   #[test]
   fn comparison_binds_values_in_order() {
      let expr = Expr::qualified("posts", "score")
         .gt(Expr::value(10))
         .and(Expr::column("title").equals(Expr::value("x")));

      let (sql, values) = expr.to_sql();

      assert_eq!(sql, r#""posts"."score" > $1 AND "title" = $2"#);
      assert_eq!(values, vec![json!(10), json!("x")]);
   }

   #[test]
   fn nested_connectives_are_parenthesized() {
      let expr = Expr::column("a")
         .equals(Expr::value(1))
         .and(Expr::column("b").gt(Expr::value(2)).or(Expr::column("b").is_null()))
         .or(Expr::column("a").gt(Expr::value(1)));

      let (sql, _) = expr.to_sql();

      assert_eq!(
         sql,
         r#"("a" = $1 AND ("b" > $2 OR "b" IS NULL)) OR "a" > $3"#
      );
   }

   #[test]
   fn case_and_scalar_subquery() {
      let anchor = Expr::ScalarSubquery {
         column: "score".into(),
         source: "anchor".into(),
      };
      let expr = Expr::case(
         anchor.clone().is_null(),
         Expr::column("score").is_not_null(),
         Expr::column("score").lt(anchor),
      );

      let (sql, values) = expr.to_sql();

      assert_eq!(
         sql,
         r#"CASE WHEN (SELECT "score" FROM "anchor") IS NULL THEN "score" IS NOT NULL ELSE "score" < (SELECT "score" FROM "anchor") END"#
      );
      assert!(values.is_empty());
   }

   #[test]
   fn placeholder_offset() {
      let mut out = SqlWriter::new(2);
      Expr::column("id").gt(Expr::value(5)).render(&mut out);

      let (sql, values) = out.finish();

      assert_eq!(sql, r#""id" > $3"#);
      assert_eq!(values, vec![json!(5)]);
   }

   #[test]
   fn empty_connectives() {
      assert_eq!(Expr::And(vec![]).to_sql().0, "1");
      assert_eq!(Expr::Or(vec![]).to_sql().0, "0");
   }

   #[test]
   fn aliased_table() {
      let table = TableRef::aliased("posts", "p");
      let mut out = SqlWriter::new(0);
      table.render(&mut out);

      assert_eq!(out.finish().0, r#""posts" AS "p""#);
      assert_eq!(table.handle(), "p");
      assert_eq!(table.column("id"), Expr::qualified("p", "id"));
   }
}
