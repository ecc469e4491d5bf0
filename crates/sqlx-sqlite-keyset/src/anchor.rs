//! Anchor binding: turning a caller's keyset into values the predicate can
//! compare against.
//!
//! A keyset does not have to carry every ordering column. Keys it supplies
//! become bound parameters; keys it leaves out are read from the anchor row
//! itself through a one-row subquery located by the primary key:
//!
//! ```text
//! WITH "keyset_anchor_5score" AS (
//!    SELECT "posts"."score" AS "score" FROM "posts" WHERE "posts"."id" = $1 LIMIT 1
//! )
//! ... "posts"."score" < (SELECT "score" FROM "keyset_anchor_5score") ...
//! ```

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::ordering::OrderingSpecification;
use crate::relation::{Relation, Source};
use crate::sql::Expr;

/// Caller-supplied anchor values keyed by ordering column key.
pub type Keyset = IndexMap<String, JsonValue>;

/// Where the anchor value of one ordering column comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum AnchorAttribute {
   /// Supplied by the keyset (possibly as an explicit NULL).
   Literal {
      key: String,
      value: JsonValue,
      primary_key: bool,
   },
   /// Read from the anchor row through the lookup subquery `lookup`.
   Selector { key: String, lookup: String },
}

impl AnchorAttribute {
   pub fn key(&self) -> &str {
      match self {
         AnchorAttribute::Literal { key, .. } | AnchorAttribute::Selector { key, .. } => key,
      }
   }

   /// The expression standing for the anchor's value.
   pub fn rvalue(&self) -> Expr {
      match self {
         AnchorAttribute::Literal { value, .. } => Expr::Value(value.clone()),
         AnchorAttribute::Selector { key, lookup } => Expr::ScalarSubquery {
            column: key.clone(),
            source: lookup.clone(),
         },
      }
   }

   /// The literal value, if this anchor value is known up front.
   pub fn literal(&self) -> Option<&JsonValue> {
      match self {
         AnchorAttribute::Literal { value, .. } => Some(value),
         AnchorAttribute::Selector { .. } => None,
      }
   }
}

/// A named one-row subquery reading the anchor row's missing values.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorLookup {
   name: String,
   relation: Relation,
}

impl AnchorLookup {
   pub fn name(&self) -> &str {
      &self.name
   }

   pub fn relation(&self) -> &Relation {
      &self.relation
   }

   /// Attach this lookup to `relation` as a `WITH` entry.
   pub fn attach_to(self, relation: Relation) -> Relation {
      relation.with(self.name, self.relation)
   }
}

/// Anchor values for every ordering column, in declared order.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorBinding {
   attributes: IndexMap<String, AnchorAttribute>,
   lookup: Option<AnchorLookup>,
}

impl AnchorBinding {
   /// Bind `keyset` against the ordering of `source`.
   ///
   /// Returns `None` when the keyset does not identify an anchor row (a
   /// primary-key value is missing or NULL).
   pub fn bind(spec: &OrderingSpecification, keyset: &Keyset, source: &Source) -> Option<Self> {
      if !spec.identifies_anchor(keyset) {
         return None;
      }

      let selectors: Vec<&str> = spec
         .columns()
         .iter()
         .map(|c| c.key())
         .filter(|key| !keyset.contains_key(*key))
         .collect();
      let lookup_name = anchor_lookup_name(&selectors);

      let attributes = spec
         .columns()
         .iter()
         .map(|column| {
            let key = column.key().to_string();
            let attribute = match keyset.get(column.key()) {
               Some(value) => AnchorAttribute::Literal {
                  key: key.clone(),
                  value: value.clone(),
                  primary_key: column.is_primary_key(),
               },
               None => AnchorAttribute::Selector {
                  key: key.clone(),
                  lookup: lookup_name.clone(),
               },
            };
            (key, attribute)
         })
         .collect();

      let lookup = (!selectors.is_empty()).then(|| {
         let handle = source.handle();
         let mut relation = Relation::from_source(source.clone());

         for column in spec.columns() {
            if !keyset.contains_key(column.key()) {
               relation = relation.select_as(column.attr(handle), column.key());
            }
         }
         for column in spec.primary_keys() {
            if let Some(value) = keyset.get(column.key()) {
               relation = relation.filter(column.attr(handle).equals(Expr::Value(value.clone())));
            }
         }

         AnchorLookup {
            name: lookup_name,
            relation: relation.limit(1),
         }
      });

      Some(Self { attributes, lookup })
   }

   pub fn attribute(&self, key: &str) -> Option<&AnchorAttribute> {
      self.attributes.get(key)
   }

   pub(crate) fn attribute_at(&self, index: usize) -> Option<&AnchorAttribute> {
      self.attributes.get_index(index).map(|(_, a)| a)
   }

   pub fn attributes(&self) -> impl Iterator<Item = &AnchorAttribute> {
      self.attributes.values()
   }

   /// The anchor value expression for `key`.
   pub fn rvalue(&self, key: &str) -> Option<Expr> {
      self.attribute(key).map(AnchorAttribute::rvalue)
   }

   pub fn lookup(&self) -> Option<&AnchorLookup> {
      self.lookup.as_ref()
   }

   pub fn into_lookup(self) -> Option<AnchorLookup> {
      self.lookup
   }
}

/// Name of the lookup subquery for an ordered list of selector keys.
///
/// Each key is length-prefixed so distinct key lists never share a name.
pub fn anchor_lookup_name(keys: &[&str]) -> String {
   let parts: Vec<String> = keys.iter().map(|key| format!("{}{key}", key.len())).collect();
   format!("keyset_anchor_{}", parts.join("_"))
}

#[cfg(test)]
mod tests {
   use super::*;
   use crate::ordering::ColumnSpec;
   use crate::sql::TableRef;
   use serde_json::json;

   fn spec() -> OrderingSpecification {
      OrderingSpecification::new(vec![
         ColumnSpec::asc("category"),
         ColumnSpec::desc("score").nulls_last(),
         ColumnSpec::asc("id").primary_key(),
      ])
      .unwrap()
   }

   fn posts() -> Source {
      Source::Table(TableRef::new("posts"))
   }

   fn keyset(pairs: &[(&str, JsonValue)]) -> Keyset {
      pairs
         .iter()
         .map(|(k, v)| (k.to_string(), v.clone()))
         .collect()
   }

   #[test]
   fn full_keyset_needs_no_lookup() {
      let binding = AnchorBinding::bind(
         &spec(),
         &keyset(&[
            ("category", json!("tech")),
            ("score", JsonValue::Null),
            ("id", json!(7)),
         ]),
         &posts(),
      )
      .unwrap();

      assert!(binding.lookup().is_none());
      assert!(binding
         .attributes()
         .all(|a| matches!(a, AnchorAttribute::Literal { .. })));
      assert_eq!(binding.rvalue("score"), Some(Expr::Value(JsonValue::Null)));
      assert!(matches!(
         binding.attribute("id"),
         Some(AnchorAttribute::Literal {
            primary_key: true,
            ..
         })
      ));
   }

   #[test]
   fn missing_primary_key_disables_binding() {
      let result = AnchorBinding::bind(&spec(), &keyset(&[("category", json!("tech"))]), &posts());
      assert!(result.is_none());

      let result = AnchorBinding::bind(&spec(), &keyset(&[("id", JsonValue::Null)]), &posts());
      assert!(result.is_none());
   }

   #[test]
   fn absent_keys_become_selectors() {
      let binding = AnchorBinding::bind(&spec(), &keyset(&[("id", json!(7))]), &posts()).unwrap();

      let lookup = binding.lookup().unwrap();
      assert_eq!(lookup.name(), "keyset_anchor_8category_5score");

      assert_eq!(
         binding.attribute("score"),
         Some(&AnchorAttribute::Selector {
            key: "score".into(),
            lookup: "keyset_anchor_8category_5score".into(),
         })
      );
      assert_eq!(
         binding.rvalue("score").unwrap().to_sql().0,
         r#"(SELECT "score" FROM "keyset_anchor_8category_5score")"#
      );

      let (sql, values) = lookup.relation().to_sql();
      assert_eq!(
         sql,
         r#"SELECT "posts"."category" AS "category", "posts"."score" AS "score" FROM "posts" WHERE "posts"."id" = $1 LIMIT 1"#
      );
      assert_eq!(values, vec![json!(7)]);
   }

   #[test]
   fn lookup_resolves_against_aliased_source() {
      let source = Source::Table(TableRef::aliased("posts", "p"));
      let binding = AnchorBinding::bind(
         &spec(),
         &keyset(&[("category", json!("tech")), ("id", json!(7))]),
         &source,
      )
      .unwrap();

      assert_eq!(
         binding.into_lookup().unwrap().relation().to_sql().0,
         r#"SELECT "p"."score" AS "score" FROM "posts" AS "p" WHERE "p"."id" = $1 LIMIT 1"#
      );
   }

   #[test]
   fn lookup_name_is_deterministic_and_injective() {
      assert_eq!(anchor_lookup_name(&["score"]), "keyset_anchor_5score");
      assert_eq!(
         anchor_lookup_name(&["score", "category"]),
         anchor_lookup_name(&["score", "category"])
      );
      assert_ne!(anchor_lookup_name(&["a_b", "c"]), anchor_lookup_name(&["a", "b_c"]));
      assert_ne!(anchor_lookup_name(&["ab"]), anchor_lookup_name(&["a", "b"]));
      assert_eq!(
         anchor_lookup_name(&["category", "score"]),
         "keyset_anchor_8category_5score"
      );
   }

   #[test]
   fn attach_to_adds_with_entry() {
      let binding = AnchorBinding::bind(&spec(), &keyset(&[("id", json!(7))]), &posts()).unwrap();
      let relation = binding
         .into_lookup()
         .unwrap()
         .attach_to(Relation::table("posts"));

      assert_eq!(relation.named_subqueries().len(), 1);
      assert!(relation
         .to_sql()
         .0
         .starts_with(r#"WITH "keyset_anchor_8category_5score" AS (SELECT"#));
   }
}
