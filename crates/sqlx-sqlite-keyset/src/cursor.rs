use serde::{Deserialize, Serialize};

use crate::anchor::Keyset;
use crate::direction::Direction;
use crate::fetch::Row;

/// A resumable page position.
///
/// Serializes as `{"direction": "after", "limit": 20, "keyset": {...}}`. How
/// it is encoded for transport (base64, signed token, query string) is up to
/// the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cursor {
   pub direction: Direction,
   pub limit: usize,
   pub keyset: Keyset,
}

impl Cursor {
   pub fn after(keyset: Keyset, limit: usize) -> Self {
      Self {
         direction: Direction::After,
         limit,
         keyset,
      }
   }

   pub fn before(keyset: Keyset, limit: usize) -> Self {
      Self {
         direction: Direction::Before,
         limit,
         keyset,
      }
   }
}

/// Result of a keyset-paginated query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeysetPage {
   /// The rows in this page, in display order.
   pub rows: Vec<Row>,
   /// Cursor continuing in the same direction, present when `has_more`.
   pub next_cursor: Option<Cursor>,
   /// Whether more rows lie beyond this page in the requested direction.
   pub has_more: bool,
}
