//! Paging direction relative to an anchor row.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;
use crate::anchor::Keyset;
use crate::ordering::{NullsOrder, SortDirection};
use crate::tendency::{NullsStrategy, Tendency};
use crate::window::WindowedKeysets;

/// Which side of the anchor row a page lies on.
///
/// `Before` pages are fetched in the reverse of display order so a LIMIT
/// picks the rows nearest the anchor. Every tendency and NULL placement is
/// inverted for them, keeping the predicate phrased as "after the anchor in
/// fetch order".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
   Before,
   After,
}

struct Strategies {
   asc: Tendency,
   desc: Tendency,
   nulls_first: NullsStrategy,
   nulls_last: NullsStrategy,
   reverse_fetch: bool,
}

const AFTER: Strategies = Strategies {
   asc: Tendency::Growing,
   desc: Tendency::Falling,
   nulls_first: NullsStrategy::First,
   nulls_last: NullsStrategy::Last,
   reverse_fetch: false,
};

const BEFORE: Strategies = Strategies {
   asc: Tendency::Falling,
   desc: Tendency::Growing,
   nulls_first: NullsStrategy::Last,
   nulls_last: NullsStrategy::First,
   reverse_fetch: true,
};

impl Direction {
   fn strategies(self) -> &'static Strategies {
      match self {
         Direction::After => &AFTER,
         Direction::Before => &BEFORE,
      }
   }

   /// The comparison strategy for a column declared with `direction`.
   pub fn tendency(self, direction: SortDirection) -> Tendency {
      match direction {
         SortDirection::Asc => self.strategies().asc,
         SortDirection::Desc => self.strategies().desc,
      }
   }

   /// The NULL strategy for a column declared with `nulls`, or `None` for
   /// columns without a NULL policy.
   pub fn nulls(self, nulls: NullsOrder) -> Option<NullsStrategy> {
      match nulls {
         NullsOrder::Default => None,
         NullsOrder::First => Some(self.strategies().nulls_first),
         NullsOrder::Last => Some(self.strategies().nulls_last),
      }
   }

   /// Whether rows come back in the reverse of display order.
   pub fn reverses_fetch_order(self) -> bool {
      self.strategies().reverse_fetch
   }

   pub fn opposite(self) -> Self {
      match self {
         Direction::Before => Direction::After,
         Direction::After => Direction::Before,
      }
   }

   /// Window over a batch of anchor snapshots fetched in this direction.
   ///
   /// `After` windows need `last`, the anchor the batch was fetched from;
   /// it answers a jump of one page. `Before` windows ignore it.
   pub fn keysets(self, batch: Vec<Keyset>, last: Option<Keyset>) -> Result<WindowedKeysets, Error> {
      match self {
         Direction::Before => Ok(WindowedKeysets::before(batch)),
         Direction::After => last
            .map(|last| WindowedKeysets::after(batch, last))
            .ok_or(Error::MissingWindowAnchor),
      }
   }
}

impl FromStr for Direction {
   type Err = Error;

   fn from_str(token: &str) -> Result<Self, Self::Err> {
      match token.to_ascii_lowercase().as_str() {
         "before" => Ok(Direction::Before),
         "after" => Ok(Direction::After),
         _ => Err(Error::UnsupportedToken {
            kind: "direction",
            token: token.to_string(),
         }),
      }
   }
}

impl fmt::Display for Direction {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(match self {
         Direction::Before => "before",
         Direction::After => "after",
      })
   }
}
