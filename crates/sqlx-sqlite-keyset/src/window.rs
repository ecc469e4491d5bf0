//! Page jumps over a pre-fetched batch of anchor snapshots.
//!
//! One fetch of roughly `max_jump × limit` rows past an anchor is enough to
//! answer "jump N pages" for any N up to `max_jump` with index arithmetic,
//! distinguishing a genuine page, a page that collapses to the boundary
//! (first) page, and a page that does not exist.

use std::fmt;

use crate::Error;
use crate::anchor::Keyset;
use crate::direction::Direction;

/// Applied to every snapshot taken from the batch before it is returned.
pub type KeysetTransform = Box<dyn Fn(&Keyset) -> Keyset + Send + Sync>;

/// The outcome of a page jump.
#[derive(Debug, Clone, PartialEq)]
pub enum PageJump {
   /// The jump lands past the data.
   NoSuchPage,
   /// The jump lands on the boundary page; fetch it without a cursor.
   Boundary,
   /// Fetch the page relative to this anchor.
   Anchor(Keyset),
}

impl PageJump {
   pub fn anchor(&self) -> Option<&Keyset> {
      match self {
         PageJump::Anchor(keyset) => Some(keyset),
         _ => None,
      }
   }
}

/// A batch of anchor snapshots in fetch order, nearest to the anchor first.
///
/// A `before` batch starts with the anchor of the current page, so jump 0
/// returns it.
///
/// Built per request through [`Direction::keysets`] or
/// [`DatabaseWrapper::fetch_window`](crate::DatabaseWrapper::fetch_window)
/// and dropped afterwards.
pub struct WindowedKeysets {
   direction: Direction,
   batch: Vec<Keyset>,
   last: Option<Keyset>,
   transform: Option<KeysetTransform>,
}

impl WindowedKeysets {
   pub(crate) fn before(batch: Vec<Keyset>) -> Self {
      Self {
         direction: Direction::Before,
         batch,
         last: None,
         transform: None,
      }
   }

   pub(crate) fn after(batch: Vec<Keyset>, last: Keyset) -> Self {
      Self {
         direction: Direction::After,
         batch,
         last: Some(last),
         transform: None,
      }
   }

   /// Transform snapshots taken from the batch (the stored `last` anchor is
   /// returned as is).
   pub fn with_transform(mut self, transform: impl Fn(&Keyset) -> Keyset + Send + Sync + 'static) -> Self {
      self.transform = Some(Box::new(transform));
      self
   }

   pub fn direction(&self) -> Direction {
      self.direction
   }

   pub fn batch(&self) -> &[Keyset] {
      &self.batch
   }

   pub fn len(&self) -> usize {
      self.batch.len()
   }

   pub fn is_empty(&self) -> bool {
      self.batch.is_empty()
   }

   /// Resolve a jump of `delta` pages of `limit` rows.
   ///
   /// `Before` accepts `delta >= 0`, `After` accepts `delta >= 1`.
   pub fn page(&self, delta: i64, limit: usize) -> Result<PageJump, Error> {
      if limit == 0 {
         return Err(Error::InvalidPageSize);
      }

      let min_delta = match self.direction {
         Direction::Before => 0,
         Direction::After => 1,
      };
      if delta < min_delta {
         return Err(Error::InvalidPageDelta {
            direction: self.direction,
            delta,
         });
      }

      // Non-negative after the check above.
      let delta = delta.unsigned_abs() as usize;

      Ok(match self.direction {
         Direction::Before => self.page_before(delta, limit),
         Direction::After => self.page_after(delta, limit),
      })
   }

   fn page_before(&self, delta: usize, limit: usize) -> PageJump {
      if delta == 0 {
         return self
            .batch
            .first()
            .map_or(PageJump::NoSuchPage, |k| PageJump::Anchor(self.apply(k)));
      }

      let Some(shift) = delta.checked_mul(limit) else {
         return PageJump::NoSuchPage;
      };

      // diff = len - shift; a genuine page needs more than `limit` snapshots
      // from the shift on, otherwise it collapses to the boundary page.
      let len = self.batch.len();
      if shift < len && len - shift > limit {
         PageJump::Anchor(self.apply(&self.batch[shift]))
      } else if shift < len || shift - len < limit {
         PageJump::Boundary
      } else {
         PageJump::NoSuchPage
      }
   }

   fn page_after(&self, delta: usize, limit: usize) -> PageJump {
      if self.batch.is_empty() {
         return PageJump::NoSuchPage;
      }

      let Some(shift) = (delta - 1).checked_mul(limit) else {
         return PageJump::NoSuchPage;
      };

      if shift == 0 {
         return self
            .last
            .clone()
            .map_or(PageJump::NoSuchPage, PageJump::Anchor);
      }

      if shift >= self.batch.len() {
         PageJump::NoSuchPage
      } else {
         PageJump::Anchor(self.apply(&self.batch[shift - 1]))
      }
   }

   fn apply(&self, keyset: &Keyset) -> Keyset {
      match &self.transform {
         Some(transform) => transform(keyset),
         None => keyset.clone(),
      }
   }
}

impl fmt::Debug for WindowedKeysets {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("WindowedKeysets")
         .field("direction", &self.direction)
         .field("batch", &self.batch)
         .field("last", &self.last)
         .field("transform", &self.transform.is_some())
         .finish()
   }
}

#[cfg(test)]
mod tests {
   use super::*;
   use serde_json::json;

   fn snapshot(name: &str) -> Keyset {
      Keyset::from([("id".to_string(), json!(name))])
   }

   fn batch(names: &[&str]) -> Vec<Keyset> {
      names.iter().map(|n| snapshot(n)).collect()
   }

   fn anchor(name: &str) -> PageJump {
      PageJump::Anchor(snapshot(name))
   }

   fn before() -> WindowedKeysets {
      Direction::Before
         .keysets(batch(&["a", "b", "c", "d", "e"]), None)
         .unwrap()
   }

   fn after() -> WindowedKeysets {
      Direction::After
         .keysets(batch(&["a", "b", "c", "d", "e"]), Some(snapshot("L")))
         .unwrap()
   }

   // ─── Before ───

   #[test]
   fn before_zero_is_nearest_snapshot() {
      assert_eq!(before().page(0, 2).unwrap(), anchor("a"));
   }

   #[test]
   fn before_genuine_page() {
      // shift = 2, diff = 3
      assert_eq!(before().page(1, 2).unwrap(), anchor("c"));
   }

   #[test]
   fn before_collapses_to_boundary() {
      // shift = 4, diff = 1
      assert_eq!(before().page(2, 2).unwrap(), PageJump::Boundary);
      // shift = 6, diff = -1
      assert_eq!(before().page(3, 2).unwrap(), PageJump::Boundary);
   }

   #[test]
   fn before_past_the_data() {
      // shift = 8, diff = -3
      assert_eq!(before().page(4, 2).unwrap(), PageJump::NoSuchPage);
   }

   #[test]
   fn before_exact_multiple_of_limit() {
      let window = Direction::Before
         .keysets(batch(&["a", "b", "c", "d"]), None)
         .unwrap();

      // shift = 2, diff = 2 == limit: collapses to the boundary page
      assert_eq!(window.page(1, 2).unwrap(), PageJump::Boundary);
      // shift = 4, diff = 0
      assert_eq!(window.page(2, 2).unwrap(), PageJump::Boundary);
      // shift = 6, diff = -2 == -limit: nothing left
      assert_eq!(window.page(3, 2).unwrap(), PageJump::NoSuchPage);
   }

   #[test]
   fn before_empty_batch() {
      let window = Direction::Before.keysets(vec![], None).unwrap();

      assert_eq!(window.page(0, 2).unwrap(), PageJump::NoSuchPage);
      assert_eq!(window.page(1, 2).unwrap(), PageJump::NoSuchPage);
      assert_eq!(window.page(1, 3).unwrap(), PageJump::NoSuchPage);
   }

   #[test]
   fn before_rejects_negative_delta() {
      let err = before().page(-1, 2).unwrap_err();
      assert!(matches!(
         err,
         Error::InvalidPageDelta {
            direction: Direction::Before,
            delta: -1
         }
      ));
   }

   // ─── After ───

   #[test]
   fn after_one_page_is_last() {
      assert_eq!(after().page(1, 2).unwrap(), anchor("L"));
   }

   #[test]
   fn after_genuine_page() {
      // shift = 2, diff = 3
      assert_eq!(after().page(2, 2).unwrap(), anchor("b"));
      // shift = 4, diff = 1
      assert_eq!(after().page(3, 2).unwrap(), anchor("d"));
   }

   #[test]
   fn after_past_the_data() {
      // shift = 6, diff = -1
      assert_eq!(after().page(4, 2).unwrap(), PageJump::NoSuchPage);
   }

   #[test]
   fn after_shift_equal_to_batch_length() {
      let window = Direction::After
         .keysets(batch(&["a", "b", "c", "d"]), Some(snapshot("L")))
         .unwrap();

      // shift = 2, diff = 2
      assert_eq!(window.page(2, 2).unwrap(), anchor("b"));
      // shift = 4, diff = 0
      assert_eq!(window.page(3, 2).unwrap(), PageJump::NoSuchPage);
   }

   #[test]
   fn after_empty_batch() {
      let window = Direction::After
         .keysets(vec![], Some(snapshot("L")))
         .unwrap();
      assert_eq!(window.page(1, 2).unwrap(), PageJump::NoSuchPage);
   }

   #[test]
   fn after_rejects_zero_delta() {
      assert!(matches!(
         after().page(0, 2),
         Err(Error::InvalidPageDelta { delta: 0, .. })
      ));
   }

   // ─── shared ───

   #[test]
   fn rejects_zero_limit() {
      assert!(matches!(before().page(0, 0), Err(Error::InvalidPageSize)));
      assert!(matches!(after().page(1, 0), Err(Error::InvalidPageSize)));
   }

   #[test]
   fn overflowing_jump_is_no_such_page() {
      assert_eq!(
         before().page(i64::MAX, usize::MAX).unwrap(),
         PageJump::NoSuchPage
      );
   }

   #[test]
   fn transform_applies_to_batch_snapshots_only() {
      let window = after().with_transform(|k: &Keyset| {
         let mut k = k.clone();
         k.insert("seen".to_string(), json!(true));
         k
      });

      assert_eq!(window.page(1, 2).unwrap(), anchor("L"));

      let jumped = window.page(2, 2).unwrap();
      let keyset = jumped.anchor().unwrap();
      assert_eq!(keyset["id"], json!("b"));
      assert_eq!(keyset["seen"], json!(true));
   }
}
