/// Limits applied to page and window requests.
///
/// # Example
///
/// ```
/// use sqlx_sqlite_keyset::PaginationConfig;
///
/// let config = PaginationConfig {
///    max_page_size: 200,
///    ..Default::default()
/// };
/// assert_eq!(config.default_max_jump, 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationConfig {
   /// Largest accepted page size
   ///
   /// Default: 1000
   pub max_page_size: usize,

   /// Pages a window covers when the request does not say
   ///
   /// Default: 10
   pub default_max_jump: usize,
}

impl Default for PaginationConfig {
   fn default() -> Self {
      Self {
         max_page_size: 1000,
         default_max_jump: 10,
      }
   }
}

impl PaginationConfig {
   /// Check a requested page size against this configuration.
   pub(crate) fn validate_limit(&self, limit: usize) -> Result<(), crate::Error> {
      if limit == 0 {
         return Err(crate::Error::InvalidPageSize);
      }
      if limit > self.max_page_size {
         return Err(crate::Error::PageSizeTooLarge {
            limit,
            max: self.max_page_size,
         });
      }
      Ok(())
   }
}

#[cfg(test)]
mod tests {
   use super::*;
   use crate::Error;

   #[test]
   fn test_default_config() {
      let config = PaginationConfig::default();
      assert_eq!(config.max_page_size, 1000);
      assert_eq!(config.default_max_jump, 10);
   }

   #[test]
   fn test_validate_limit() {
      let config = PaginationConfig {
         max_page_size: 50,
         ..Default::default()
      };

      assert!(config.validate_limit(1).is_ok());
      assert!(config.validate_limit(50).is_ok());
      assert!(matches!(config.validate_limit(0), Err(Error::InvalidPageSize)));
      assert!(matches!(
         config.validate_limit(51),
         Err(Error::PageSizeTooLarge { limit: 51, max: 50 })
      ));
   }
}
