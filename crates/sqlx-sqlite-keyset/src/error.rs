use crate::direction::Direction;

/// Result type alias for keyset pagination operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for keyset pagination.
#[derive(Debug, thiserror::Error)]
pub enum Error {
   /// Error from SQLx operations.
   #[error(transparent)]
   Sqlx(#[from] sqlx::Error),

   /// Error from the connection manager.
   #[error(transparent)]
   ConnectionManager(#[from] sqlx_sqlite_conn_mgr::Error),

   /// SQLite type that cannot be mapped to JSON.
   #[error("unsupported datatype: {0}")]
   UnsupportedDatatype(String),

   /// I/O error when accessing database files.
   #[error("io error: {0}")]
   Io(#[from] std::io::Error),

   /// An ordering specification needs at least one column.
   #[error("ordering specification requires at least one column")]
   EmptyOrdering,

   /// The same key appears twice in an ordering specification.
   #[error("ordering column '{key}' is listed more than once")]
   DuplicateColumnKey { key: String },

   /// No column of an ordering specification is marked as primary key.
   #[error("ordering specification requires at least one primary-key column")]
   MissingPrimaryKey,

   /// Column key contains invalid characters.
   ///
   /// Keys must match `[a-zA-Z_][a-zA-Z0-9_]*`; they are used as result
   /// column aliases and in generated subquery names.
   #[error("invalid column name '{name}': must match [a-zA-Z_][a-zA-Z0-9_]*")]
   InvalidColumnName { name: String },

   /// A direction, sort direction or nulls token that is not recognized.
   #[error("unsupported {kind} '{token}'")]
   UnsupportedToken { kind: &'static str, token: String },

   /// Page size must be greater than zero.
   #[error("page size must be greater than zero")]
   InvalidPageSize,

   /// Page size exceeds the configured maximum.
   #[error("page size {limit} exceeds the maximum of {max}")]
   PageSizeTooLarge { limit: usize, max: usize },

   /// Page jump outside the range a window accepts.
   #[error("invalid page delta {delta} for a '{direction}' window")]
   InvalidPageDelta { direction: Direction, delta: i64 },

   /// A window was requested without an anchor snapshot that identifies a row.
   #[error("a window requires an anchor snapshot that identifies a row")]
   MissingWindowAnchor,

   /// The relation to paginate is already ordered or limited.
   #[error("pagination relation must not carry ORDER BY or LIMIT (these are added automatically)")]
   InvalidPaginationQuery,

   /// Ordering column not found in query results.
   #[error("ordering column '{column}' not found in query results")]
   CursorColumnNotFound { column: String },
}

impl Error {
   /// Extract a structured error code from the error type.
   ///
   /// This provides machine-readable error codes for error handling.
   pub fn error_code(&self) -> String {
      match self {
         Error::Sqlx(e) => {
            if let Some(code) = e.as_database_error().and_then(|db_err| db_err.code()) {
               return format!("SQLITE_{}", code);
            }
            "SQLX_ERROR".to_string()
         }
         Error::ConnectionManager(_) => "CONNECTION_ERROR".to_string(),
         Error::UnsupportedDatatype(_) => "UNSUPPORTED_DATATYPE".to_string(),
         Error::Io(_) => "IO_ERROR".to_string(),
         Error::EmptyOrdering => "EMPTY_ORDERING".to_string(),
         Error::DuplicateColumnKey { .. } => "DUPLICATE_COLUMN_KEY".to_string(),
         Error::MissingPrimaryKey => "MISSING_PRIMARY_KEY".to_string(),
         Error::InvalidColumnName { .. } => "INVALID_COLUMN_NAME".to_string(),
         Error::UnsupportedToken { .. } => "UNSUPPORTED_TOKEN".to_string(),
         Error::InvalidPageSize => "INVALID_PAGE_SIZE".to_string(),
         Error::PageSizeTooLarge { .. } => "PAGE_SIZE_TOO_LARGE".to_string(),
         Error::InvalidPageDelta { .. } => "INVALID_PAGE_DELTA".to_string(),
         Error::MissingWindowAnchor => "MISSING_WINDOW_ANCHOR".to_string(),
         Error::InvalidPaginationQuery => "INVALID_PAGINATION_QUERY".to_string(),
         Error::CursorColumnNotFound { .. } => "CURSOR_COLUMN_NOT_FOUND".to_string(),
      }
   }
}
