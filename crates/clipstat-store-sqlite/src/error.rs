//! Error type for `clipstat-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] clipstat_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A count column held a negative value.
  #[error("negative count {value} in {column}")]
  NegativeCount { column: &'static str, value: i64 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  /// Whether this error means the warehouse itself is unusable (missing
  /// table, I/O failure, corrupt file) rather than one record being bad.
  pub fn is_structural(&self) -> bool {
    match self {
      Self::Database(_) => true,
      Self::Sqlite(e) => sqlite_is_structural(e),
      _ => false,
    }
  }
}

fn sqlite_is_structural(e: &rusqlite::Error) -> bool {
  use rusqlite::ErrorCode;

  match e {
    rusqlite::Error::SqliteFailure(err, message) => {
      matches!(
        err.code,
        ErrorCode::SystemIoFailure
          | ErrorCode::DatabaseCorrupt
          | ErrorCode::NotADatabase
          | ErrorCode::CannotOpen
          | ErrorCode::DiskFull
          | ErrorCode::ReadOnly
      ) || message
        .as_deref()
        .is_some_and(|m| m.starts_with("no such table") || m.starts_with("no such column"))
    }
    _ => false,
  }
}
