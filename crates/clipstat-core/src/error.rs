//! Error types for `clipstat-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown popularity label: {0:?}")]
  UnknownPopularity(String),

  #[error("unknown sentiment label: {0:?}")]
  UnknownSentiment(String),

  #[error("unknown audit action: {0:?}")]
  UnknownAction(String),

  #[error("unknown tracked table: {0:?}")]
  UnknownTable(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
