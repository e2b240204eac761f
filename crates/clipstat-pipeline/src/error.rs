//! Error type for `clipstat-pipeline`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A connection-level warehouse failure; the current step was rolled back.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("video id directory {0} does not exist")]
  MissingIdsDir(PathBuf),

  #[error("no video ids found in {0}")]
  NoVideoIds(PathBuf),

  #[error("no video details were fetched")]
  NothingFetched,

  #[error("failed to read {path}: {source}")]
  Io {
    path:   PathBuf,
    source: std::io::Error,
  },

  #[error("popularity scaler returned {got} rows for {expected} inputs")]
  ScalerOutput { expected: usize, got: usize },

  #[error("invalid model file {path}: {source}")]
  Model {
    path:   PathBuf,
    source: serde_json::Error,
  },
}

impl Error {
  pub fn store<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
