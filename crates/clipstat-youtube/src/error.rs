//! Error type for `clipstat-youtube`.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{endpoint} returned {status} for {video_id}")]
  Status {
    endpoint: &'static str,
    status:   StatusCode,
    video_id: String,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
