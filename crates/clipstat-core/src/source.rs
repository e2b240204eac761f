//! Upstream fetch seams.
//!
//! The pipeline calls these concurrently from a bounded pool, so
//! implementations must be shareable across tasks.

use std::future::Future;

use crate::video::VideoDetails;

/// Retrieves metadata and engagement counts for one video.
pub trait VideoSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// `Ok(None)` when the upstream knows nothing about `video_id`.
  fn fetch_details<'a>(
    &'a self,
    video_id: &'a str,
  ) -> impl Future<Output = Result<Option<VideoDetails>, Self::Error>> + Send + 'a;
}

/// Retrieves the full transcript text for one video.
pub trait TranscriptSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// `Ok(None)` when no transcript is available.
  fn fetch_transcript<'a>(
    &'a self,
    video_id: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;
}
