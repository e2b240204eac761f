//! Bounded concurrent fetching.
//!
//! Outbound requests are the only work that runs in parallel. Each request is
//! wrapped in a timeout and its failure is captured at the task boundary, so
//! one bad identifier never cancels its siblings. Results come back in
//! completion order.

use std::{future::Future, time::Duration};

use futures::stream::{self, StreamExt};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
  #[error("timed out after {0:?}")]
  Timeout(Duration),

  #[error(transparent)]
  Source(Box<dyn std::error::Error + Send + Sync>),
}

/// Run `fetch` for every id with at most `concurrency` requests in flight.
pub async fn fetch_all<'a, T, E, F, Fut>(
  ids: &'a [String],
  concurrency: usize,
  timeout: Duration,
  fetch: F,
) -> Vec<(String, Result<T, FetchError>)>
where
  F: Fn(&'a str) -> Fut,
  Fut: Future<Output = Result<T, E>>,
  E: std::error::Error + Send + Sync + 'static,
{
  stream::iter(ids)
    .map(|id| {
      let request = fetch(id.as_str());
      async move {
        let result = match tokio::time::timeout(timeout, request).await {
          Ok(Ok(value)) => Ok(value),
          Ok(Err(e)) => Err(FetchError::Source(Box::new(e))),
          Err(_) => Err(FetchError::Timeout(timeout)),
        };
        (id.clone(), result)
      }
    })
    .buffer_unordered(concurrency.max(1))
    .collect()
    .await
}
