//! Transcript endpoint client.

use std::time::Duration;

use clipstat_core::source::TranscriptSource;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct TranscriptConfig {
  pub base_url: String,
  pub timeout:  Duration,
}

#[derive(Clone)]
pub struct TranscriptClient {
  client: Client,
  config: TranscriptConfig,
}

impl TranscriptClient {
  pub fn new(config: TranscriptConfig) -> Result<Self> {
    let client = Client::builder().timeout(config.timeout).build()?;
    Ok(Self { client, config })
  }
}

/// One timed caption segment.
#[derive(Debug, Deserialize)]
struct Segment {
  text: String,
}

fn join_segments(segments: Vec<Segment>) -> String {
  segments
    .into_iter()
    .map(|s| s.text)
    .collect::<Vec<_>>()
    .join(" ")
}

impl TranscriptSource for TranscriptClient {
  type Error = Error;

  /// `GET /<video_id>`; 404 means no transcript exists.
  async fn fetch_transcript(&self, video_id: &str) -> Result<Option<String>> {
    let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), video_id);
    let resp = self.client.get(url).send().await?;

    if resp.status() == StatusCode::NOT_FOUND {
      tracing::info!(video_id, "no transcript available");
      return Ok(None);
    }
    if !resp.status().is_success() {
      return Err(Error::Status {
        endpoint: "transcript",
        status:   resp.status(),
        video_id: video_id.to_owned(),
      });
    }

    let segments: Vec<Segment> = resp.json().await?;
    tracing::info!(video_id, segments = segments.len(), "fetched transcript");
    Ok(Some(join_segments(segments)))
  }
}
