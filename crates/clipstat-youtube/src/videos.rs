//! YouTube Data API v3 client for video metadata and statistics.

use std::time::Duration;

use chrono::{DateTime, Utc};
use clipstat_core::{source::VideoSource, video::VideoDetails};
use reqwest::Client;
use serde::Deserialize;

use crate::{Error, Result};

/// Connection settings for the metadata API.
#[derive(Debug, Clone)]
pub struct YouTubeConfig {
  /// e.g. `https://www.googleapis.com/youtube/v3`
  pub base_url: String,
  pub api_key:  String,
  pub timeout:  Duration,
}

#[derive(Clone)]
pub struct YouTubeClient {
  client: Client,
  config: YouTubeConfig,
}

impl YouTubeClient {
  pub fn new(config: YouTubeConfig) -> Result<Self> {
    if config.api_key.is_empty() {
      tracing::warn!("YouTube API key is not set; requests will be rejected");
    }
    let client = Client::builder().timeout(config.timeout).build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }
}

impl VideoSource for YouTubeClient {
  type Error = Error;

  /// `GET /videos?part=snippet,statistics,contentDetails&id=<id>`
  async fn fetch_details(&self, video_id: &str) -> Result<Option<VideoDetails>> {
    let resp = self
      .client
      .get(self.url("/videos"))
      .query(&[
        ("part", "snippet,statistics,contentDetails"),
        ("id", video_id),
        ("key", self.config.api_key.as_str()),
      ])
      .send()
      .await?;

    if !resp.status().is_success() {
      return Err(Error::Status {
        endpoint: "videos.list",
        status:   resp.status(),
        video_id: video_id.to_owned(),
      });
    }

    let body: VideoListResponse = resp.json().await?;
    let details = body
      .items
      .into_iter()
      .next()
      .map(|item| item.into_details(video_id));

    if details.is_none() {
      tracing::warn!(video_id, "videos.list returned no items");
    }
    Ok(details)
  }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct VideoListResponse {
  #[serde(default)]
  items: Vec<VideoItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
  #[serde(default)]
  snippet:         Snippet,
  #[serde(default)]
  statistics:      Statistics,
  #[serde(default)]
  content_details: ContentDetails,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
  title:        Option<String>,
  description:  Option<String>,
  published_at: Option<String>,
  category_id:  Option<String>,
  #[serde(default)]
  tags:         Vec<String>,
}

/// Counts arrive as decimal strings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Statistics {
  view_count:    Option<String>,
  like_count:    Option<String>,
  comment_count: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ContentDetails {
  duration: Option<String>,
}

fn parse_count(raw: Option<String>) -> Option<u64> {
  raw.and_then(|s| s.parse().ok())
}

impl VideoItem {
  fn into_details(self, video_id: &str) -> VideoDetails {
    let published_at = self
      .snippet
      .published_at
      .as_deref()
      .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
      .map(|dt| dt.with_timezone(&Utc));

    VideoDetails {
      video_id: video_id.to_owned(),
      title: Some(self.snippet.title.unwrap_or_else(|| "No Title".into())),
      description: Some(
        self
          .snippet
          .description
          .unwrap_or_else(|| "No Description".into()),
      ),
      published_at,
      view_count: Some(parse_count(self.statistics.view_count).unwrap_or(0)),
      like_count: Some(parse_count(self.statistics.like_count).unwrap_or(0)),
      comment_count: Some(parse_count(self.statistics.comment_count).unwrap_or(0)),
      duration: Some(self.content_details.duration.unwrap_or_else(|| "N/A".into())),
      category: Some(self.snippet.category_id.unwrap_or_else(|| "Unknown".into())),
      tags: self.snippet.tags,
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn full_item_maps_every_field() {
    let body: VideoListResponse = serde_json::from_str(
      r#"{
        "items": [{
          "id": "abc123",
          "snippet": {
            "title": "How bees see",
            "description": "A talk about vision",
            "publishedAt": "2019-04-02T15:00:07Z",
            "categoryId": "27",
            "tags": ["TEDx", "biology"]
          },
          "statistics": {
            "viewCount": "15234",
            "likeCount": "410",
            "commentCount": "37"
          },
          "contentDetails": { "duration": "PT11M42S" }
        }]
      }"#,
    )
    .unwrap();

    let details = body.items.into_iter().next().unwrap().into_details("abc123");
    assert_eq!(details.video_id, "abc123");
    assert_eq!(details.title.as_deref(), Some("How bees see"));
    assert_eq!(
      details.published_at,
      Some(Utc.with_ymd_and_hms(2019, 4, 2, 15, 0, 7).unwrap())
    );
    assert_eq!(details.view_count, Some(15234));
    assert_eq!(details.like_count, Some(410));
    assert_eq!(details.comment_count, Some(37));
    assert_eq!(details.duration.as_deref(), Some("PT11M42S"));
    assert_eq!(details.category.as_deref(), Some("27"));
    assert_eq!(details.tags, vec!["TEDx".to_string(), "biology".to_string()]);
  }

  #[test]
  fn sparse_item_gets_upstream_defaults() {
    let body: VideoListResponse =
      serde_json::from_str(r#"{ "items": [{ "snippet": {} }] }"#).unwrap();

    let details = body.items.into_iter().next().unwrap().into_details("x");
    assert_eq!(details.title.as_deref(), Some("No Title"));
    assert_eq!(details.description.as_deref(), Some("No Description"));
    assert_eq!(details.category.as_deref(), Some("Unknown"));
    assert_eq!(details.duration.as_deref(), Some("N/A"));
    assert_eq!(details.view_count, Some(0));
    assert!(details.published_at.is_none());
    assert!(details.tags.is_empty());
  }

  #[test]
  fn missing_items_deserialises_to_empty() {
    let body: VideoListResponse = serde_json::from_str("{}").unwrap();
    assert!(body.items.is_empty());
  }
}
