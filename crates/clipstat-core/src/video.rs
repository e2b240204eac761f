//! Warehouse entities keyed by video identifier.
//!
//! [`VideoMetrics`] is the fact row; [`VideoInfo`] and [`Transcript`] are
//! dimensions hanging off the same key. [`MetricSnapshot`] is the append-only
//! history of the counted fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Counts ──────────────────────────────────────────────────────────────────

/// The three engagement counters tracked in both the fact table and the
/// history table.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct MetricCounts {
  pub view_count:    u64,
  pub like_count:    u64,
  pub comment_count: u64,
}

// ─── Fact ────────────────────────────────────────────────────────────────────

/// Current engagement metrics for one video. Exactly one row per identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetrics {
  pub video_id:     String,
  pub published_at: DateTime<Utc>,
  pub counts:       MetricCounts,
  /// Opaque duration string as reported upstream (e.g. `PT14M3S`).
  pub duration:     String,
}

impl VideoMetrics {
  /// Whether any tracked field differs from `other`.
  ///
  /// The publish timestamp is not tracked: it is fixed once the row exists,
  /// and upstream omissions are back-filled with the fetch time.
  pub fn differs_from(&self, other: &VideoMetrics) -> bool {
    self.counts != other.counts || self.duration != other.duration
  }
}

// ─── Dimensions ──────────────────────────────────────────────────────────────

/// Descriptive metadata for a video. Upsert-only, no history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoInfo {
  pub video_id:    String,
  pub title:       String,
  pub description: String,
  pub category:    String,
  pub tags:        Vec<String>,
}

/// Full transcript text for a video. May only exist when a
/// [`VideoMetrics`] row exists for the same identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
  pub video_id: String,
  pub text:     Option<String>,
}

impl Transcript {
  /// Missing and empty text compare equal.
  pub fn text_or_empty(&self) -> &str { self.text.as_deref().unwrap_or("") }

  pub fn differs_from(&self, other: &Transcript) -> bool {
    self.text_or_empty() != other.text_or_empty()
  }
}

// ─── History ─────────────────────────────────────────────────────────────────

/// An immutable point-in-time copy of a video's counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSnapshot {
  pub video_id:    String,
  pub snapshot_at: DateTime<Utc>,
  pub counts:      MetricCounts,
}

// ─── Upstream record ─────────────────────────────────────────────────────────

/// One video as returned by the metadata source, before default-filling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoDetails {
  pub video_id:      String,
  pub title:         Option<String>,
  pub description:   Option<String>,
  pub published_at:  Option<DateTime<Utc>>,
  pub view_count:    Option<u64>,
  pub like_count:    Option<u64>,
  pub comment_count: Option<u64>,
  pub duration:      Option<String>,
  pub category:      Option<String>,
  pub tags:          Vec<String>,
}

/// A fetched video split into its warehouse rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedVideo {
  pub info:    VideoInfo,
  pub metrics: VideoMetrics,
}

impl VideoDetails {
  /// Fill every missing field (empty strings, zero counts, `now` for an
  /// absent publish date) and split into dimension and fact rows.
  pub fn fill_defaults(self, now: DateTime<Utc>) -> FetchedVideo {
    let counts = MetricCounts {
      view_count:    self.view_count.unwrap_or(0),
      like_count:    self.like_count.unwrap_or(0),
      comment_count: self.comment_count.unwrap_or(0),
    };

    FetchedVideo {
      info:    VideoInfo {
        video_id:    self.video_id.clone(),
        title:       self.title.unwrap_or_default(),
        description: self.description.unwrap_or_default(),
        category:    self.category.unwrap_or_default(),
        tags:        self.tags,
      },
      metrics: VideoMetrics {
        video_id: self.video_id,
        published_at: self.published_at.unwrap_or(now),
        counts,
        duration: self.duration.unwrap_or_default(),
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn fill_defaults_zeroes_missing_counts() {
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let details = VideoDetails {
      video_id: "abc123".into(),
      view_count: Some(42),
      ..Default::default()
    };

    let fetched = details.fill_defaults(now);
    assert_eq!(fetched.metrics.counts.view_count, 42);
    assert_eq!(fetched.metrics.counts.like_count, 0);
    assert_eq!(fetched.metrics.published_at, now);
    assert_eq!(fetched.metrics.duration, "");
    assert_eq!(fetched.info.title, "");
    assert!(fetched.info.tags.is_empty());
  }

  #[test]
  fn publish_date_is_not_a_tracked_field() {
    let a = VideoMetrics {
      video_id:     "v".into(),
      published_at: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
      counts:       MetricCounts { view_count: 1, ..Default::default() },
      duration:     "PT1M".into(),
    };
    let mut b = a.clone();
    b.published_at = Utc::now();
    assert!(!a.differs_from(&b));

    b.counts.like_count = 3;
    assert!(a.differs_from(&b));
  }

  #[test]
  fn empty_and_missing_transcripts_compare_equal() {
    let a = Transcript { video_id: "v".into(), text: None };
    let b = Transcript { video_id: "v".into(), text: Some(String::new()) };
    assert!(!a.differs_from(&b));
  }
}
