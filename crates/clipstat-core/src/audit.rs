//! Audit trail types.
//!
//! Every mutation of a tracked table produces one [`AuditEntry`]. The before
//! and after states are carried as an [`AuditPayload`], a tagged union over
//! the entity shapes the warehouse knows about. Building a payload is where
//! values are normalised for storage: timestamps become RFC 3339 text and
//! absent values become an explicit JSON `null`.

use std::{fmt, str::FromStr};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error,
  label::{DerivedStat, SentimentRecord},
  video::{Transcript, VideoInfo, VideoMetrics},
};

// ─── Action ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
  Insert,
  Update,
  Delete,
}

impl AuditAction {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Insert => "INSERT",
      Self::Update => "UPDATE",
      Self::Delete => "DELETE",
    }
  }
}

impl fmt::Display for AuditAction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for AuditAction {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "INSERT" => Ok(Self::Insert),
      "UPDATE" => Ok(Self::Update),
      "DELETE" => Ok(Self::Delete),
      other => Err(Error::UnknownAction(other.to_owned())),
    }
  }
}

// ─── Tables ──────────────────────────────────────────────────────────────────

/// The tables whose mutations are audited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackedTable {
  #[serde(rename = "fact_video_metrics")]
  VideoMetrics,
  #[serde(rename = "dim_video_info")]
  VideoInfo,
  #[serde(rename = "dim_transcripts")]
  Transcripts,
  #[serde(rename = "dim_stats")]
  Stats,
  #[serde(rename = "dim_sentiment")]
  Sentiment,
}

impl TrackedTable {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::VideoMetrics => "fact_video_metrics",
      Self::VideoInfo => "dim_video_info",
      Self::Transcripts => "dim_transcripts",
      Self::Stats => "dim_stats",
      Self::Sentiment => "dim_sentiment",
    }
  }
}

impl fmt::Display for TrackedTable {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for TrackedTable {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "fact_video_metrics" => Ok(Self::VideoMetrics),
      "dim_video_info" => Ok(Self::VideoInfo),
      "dim_transcripts" => Ok(Self::Transcripts),
      "dim_stats" => Ok(Self::Stats),
      "dim_sentiment" => Ok(Self::Sentiment),
      other => Err(Error::UnknownTable(other.to_owned())),
    }
  }
}

// ─── Payload ─────────────────────────────────────────────────────────────────

/// Serialisable snapshot of one entity, as stored in `old_values` /
/// `new_values`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum AuditPayload {
  VideoMetrics {
    published_at:  String,
    view_count:    u64,
    like_count:    u64,
    comment_count: u64,
    duration:      String,
  },
  VideoInfo {
    title:       String,
    description: String,
    category:    String,
    tags:        Vec<String>,
  },
  Transcript {
    transcript: Option<String>,
  },
  Stat {
    popularity: String,
  },
  Sentiment {
    sentiment: String,
  },
  /// End-of-run marker written once per processed identifier.
  BatchMarker {
    run_id:       Uuid,
    completed_at: String,
  },
}

/// Canonical text form for every timestamp that enters an audit payload.
pub fn canonical_time(at: DateTime<Utc>) -> String {
  at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl AuditPayload {
  pub fn batch_marker(run_id: Uuid, completed_at: DateTime<Utc>) -> Self {
    Self::BatchMarker { run_id, completed_at: canonical_time(completed_at) }
  }

  /// The view count, for payloads that carry one.
  pub fn view_count(&self) -> Option<u64> {
    match self {
      Self::VideoMetrics { view_count, .. } => Some(*view_count),
      _ => None,
    }
  }
}

impl From<&VideoMetrics> for AuditPayload {
  fn from(m: &VideoMetrics) -> Self {
    Self::VideoMetrics {
      published_at:  canonical_time(m.published_at),
      view_count:    m.counts.view_count,
      like_count:    m.counts.like_count,
      comment_count: m.counts.comment_count,
      duration:      m.duration.clone(),
    }
  }
}

impl From<&VideoInfo> for AuditPayload {
  fn from(i: &VideoInfo) -> Self {
    Self::VideoInfo {
      title:       i.title.clone(),
      description: i.description.clone(),
      category:    i.category.clone(),
      tags:        i.tags.clone(),
    }
  }
}

impl From<&Transcript> for AuditPayload {
  fn from(t: &Transcript) -> Self {
    Self::Transcript { transcript: t.text.clone() }
  }
}

impl From<&DerivedStat> for AuditPayload {
  fn from(s: &DerivedStat) -> Self {
    Self::Stat { popularity: s.popularity.as_str().to_owned() }
  }
}

impl From<&SentimentRecord> for AuditPayload {
  fn from(s: &SentimentRecord) -> Self {
    Self::Sentiment { sentiment: s.sentiment.as_str().to_owned() }
  }
}

// ─── Entries ─────────────────────────────────────────────────────────────────

/// Input to the audit recorder. The timestamp is assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEntry {
  pub actor:     String,
  pub action:    AuditAction,
  pub table:     TrackedTable,
  pub record_id: String,
  pub prior:     Option<AuditPayload>,
  pub new:       Option<AuditPayload>,
}

impl NewAuditEntry {
  pub fn insert(
    actor: &str,
    table: TrackedTable,
    record_id: &str,
    new: AuditPayload,
  ) -> Self {
    Self {
      actor: actor.to_owned(),
      action: AuditAction::Insert,
      table,
      record_id: record_id.to_owned(),
      prior: None,
      new: Some(new),
    }
  }

  pub fn update(
    actor: &str,
    table: TrackedTable,
    record_id: &str,
    prior: AuditPayload,
    new: AuditPayload,
  ) -> Self {
    Self {
      actor: actor.to_owned(),
      action: AuditAction::Update,
      table,
      record_id: record_id.to_owned(),
      prior: Some(prior),
      new: Some(new),
    }
  }

  pub fn delete(
    actor: &str,
    table: TrackedTable,
    record_id: &str,
    prior: AuditPayload,
  ) -> Self {
    Self {
      actor: actor.to_owned(),
      action: AuditAction::Delete,
      table,
      record_id: record_id.to_owned(),
      prior: Some(prior),
      new: None,
    }
  }
}

/// A persisted `audit_logs` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
  pub audit_id:    i64,
  pub actor:       String,
  pub action:      AuditAction,
  pub table:       TrackedTable,
  pub record_id:   String,
  pub prior:       Option<AuditPayload>,
  pub new:         Option<AuditPayload>,
  pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use serde_json::json;

  use super::*;
  use crate::video::MetricCounts;

  #[test]
  fn metrics_payload_normalises_timestamp_to_text() {
    let metrics = VideoMetrics {
      video_id:     "abc123".into(),
      published_at: Utc.with_ymd_and_hms(2023, 5, 4, 10, 30, 0).unwrap(),
      counts:       MetricCounts {
        view_count:    100,
        like_count:    7,
        comment_count: 2,
      },
      duration:     "PT10M".into(),
    };

    let value = serde_json::to_value(AuditPayload::from(&metrics)).unwrap();
    assert_eq!(
      value,
      json!({
        "entity": "video_metrics",
        "published_at": "2023-05-04T10:30:00.000000Z",
        "view_count": 100,
        "like_count": 7,
        "comment_count": 2,
        "duration": "PT10M",
      })
    );
  }

  #[test]
  fn missing_transcript_serialises_as_null() {
    let t = Transcript { video_id: "v".into(), text: None };
    let value = serde_json::to_value(AuditPayload::from(&t)).unwrap();
    assert_eq!(value, json!({ "entity": "transcript", "transcript": null }));
  }

  #[test]
  fn table_names_match_schema() {
    assert_eq!(TrackedTable::VideoMetrics.as_str(), "fact_video_metrics");
    assert_eq!(
      "dim_transcripts".parse::<TrackedTable>().unwrap(),
      TrackedTable::Transcripts
    );
    assert_eq!(
      serde_json::to_string(&TrackedTable::Stats).unwrap(),
      "\"dim_stats\""
    );
  }
}
