//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as fixed-width RFC 3339 UTC strings so that
//! lexical order is chronological. Tags and audit payloads are stored as
//! compact JSON. Counts are `u64` in Rust and `INTEGER` in SQLite.

use chrono::{DateTime, Utc};
use clipstat_core::{
  audit::{AuditEntry, AuditPayload, canonical_time},
  label::{DerivedStat, SentimentRecord},
  video::{MetricCounts, MetricSnapshot, VideoInfo, VideoMetrics},
};

use crate::{Error, Result};

// ─── Timestamps ──────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { canonical_time(dt) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Counts ──────────────────────────────────────────────────────────────────

/// Saturates at `i64::MAX`; no real counter gets there.
pub fn encode_count(n: u64) -> i64 { i64::try_from(n).unwrap_or(i64::MAX) }

/// `NULL` is read as zero.
pub fn decode_count(column: &'static str, v: Option<i64>) -> Result<u64> {
  let value = v.unwrap_or(0);
  u64::try_from(value).map_err(|_| Error::NegativeCount { column, value })
}

// ─── Tags ────────────────────────────────────────────────────────────────────

pub fn encode_tags(tags: &[String]) -> Result<String> {
  Ok(serde_json::to_string(tags)?)
}

pub fn decode_tags(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Audit payloads ──────────────────────────────────────────────────────────

pub fn encode_payload(p: &AuditPayload) -> Result<String> {
  Ok(serde_json::to_string(p)?)
}

pub fn decode_payload(s: &str) -> Result<AuditPayload> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const METRICS_COLUMNS: &str =
  "video_id, published_at, view_count, like_count, comment_count, duration";

/// Raw values read directly from a `fact_video_metrics` row.
pub struct RawVideoMetrics {
  pub video_id:      String,
  pub published_at:  String,
  pub view_count:    Option<i64>,
  pub like_count:    Option<i64>,
  pub comment_count: Option<i64>,
  pub duration:      Option<String>,
}

impl RawVideoMetrics {
  /// Map a row selected with [`METRICS_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      video_id:      row.get(0)?,
      published_at:  row.get(1)?,
      view_count:    row.get(2)?,
      like_count:    row.get(3)?,
      comment_count: row.get(4)?,
      duration:      row.get(5)?,
    })
  }

  pub fn into_metrics(self) -> Result<VideoMetrics> {
    Ok(VideoMetrics {
      video_id:     self.video_id,
      published_at: decode_dt(&self.published_at)?,
      counts:       MetricCounts {
        view_count:    decode_count("view_count", self.view_count)?,
        like_count:    decode_count("like_count", self.like_count)?,
        comment_count: decode_count("comment_count", self.comment_count)?,
      },
      duration:     self.duration.unwrap_or_default(),
    })
  }
}

pub const INFO_COLUMNS: &str = "video_id, title, description, category, tags";

/// Raw values read directly from a `dim_video_info` row.
pub struct RawVideoInfo {
  pub video_id:    String,
  pub title:       String,
  pub description: Option<String>,
  pub category:    Option<String>,
  pub tags:        String,
}

impl RawVideoInfo {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      video_id:    row.get(0)?,
      title:       row.get(1)?,
      description: row.get(2)?,
      category:    row.get(3)?,
      tags:        row.get(4)?,
    })
  }

  pub fn into_info(self) -> Result<VideoInfo> {
    Ok(VideoInfo {
      video_id:    self.video_id,
      title:       self.title,
      description: self.description.unwrap_or_default(),
      category:    self.category.unwrap_or_default(),
      tags:        decode_tags(&self.tags)?,
    })
  }
}

/// Raw values read from a `fact_video_metrics_history` row.
pub struct RawSnapshot {
  pub video_id:      String,
  pub snapshot_date: String,
  pub view_count:    i64,
  pub like_count:    i64,
  pub comment_count: i64,
}

impl RawSnapshot {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      video_id:      row.get(0)?,
      snapshot_date: row.get(1)?,
      view_count:    row.get(2)?,
      like_count:    row.get(3)?,
      comment_count: row.get(4)?,
    })
  }

  pub fn into_snapshot(self) -> Result<MetricSnapshot> {
    Ok(MetricSnapshot {
      video_id:    self.video_id,
      snapshot_at: decode_dt(&self.snapshot_date)?,
      counts:      MetricCounts {
        view_count:    decode_count("view_count", Some(self.view_count))?,
        like_count:    decode_count("like_count", Some(self.like_count))?,
        comment_count: decode_count("comment_count", Some(self.comment_count))?,
      },
    })
  }
}

pub fn decode_stat(video_id: String, popularity: &str) -> Result<DerivedStat> {
  Ok(DerivedStat { video_id, popularity: popularity.parse()? })
}

pub fn decode_sentiment(
  video_id: String,
  sentiment: &str,
) -> Result<SentimentRecord> {
  Ok(SentimentRecord { video_id, sentiment: sentiment.parse()? })
}

/// Raw strings read directly from an `audit_logs` row.
pub struct RawAuditEntry {
  pub audit_id:    i64,
  pub user_id:     String,
  pub action:      String,
  pub table_name:  String,
  pub record_id:   String,
  pub old_values:  Option<String>,
  pub new_values:  Option<String>,
  pub action_time: String,
}

impl RawAuditEntry {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      audit_id:    row.get(0)?,
      user_id:     row.get(1)?,
      action:      row.get(2)?,
      table_name:  row.get(3)?,
      record_id:   row.get(4)?,
      old_values:  row.get(5)?,
      new_values:  row.get(6)?,
      action_time: row.get(7)?,
    })
  }

  pub fn into_entry(self) -> Result<AuditEntry> {
    Ok(AuditEntry {
      audit_id:    self.audit_id,
      actor:       self.user_id,
      action:      self.action.parse()?,
      table:       self.table_name.parse()?,
      record_id:   self.record_id,
      prior:       self.old_values.as_deref().map(decode_payload).transpose()?,
      new:         self.new_values.as_deref().map(decode_payload).transpose()?,
      recorded_at: decode_dt(&self.action_time)?,
    })
  }
}
