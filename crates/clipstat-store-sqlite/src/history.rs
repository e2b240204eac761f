//! The history tracker: append-only metric snapshots.

use clipstat_core::{
  batch::Change,
  video::{MetricCounts, MetricSnapshot},
};
use rusqlite::{Connection, OptionalExtension as _};

use crate::{
  Result,
  encode::{decode_count, encode_count, encode_dt},
};

/// Counts of the most recent snapshot for `video_id`, if any.
pub fn latest_counts(conn: &Connection, video_id: &str) -> Result<Option<MetricCounts>> {
  let raw: Option<(i64, i64, i64)> = conn
    .query_row(
      "SELECT view_count, like_count, comment_count
       FROM fact_video_metrics_history
       WHERE video_id = ?1
       ORDER BY snapshot_date DESC
       LIMIT 1",
      rusqlite::params![video_id],
      |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
    )
    .optional()?;

  raw
    .map(|(views, likes, comments)| {
      Ok(MetricCounts {
        view_count:    decode_count("view_count", Some(views))?,
        like_count:    decode_count("like_count", Some(likes))?,
        comment_count: decode_count("comment_count", Some(comments))?,
      })
    })
    .transpose()
}

/// Insert `snapshot` unless the latest one for the same video has identical
/// counts. Not audited; snapshots are never updated in place.
pub fn maybe_snapshot(conn: &Connection, snapshot: &MetricSnapshot) -> Result<Change> {
  if latest_counts(conn, &snapshot.video_id)? == Some(snapshot.counts) {
    return Ok(Change::Unchanged);
  }

  conn.execute(
    "INSERT INTO fact_video_metrics_history
       (video_id, snapshot_date, view_count, like_count, comment_count)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    rusqlite::params![
      snapshot.video_id,
      encode_dt(snapshot.snapshot_at),
      encode_count(snapshot.counts.view_count),
      encode_count(snapshot.counts.like_count),
      encode_count(snapshot.counts.comment_count),
    ],
  )?;

  tracing::debug!(
    video_id = %snapshot.video_id,
    snapshot_at = %snapshot.snapshot_at,
    "history snapshot inserted"
  );
  Ok(Change::Inserted)
}
