//! Row-level reads and change-detecting writes for each warehouse entity.
//!
//! Every write here is paired with an [`audit::record`] call on the same
//! connection. Callers run these inside a transaction or savepoint so that a
//! failed audit write takes the mutation down with it.

use chrono::{DateTime, Utc};
use clipstat_core::{
  audit::{AuditPayload, NewAuditEntry, TrackedTable},
  batch::RecordOutcome,
  label::{DerivedStat, PopularityLabel, SentimentRecord},
  video::{Transcript, VideoInfo, VideoMetrics},
};
use rusqlite::{Connection, OptionalExtension as _};
use uuid::Uuid;

use crate::{
  Result,
  audit,
  encode::{
    INFO_COLUMNS, METRICS_COLUMNS, RawVideoInfo, RawVideoMetrics,
    decode_sentiment, decode_stat, encode_count, encode_dt, encode_tags,
  },
};

// ─── Reads ───────────────────────────────────────────────────────────────────

pub fn select_metrics(conn: &Connection, video_id: &str) -> Result<Option<VideoMetrics>> {
  let raw = conn
    .query_row(
      &format!("SELECT {METRICS_COLUMNS} FROM fact_video_metrics WHERE video_id = ?1"),
      rusqlite::params![video_id],
      RawVideoMetrics::from_row,
    )
    .optional()?;
  raw.map(RawVideoMetrics::into_metrics).transpose()
}

pub fn metrics_exist(conn: &Connection, video_id: &str) -> Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM fact_video_metrics WHERE video_id = ?1",
        rusqlite::params![video_id],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

pub fn select_info(conn: &Connection, video_id: &str) -> Result<Option<VideoInfo>> {
  let raw = conn
    .query_row(
      &format!("SELECT {INFO_COLUMNS} FROM dim_video_info WHERE video_id = ?1"),
      rusqlite::params![video_id],
      RawVideoInfo::from_row,
    )
    .optional()?;
  raw.map(RawVideoInfo::into_info).transpose()
}

pub fn select_transcript(conn: &Connection, video_id: &str) -> Result<Option<Transcript>> {
  let text: Option<Option<String>> = conn
    .query_row(
      "SELECT transcript FROM dim_transcripts WHERE video_id = ?1",
      rusqlite::params![video_id],
      |r| r.get(0),
    )
    .optional()?;
  Ok(text.map(|text| Transcript { video_id: video_id.to_owned(), text }))
}

pub fn select_stat(conn: &Connection, video_id: &str) -> Result<Option<DerivedStat>> {
  let label: Option<String> = conn
    .query_row(
      "SELECT popularity FROM dim_stats WHERE video_id = ?1",
      rusqlite::params![video_id],
      |r| r.get(0),
    )
    .optional()?;
  label
    .map(|l| decode_stat(video_id.to_owned(), &l))
    .transpose()
}

pub fn select_sentiment(
  conn: &Connection,
  video_id: &str,
) -> Result<Option<SentimentRecord>> {
  let label: Option<String> = conn
    .query_row(
      "SELECT sentiment FROM dim_sentiment WHERE video_id = ?1",
      rusqlite::params![video_id],
      |r| r.get(0),
    )
    .optional()?;
  label
    .map(|l| decode_sentiment(video_id.to_owned(), &l))
    .transpose()
}

// ─── Fact ────────────────────────────────────────────────────────────────────

/// Give a video its `Not Rated Yet` label if it has none yet.
fn ensure_popularity_placeholder(
  conn: &Connection,
  actor: &str,
  video_id: &str,
) -> Result<()> {
  let placeholder = DerivedStat {
    video_id:   video_id.to_owned(),
    popularity: PopularityLabel::NotRatedYet,
  };

  let inserted = conn.execute(
    "INSERT INTO dim_stats (video_id, popularity) VALUES (?1, ?2)
     ON CONFLICT (video_id) DO NOTHING",
    rusqlite::params![video_id, placeholder.popularity.as_str()],
  )?;

  if inserted > 0 {
    tracing::info!(video_id, "created placeholder popularity label");
    audit::record(
      conn,
      &NewAuditEntry::insert(
        actor,
        TrackedTable::Stats,
        video_id,
        AuditPayload::from(&placeholder),
      ),
    )?;
  }
  Ok(())
}

pub fn upsert_metrics(
  conn: &Connection,
  actor: &str,
  row: &VideoMetrics,
) -> Result<RecordOutcome> {
  ensure_popularity_placeholder(conn, actor, &row.video_id)?;

  match select_metrics(conn, &row.video_id)? {
    None => {
      conn.execute(
        "INSERT INTO fact_video_metrics (
           video_id, published_at, view_count, like_count, comment_count, duration
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
          row.video_id,
          encode_dt(row.published_at),
          encode_count(row.counts.view_count),
          encode_count(row.counts.like_count),
          encode_count(row.counts.comment_count),
          row.duration,
        ],
      )?;
      audit::record(
        conn,
        &NewAuditEntry::insert(
          actor,
          TrackedTable::VideoMetrics,
          &row.video_id,
          AuditPayload::from(row),
        ),
      )?;
      Ok(RecordOutcome::inserted())
    }
    Some(old) if old.differs_from(row) => {
      let new = VideoMetrics { published_at: old.published_at, ..row.clone() };
      conn.execute(
        "UPDATE fact_video_metrics
         SET view_count = ?2, like_count = ?3, comment_count = ?4, duration = ?5
         WHERE video_id = ?1",
        rusqlite::params![
          new.video_id,
          encode_count(new.counts.view_count),
          encode_count(new.counts.like_count),
          encode_count(new.counts.comment_count),
          new.duration,
        ],
      )?;
      audit::record(
        conn,
        &NewAuditEntry::update(
          actor,
          TrackedTable::VideoMetrics,
          &new.video_id,
          AuditPayload::from(&old),
          AuditPayload::from(&new),
        ),
      )?;
      Ok(RecordOutcome::updated())
    }
    Some(_) => Ok(RecordOutcome::unchanged()),
  }
}

// ─── Dimensions ──────────────────────────────────────────────────────────────

pub fn upsert_info(conn: &Connection, actor: &str, row: &VideoInfo) -> Result<RecordOutcome> {
  let old = select_info(conn, &row.video_id)?;
  if old.as_ref() == Some(row) {
    return Ok(RecordOutcome::unchanged());
  }

  conn.execute(
    "INSERT INTO dim_video_info (video_id, title, description, category, tags)
     VALUES (?1, ?2, ?3, ?4, ?5)
     ON CONFLICT (video_id) DO UPDATE SET
       title       = excluded.title,
       description = excluded.description,
       category    = excluded.category,
       tags        = excluded.tags",
    rusqlite::params![
      row.video_id,
      row.title,
      row.description,
      row.category,
      encode_tags(&row.tags)?,
    ],
  )?;

  let new = AuditPayload::from(row);
  let (entry, outcome) = match old {
    None => (
      NewAuditEntry::insert(actor, TrackedTable::VideoInfo, &row.video_id, new),
      RecordOutcome::inserted(),
    ),
    Some(old) => (
      NewAuditEntry::update(
        actor,
        TrackedTable::VideoInfo,
        &row.video_id,
        AuditPayload::from(&old),
        new,
      ),
      RecordOutcome::updated(),
    ),
  };
  audit::record(conn, &entry)?;
  Ok(outcome)
}

pub fn upsert_transcript(
  conn: &Connection,
  actor: &str,
  row: &Transcript,
) -> Result<RecordOutcome> {
  if !metrics_exist(conn, &row.video_id)? {
    tracing::warn!(
      video_id = %row.video_id,
      "no fact_video_metrics row; skipping transcript"
    );
    return Ok(RecordOutcome::Skipped {
      reason: "no parent metrics row".to_owned(),
    });
  }

  let old = select_transcript(conn, &row.video_id)?;
  if old.as_ref().is_some_and(|old| !old.differs_from(row)) {
    return Ok(RecordOutcome::unchanged());
  }

  conn.execute(
    "INSERT INTO dim_transcripts (video_id, transcript) VALUES (?1, ?2)
     ON CONFLICT (video_id) DO UPDATE SET transcript = excluded.transcript",
    rusqlite::params![row.video_id, row.text],
  )?;

  let new = AuditPayload::from(row);
  let (entry, outcome) = match old {
    None => (
      NewAuditEntry::insert(actor, TrackedTable::Transcripts, &row.video_id, new),
      RecordOutcome::inserted(),
    ),
    Some(old) => (
      NewAuditEntry::update(
        actor,
        TrackedTable::Transcripts,
        &row.video_id,
        AuditPayload::from(&old),
        new,
      ),
      RecordOutcome::updated(),
    ),
  };
  audit::record(conn, &entry)?;
  Ok(outcome)
}

pub fn upsert_stat(conn: &Connection, actor: &str, row: &DerivedStat) -> Result<RecordOutcome> {
  let old = select_stat(conn, &row.video_id)?;
  if old.as_ref() == Some(row) {
    return Ok(RecordOutcome::unchanged());
  }

  conn.execute(
    "INSERT INTO dim_stats (video_id, popularity) VALUES (?1, ?2)
     ON CONFLICT (video_id) DO UPDATE SET popularity = excluded.popularity",
    rusqlite::params![row.video_id, row.popularity.as_str()],
  )?;

  let new = AuditPayload::from(row);
  let (entry, outcome) = match old {
    None => (
      NewAuditEntry::insert(actor, TrackedTable::Stats, &row.video_id, new),
      RecordOutcome::inserted(),
    ),
    Some(old) => (
      NewAuditEntry::update(
        actor,
        TrackedTable::Stats,
        &row.video_id,
        AuditPayload::from(&old),
        new,
      ),
      RecordOutcome::updated(),
    ),
  };
  audit::record(conn, &entry)?;
  Ok(outcome)
}

pub fn upsert_sentiment(
  conn: &Connection,
  actor: &str,
  row: &SentimentRecord,
) -> Result<RecordOutcome> {
  let old = select_sentiment(conn, &row.video_id)?;
  if old.as_ref() == Some(row) {
    return Ok(RecordOutcome::unchanged());
  }

  conn.execute(
    "INSERT INTO dim_sentiment (video_id, sentiment) VALUES (?1, ?2)
     ON CONFLICT (video_id) DO UPDATE SET sentiment = excluded.sentiment",
    rusqlite::params![row.video_id, row.sentiment.as_str()],
  )?;

  let new = AuditPayload::from(row);
  let (entry, outcome) = match old {
    None => (
      NewAuditEntry::insert(actor, TrackedTable::Sentiment, &row.video_id, new),
      RecordOutcome::inserted(),
    ),
    Some(old) => (
      NewAuditEntry::update(
        actor,
        TrackedTable::Sentiment,
        &row.video_id,
        AuditPayload::from(&old),
        new,
      ),
      RecordOutcome::updated(),
    ),
  };
  audit::record(conn, &entry)?;
  Ok(outcome)
}

// ─── Markers and erasure ─────────────────────────────────────────────────────

pub fn mark_processed(
  conn: &Connection,
  actor: &str,
  run_id: Uuid,
  video_id: &str,
  completed_at: DateTime<Utc>,
) -> Result<RecordOutcome> {
  audit::record(
    conn,
    &NewAuditEntry::insert(
      actor,
      TrackedTable::VideoMetrics,
      video_id,
      AuditPayload::batch_marker(run_id, completed_at),
    ),
  )?;
  Ok(RecordOutcome::inserted())
}

/// Remove every row keyed by `video_id` from the fact table and its
/// dimensions, one audited DELETE per row that existed.
pub fn erase(conn: &Connection, actor: &str, video_id: &str) -> Result<usize> {
  let mut removed = 0;

  if let Some(old) = select_transcript(conn, video_id)? {
    conn.execute(
      "DELETE FROM dim_transcripts WHERE video_id = ?1",
      rusqlite::params![video_id],
    )?;
    audit::record(
      conn,
      &NewAuditEntry::delete(actor, TrackedTable::Transcripts, video_id, AuditPayload::from(&old)),
    )?;
    removed += 1;
  }

  if let Some(old) = select_info(conn, video_id)? {
    conn.execute(
      "DELETE FROM dim_video_info WHERE video_id = ?1",
      rusqlite::params![video_id],
    )?;
    audit::record(
      conn,
      &NewAuditEntry::delete(actor, TrackedTable::VideoInfo, video_id, AuditPayload::from(&old)),
    )?;
    removed += 1;
  }

  if let Some(old) = select_metrics(conn, video_id)? {
    conn.execute(
      "DELETE FROM fact_video_metrics WHERE video_id = ?1",
      rusqlite::params![video_id],
    )?;
    audit::record(
      conn,
      &NewAuditEntry::delete(actor, TrackedTable::VideoMetrics, video_id, AuditPayload::from(&old)),
    )?;
    removed += 1;
  }

  Ok(removed)
}
