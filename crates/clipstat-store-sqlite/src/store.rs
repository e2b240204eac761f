//! [`SqliteStore`] — the SQLite implementation of [`Warehouse`].

use std::{collections::HashSet, path::Path};

use chrono::Utc;
use clipstat_core::{
  audit::{AuditEntry, NewAuditEntry, TrackedTable},
  batch::{BatchReport, Change, RecordOutcome},
  label::{DerivedStat, SentimentRecord},
  store::Warehouse,
  video::{MetricSnapshot, Transcript, VideoInfo, VideoMetrics},
};
use uuid::Uuid;

use crate::{
  Result, audit,
  batch::{in_transaction, run_batch},
  encode::{METRICS_COLUMNS, RawAuditEntry, RawSnapshot, RawVideoMetrics},
  history,
  schema::SCHEMA,
  upsert,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A clipstat warehouse backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::info!("warehouse tables created or already present");
    Ok(())
  }
}

// ─── Warehouse impl ──────────────────────────────────────────────────────────

impl Warehouse for SqliteStore {
  type Error = crate::Error;

  // ── Audit recorder ────────────────────────────────────────────────────────

  async fn record_audit(&self, entry: NewAuditEntry) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        Ok(in_transaction(conn, |tx| audit::record(tx, &entry)))
      })
      .await?
  }

  async fn record_batch_markers(
    &self,
    actor: &str,
    run_id: Uuid,
    video_ids: Vec<String>,
  ) -> Result<BatchReport> {
    let actor = actor.to_owned();
    let completed_at = Utc::now();

    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(run_batch(conn, "audit_logs", &video_ids, String::as_str, |c, id| {
            upsert::mark_processed(c, &actor, run_id, id, completed_at)
          }))
        })
        .await??,
    )
  }

  // ── Metric store ──────────────────────────────────────────────────────────

  async fn upsert_video_info(
    &self,
    actor: &str,
    rows: Vec<VideoInfo>,
  ) -> Result<BatchReport> {
    let actor = actor.to_owned();

    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(run_batch(
            conn,
            "dim_video_info",
            &rows,
            |r| r.video_id.as_str(),
            |c, r| upsert::upsert_info(c, &actor, r),
          ))
        })
        .await??,
    )
  }

  async fn upsert_video_metrics(
    &self,
    actor: &str,
    rows: Vec<VideoMetrics>,
  ) -> Result<BatchReport> {
    let actor = actor.to_owned();

    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(run_batch(
            conn,
            "fact_video_metrics",
            &rows,
            |r| r.video_id.as_str(),
            |c, r| upsert::upsert_metrics(c, &actor, r),
          ))
        })
        .await??,
    )
  }

  async fn upsert_transcripts(
    &self,
    actor: &str,
    rows: Vec<Transcript>,
  ) -> Result<BatchReport> {
    let actor = actor.to_owned();

    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(run_batch(
            conn,
            "dim_transcripts",
            &rows,
            |r| r.video_id.as_str(),
            |c, r| upsert::upsert_transcript(c, &actor, r),
          ))
        })
        .await??,
    )
  }

  async fn upsert_popularity(
    &self,
    actor: &str,
    rows: Vec<DerivedStat>,
  ) -> Result<BatchReport> {
    let actor = actor.to_owned();

    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(run_batch(
            conn,
            "dim_stats",
            &rows,
            |r| r.video_id.as_str(),
            |c, r| upsert::upsert_stat(c, &actor, r),
          ))
        })
        .await??,
    )
  }

  async fn upsert_sentiment(
    &self,
    actor: &str,
    rows: Vec<SentimentRecord>,
  ) -> Result<BatchReport> {
    let actor = actor.to_owned();

    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(run_batch(
            conn,
            "dim_sentiment",
            &rows,
            |r| r.video_id.as_str(),
            |c, r| upsert::upsert_sentiment(c, &actor, r),
          ))
        })
        .await??,
    )
  }

  async fn erase_video(&self, actor: &str, video_id: &str) -> Result<usize> {
    let actor = actor.to_owned();
    let id = video_id.to_owned();

    let removed = self
      .conn
      .call(move |conn| {
        Ok(in_transaction(conn, |tx| upsert::erase(tx, &actor, &id)))
      })
      .await??;

    tracing::info!(video_id, removed, "erased video data");
    Ok(removed)
  }

  // ── History tracker ───────────────────────────────────────────────────────

  async fn maybe_snapshot(&self, snapshot: MetricSnapshot) -> Result<Change> {
    self
      .conn
      .call(move |conn| {
        Ok(in_transaction(conn, |tx| history::maybe_snapshot(tx, &snapshot)))
      })
      .await?
  }

  async fn record_history(&self, snapshots: Vec<MetricSnapshot>) -> Result<BatchReport> {
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(run_batch(
            conn,
            "fact_video_metrics_history",
            &snapshots,
            |s| s.video_id.as_str(),
            |c, s| {
              history::maybe_snapshot(c, s).map(|change| match change {
                Change::Inserted => RecordOutcome::inserted(),
                _ => RecordOutcome::unchanged(),
              })
            },
          ))
        })
        .await??,
    )
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn transcript_ids(&self, video_ids: Vec<String>) -> Result<HashSet<String>> {
    Ok(
      self
        .conn
        .call(move |conn| {
          let mut stmt =
            conn.prepare("SELECT 1 FROM dim_transcripts WHERE video_id = ?1")?;
          let mut present = HashSet::new();
          for id in video_ids {
            if stmt.exists(rusqlite::params![id])? {
              present.insert(id);
            }
          }
          Ok(present)
        })
        .await?,
    )
  }

  async fn list_video_metrics(&self) -> Result<Vec<VideoMetrics>> {
    let raws: Vec<RawVideoMetrics> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {METRICS_COLUMNS} FROM fact_video_metrics ORDER BY video_id"
        ))?;
        let rows = stmt
          .query_map([], RawVideoMetrics::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVideoMetrics::into_metrics).collect()
  }

  async fn list_transcripts(&self) -> Result<Vec<Transcript>> {
    Ok(
      self
        .conn
        .call(|conn| {
          let mut stmt = conn.prepare(
            "SELECT video_id, transcript FROM dim_transcripts ORDER BY video_id",
          )?;
          let rows = stmt
            .query_map([], |row| {
              Ok(Transcript { video_id: row.get(0)?, text: row.get(1)? })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?,
    )
  }

  async fn get_video_metrics(&self, video_id: &str) -> Result<Option<VideoMetrics>> {
    let id = video_id.to_owned();
    self
      .conn
      .call(move |conn| Ok(upsert::select_metrics(conn, &id)))
      .await?
  }

  async fn get_video_info(&self, video_id: &str) -> Result<Option<VideoInfo>> {
    let id = video_id.to_owned();
    self
      .conn
      .call(move |conn| Ok(upsert::select_info(conn, &id)))
      .await?
  }

  async fn get_transcript(&self, video_id: &str) -> Result<Option<Transcript>> {
    let id = video_id.to_owned();
    self
      .conn
      .call(move |conn| Ok(upsert::select_transcript(conn, &id)))
      .await?
  }

  async fn get_popularity(&self, video_id: &str) -> Result<Option<DerivedStat>> {
    let id = video_id.to_owned();
    self
      .conn
      .call(move |conn| Ok(upsert::select_stat(conn, &id)))
      .await?
  }

  async fn get_sentiment(&self, video_id: &str) -> Result<Option<SentimentRecord>> {
    let id = video_id.to_owned();
    self
      .conn
      .call(move |conn| Ok(upsert::select_sentiment(conn, &id)))
      .await?
  }

  async fn history(&self, video_id: &str) -> Result<Vec<MetricSnapshot>> {
    let id = video_id.to_owned();
    let raws: Vec<RawSnapshot> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT video_id, snapshot_date, view_count, like_count, comment_count
           FROM fact_video_metrics_history
           WHERE video_id = ?1
           ORDER BY snapshot_date ASC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id], RawSnapshot::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSnapshot::into_snapshot).collect()
  }

  async fn audit_log(&self, table: Option<TrackedTable>) -> Result<Vec<AuditEntry>> {
    let table_str = table.map(TrackedTable::as_str);

    let raws: Vec<RawAuditEntry> = self
      .conn
      .call(move |conn| {
        let columns = "audit_id, user_id, action, table_name, record_id,
                       old_values, new_values, action_time";
        let rows = if let Some(t) = table_str {
          let mut stmt = conn.prepare(&format!(
            "SELECT {columns} FROM audit_logs WHERE table_name = ?1 ORDER BY audit_id"
          ))?;
          stmt
            .query_map(rusqlite::params![t], RawAuditEntry::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn
            .prepare(&format!("SELECT {columns} FROM audit_logs ORDER BY audit_id"))?;
          stmt
            .query_map([], RawAuditEntry::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAuditEntry::into_entry).collect()
  }
}
