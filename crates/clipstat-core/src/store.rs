//! The `Warehouse` trait.
//!
//! Implemented by storage backends (e.g. `clipstat-store-sqlite`). The
//! reconciliation pipeline and the scorers depend on this abstraction, not on
//! a concrete backend.

use std::{collections::HashSet, future::Future};

use uuid::Uuid;

use crate::{
  audit::{AuditEntry, NewAuditEntry, TrackedTable},
  batch::{BatchReport, Change},
  label::{DerivedStat, SentimentRecord},
  video::{MetricSnapshot, Transcript, VideoInfo, VideoMetrics},
};

/// Abstraction over the star-schema warehouse.
///
/// Every upsert follows the same protocol: look up the existing row, compare
/// the tracked fields, then insert (auditing `prior = null`), update
/// (auditing both states) or do nothing. A write and its audit entry commit
/// or roll back together.
///
/// Batch methods run in one transaction per call. A failing record is
/// rolled back on its own and reported in the [`BatchReport`]; only
/// connection-level failures surface as `Err`.
pub trait Warehouse: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Audit recorder ────────────────────────────────────────────────────

  /// Append one audit entry in its own transaction.
  fn record_audit(
    &self,
    entry: NewAuditEntry,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Append one batch-completion marker per identifier against the metrics
  /// table.
  fn record_batch_markers<'a>(
    &'a self,
    actor: &'a str,
    run_id: Uuid,
    video_ids: Vec<String>,
  ) -> impl Future<Output = Result<BatchReport, Self::Error>> + Send + 'a;

  // ── Metric store ──────────────────────────────────────────────────────

  fn upsert_video_info<'a>(
    &'a self,
    actor: &'a str,
    rows: Vec<VideoInfo>,
  ) -> impl Future<Output = Result<BatchReport, Self::Error>> + Send + 'a;

  /// Upsert fact rows. A placeholder `Not Rated Yet` popularity label is
  /// created for any identifier that lacks one.
  fn upsert_video_metrics<'a>(
    &'a self,
    actor: &'a str,
    rows: Vec<VideoMetrics>,
  ) -> impl Future<Output = Result<BatchReport, Self::Error>> + Send + 'a;

  /// Upsert transcripts. Rows without a parent metrics row are skipped with
  /// a warning.
  fn upsert_transcripts<'a>(
    &'a self,
    actor: &'a str,
    rows: Vec<Transcript>,
  ) -> impl Future<Output = Result<BatchReport, Self::Error>> + Send + 'a;

  fn upsert_popularity<'a>(
    &'a self,
    actor: &'a str,
    rows: Vec<DerivedStat>,
  ) -> impl Future<Output = Result<BatchReport, Self::Error>> + Send + 'a;

  fn upsert_sentiment<'a>(
    &'a self,
    actor: &'a str,
    rows: Vec<SentimentRecord>,
  ) -> impl Future<Output = Result<BatchReport, Self::Error>> + Send + 'a;

  /// Delete the metrics, info and transcript rows for one identifier,
  /// auditing each deletion. Returns the number of rows removed.
  fn erase_video<'a>(
    &'a self,
    actor: &'a str,
    video_id: &'a str,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  // ── History tracker ───────────────────────────────────────────────────

  /// Append `snapshot` unless the latest snapshot for the same identifier
  /// has identical counts.
  fn maybe_snapshot(
    &self,
    snapshot: MetricSnapshot,
  ) -> impl Future<Output = Result<Change, Self::Error>> + Send + '_;

  /// Batch form of [`Warehouse::maybe_snapshot`].
  fn record_history(
    &self,
    snapshots: Vec<MetricSnapshot>,
  ) -> impl Future<Output = Result<BatchReport, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// The subset of `video_ids` that already have a transcript row.
  fn transcript_ids(
    &self,
    video_ids: Vec<String>,
  ) -> impl Future<Output = Result<HashSet<String>, Self::Error>> + Send + '_;

  fn list_video_metrics(
    &self,
  ) -> impl Future<Output = Result<Vec<VideoMetrics>, Self::Error>> + Send + '_;

  fn list_transcripts(
    &self,
  ) -> impl Future<Output = Result<Vec<Transcript>, Self::Error>> + Send + '_;

  fn get_video_metrics<'a>(
    &'a self,
    video_id: &'a str,
  ) -> impl Future<Output = Result<Option<VideoMetrics>, Self::Error>> + Send + 'a;

  fn get_video_info<'a>(
    &'a self,
    video_id: &'a str,
  ) -> impl Future<Output = Result<Option<VideoInfo>, Self::Error>> + Send + 'a;

  fn get_transcript<'a>(
    &'a self,
    video_id: &'a str,
  ) -> impl Future<Output = Result<Option<Transcript>, Self::Error>> + Send + 'a;

  fn get_popularity<'a>(
    &'a self,
    video_id: &'a str,
  ) -> impl Future<Output = Result<Option<DerivedStat>, Self::Error>> + Send + 'a;

  fn get_sentiment<'a>(
    &'a self,
    video_id: &'a str,
  ) -> impl Future<Output = Result<Option<SentimentRecord>, Self::Error>> + Send + 'a;

  /// All snapshots for one identifier, oldest first.
  fn history<'a>(
    &'a self,
    video_id: &'a str,
  ) -> impl Future<Output = Result<Vec<MetricSnapshot>, Self::Error>> + Send + 'a;

  /// Audit entries in write order, optionally restricted to one table.
  fn audit_log(
    &self,
    table: Option<TrackedTable>,
  ) -> impl Future<Output = Result<Vec<AuditEntry>, Self::Error>> + Send + '_;
}
