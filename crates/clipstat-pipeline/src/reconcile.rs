//! The reconciliation orchestrator.
//!
//! One run takes a fixed set of video ids through these steps, each of which
//! commits on its own:
//!
//! 1. fetch details for every id concurrently; failures drop the id
//! 2. fill defaults for missing fields
//! 3. upsert `dim_video_info`
//! 4. append history snapshots where counts moved
//! 5. fetch transcripts for ids that have none on file
//! 6. upsert `fact_video_metrics`, then `dim_transcripts`
//! 7. optionally write one batch-completion audit marker per id
//!
//! Per-record failures inside a step are reported and skipped. A store error
//! at a step boundary aborts the rest of the run.

use chrono::Utc;
use clipstat_core::{
  batch::BatchReport,
  source::{TranscriptSource, VideoSource},
  store::Warehouse,
  video::{MetricSnapshot, Transcript, VideoDetails},
};
use uuid::Uuid;

use crate::{Error, ReconcileOptions, Result, fetch::fetch_all};

/// Outcome of one [`Reconciler::run`].
#[derive(Debug, Clone)]
pub struct RunReport {
  pub run_id:              Uuid,
  pub requested:           usize,
  pub fetched:             usize,
  pub info:                BatchReport,
  pub history:             BatchReport,
  pub transcripts_fetched: usize,
  pub metrics:             BatchReport,
  pub transcripts:         BatchReport,
  /// `None` unless batch markers are enabled.
  pub markers:             Option<BatchReport>,
}

impl RunReport {
  fn log(&self) {
    tracing::info!(
      run_id = %self.run_id,
      requested = self.requested,
      fetched = self.fetched,
      info_changed = self.info.changed(),
      snapshots = self.history.inserted,
      metrics_inserted = self.metrics.inserted,
      metrics_updated = self.metrics.updated,
      transcripts_fetched = self.transcripts_fetched,
      transcripts_written = self.transcripts.changed(),
      failed = self.info.failed.len()
        + self.history.failed.len()
        + self.metrics.failed.len()
        + self.transcripts.failed.len(),
      "reconciliation run complete"
    );
  }
}

pub struct Reconciler<W, V, T> {
  store:       W,
  videos:      V,
  transcripts: T,
  options:     ReconcileOptions,
}

impl<W, V, T> Reconciler<W, V, T>
where
  W: Warehouse,
  V: VideoSource,
  T: TranscriptSource,
{
  pub fn new(store: W, videos: V, transcripts: T, options: ReconcileOptions) -> Self {
    Self { store, videos, transcripts, options }
  }

  pub async fn run(&self, video_ids: &[String]) -> Result<RunReport> {
    let run_id = Uuid::new_v4();
    let actor = self.options.actor.as_str();
    tracing::info!(%run_id, requested = video_ids.len(), "starting reconciliation run");

    let details = self.fetch_details(video_ids).await;
    if details.is_empty() {
      tracing::error!(%run_id, "no video details were fetched");
      return Err(Error::NothingFetched);
    }
    let fetched = details.len();

    let now = Utc::now();
    let (infos, metrics): (Vec<_>, Vec<_>) = details
      .into_iter()
      .map(|d| d.fill_defaults(now))
      .map(|f| (f.info, f.metrics))
      .unzip();
    let row_ids: Vec<String> = metrics.iter().map(|m| m.video_id.clone()).collect();

    tracing::info!(rows = infos.len(), "upserting video info");
    let info = self
      .store
      .upsert_video_info(actor, infos)
      .await
      .map_err(Error::store)?;

    // Compared against the latest snapshot, before the fact row moves.
    let snapshots = metrics
      .iter()
      .map(|m| MetricSnapshot {
        video_id:    m.video_id.clone(),
        snapshot_at: now,
        counts:      m.counts,
      })
      .collect();
    let history = self
      .store
      .record_history(snapshots)
      .await
      .map_err(Error::store)?;
    tracing::info!(inserted = history.inserted, "history snapshots recorded");

    let on_file = self
      .store
      .transcript_ids(row_ids.clone())
      .await
      .map_err(Error::store)?;
    let missing: Vec<String> = row_ids
      .iter()
      .filter(|id| !on_file.contains(*id))
      .cloned()
      .collect();
    let transcripts = self.fetch_transcripts(&missing).await;
    let transcripts_fetched = transcripts.len();

    tracing::info!(rows = metrics.len(), "upserting video metrics and transcripts");
    let metrics = self
      .store
      .upsert_video_metrics(actor, metrics)
      .await
      .map_err(Error::store)?;
    let transcripts = self
      .store
      .upsert_transcripts(actor, transcripts)
      .await
      .map_err(Error::store)?;

    let markers = if self.options.emit_batch_markers {
      Some(
        self
          .store
          .record_batch_markers(actor, run_id, row_ids)
          .await
          .map_err(Error::store)?,
      )
    } else {
      None
    };

    let report = RunReport {
      run_id,
      requested: video_ids.len(),
      fetched,
      info,
      history,
      transcripts_fetched,
      metrics,
      transcripts,
      markers,
    };
    report.log();
    Ok(report)
  }

  /// Details for every id that could be fetched. Failed and unknown ids are
  /// logged and left out.
  async fn fetch_details(&self, video_ids: &[String]) -> Vec<VideoDetails> {
    tracing::info!(count = video_ids.len(), "fetching video details");

    let results = fetch_all(
      video_ids,
      self.options.fetch_concurrency,
      self.options.fetch_timeout,
      |id| self.videos.fetch_details(id),
    )
    .await;

    results
      .into_iter()
      .filter_map(|(video_id, result)| match result {
        Ok(Some(details)) => Some(details),
        Ok(None) => {
          tracing::warn!(%video_id, "no details returned; excluding from batch");
          None
        }
        Err(e) => {
          tracing::error!(%video_id, error = %e, "error fetching video details");
          None
        }
      })
      .collect()
  }

  /// One transcript per requested id; a failed fetch yields empty text.
  async fn fetch_transcripts(&self, video_ids: &[String]) -> Vec<Transcript> {
    tracing::info!(count = video_ids.len(), "fetching missing transcripts");

    let results = fetch_all(
      video_ids,
      self.options.fetch_concurrency,
      self.options.fetch_timeout,
      |id| self.transcripts.fetch_transcript(id),
    )
    .await;

    results
      .into_iter()
      .map(|(video_id, result)| {
        let text = match result {
          Ok(text) => text.unwrap_or_default(),
          Err(e) => {
            tracing::error!(%video_id, error = %e, "error fetching transcript");
            String::new()
          }
        };
        Transcript { video_id, text: Some(text) }
      })
      .collect()
  }
}
