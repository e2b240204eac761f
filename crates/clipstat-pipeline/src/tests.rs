//! End-to-end runs of the reconciler and scorers against an in-memory
//! SQLite warehouse and in-process upstream fakes.

use std::{
  collections::{HashMap, HashSet},
  sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
  },
  time::Duration,
};

use chrono::{TimeZone, Utc};
use clipstat_core::{
  audit::{AuditAction, AuditPayload, TrackedTable},
  label::{PopularityLabel, SentimentLabel},
  model::{PopularityFeatures, PopularityScaler, SentimentClassifier},
  source::{TranscriptSource, VideoSource},
  store::Warehouse,
  video::{MetricCounts, VideoDetails, VideoMetrics},
};
use clipstat_store_sqlite::SqliteStore;

use crate::{
  Error, ReconcileOptions, Reconciler,
  ids::discover_video_ids,
  score::{score_popularity, score_sentiment},
};

// ─── Fakes ───────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("upstream unavailable for {0}")]
struct FakeError(String);

#[derive(Clone, Default)]
struct FakeVideos {
  details: Arc<Mutex<HashMap<String, VideoDetails>>>,
  failing: Arc<Mutex<HashSet<String>>>,
}

impl FakeVideos {
  fn set_views(&self, id: &str, views: u64) {
    let details = VideoDetails {
      video_id: id.into(),
      title: Some(format!("Talk {id}")),
      description: Some("A talk".into()),
      published_at: Some(Utc.with_ymd_and_hms(2022, 5, 4, 18, 30, 0).unwrap()),
      view_count: Some(views),
      like_count: Some(views / 10),
      comment_count: Some(1),
      duration: Some("PT9M".into()),
      category: Some("27".into()),
      tags: vec!["tedx".into()],
    };
    self.details.lock().unwrap().insert(id.into(), details);
  }

  fn fail(&self, id: &str) { self.failing.lock().unwrap().insert(id.into()); }
}

impl VideoSource for FakeVideos {
  type Error = FakeError;

  async fn fetch_details(&self, video_id: &str) -> Result<Option<VideoDetails>, FakeError> {
    if self.failing.lock().unwrap().contains(video_id) {
      return Err(FakeError(video_id.into()));
    }
    Ok(self.details.lock().unwrap().get(video_id).cloned())
  }
}

#[derive(Clone, Default)]
struct FakeTranscripts {
  texts:   Arc<Mutex<HashMap<String, String>>>,
  failing: Arc<Mutex<HashSet<String>>>,
  calls:   Arc<AtomicUsize>,
}

impl FakeTranscripts {
  fn set(&self, id: &str, text: &str) {
    self.texts.lock().unwrap().insert(id.into(), text.into());
  }

  fn fail(&self, id: &str) { self.failing.lock().unwrap().insert(id.into()); }

  fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

impl TranscriptSource for FakeTranscripts {
  type Error = FakeError;

  async fn fetch_transcript(&self, video_id: &str) -> Result<Option<String>, FakeError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    if self.failing.lock().unwrap().contains(video_id) {
      return Err(FakeError(video_id.into()));
    }
    Ok(self.texts.lock().unwrap().get(video_id).cloned())
  }
}

struct Harness {
  store:       SqliteStore,
  videos:      FakeVideos,
  transcripts: FakeTranscripts,
}

impl Harness {
  async fn new() -> Self {
    Self {
      store:       SqliteStore::open_in_memory().await.expect("in-memory store"),
      videos:      FakeVideos::default(),
      transcripts: FakeTranscripts::default(),
    }
  }

  fn reconciler(
    &self,
    options: ReconcileOptions,
  ) -> Reconciler<SqliteStore, FakeVideos, FakeTranscripts> {
    Reconciler::new(
      self.store.clone(),
      self.videos.clone(),
      self.transcripts.clone(),
      options,
    )
  }

  async fn run(&self, ids: &[&str]) -> crate::Result<crate::RunReport> {
    let ids: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
    self.reconciler(ReconcileOptions::default()).run(&ids).await
  }

  async fn audits(&self) -> usize { self.store.audit_log(None).await.unwrap().len() }
}

// ─── Reconciliation ──────────────────────────────────────────────────────────

#[tokio::test]
async fn new_then_changed_video_is_inserted_then_updated() {
  let h = Harness::new().await;
  h.videos.set_views("abc123", 100);
  h.transcripts.set("abc123", "hello bees");

  let report = h.run(&["abc123"]).await.unwrap();
  assert_eq!(report.fetched, 1);
  assert_eq!(report.metrics.inserted, 1);

  let log = h.store.audit_log(Some(TrackedTable::VideoMetrics)).await.unwrap();
  assert_eq!(log.len(), 1);
  assert_eq!(log[0].action, AuditAction::Insert);
  assert!(log[0].prior.is_none());
  assert_eq!(h.store.history("abc123").await.unwrap().len(), 1);
  let stat = h.store.get_popularity("abc123").await.unwrap().unwrap();
  assert_eq!(stat.popularity, PopularityLabel::NotRatedYet);

  h.videos.set_views("abc123", 150);
  let report = h.run(&["abc123"]).await.unwrap();
  assert_eq!(report.metrics.updated, 1);

  let log = h.store.audit_log(Some(TrackedTable::VideoMetrics)).await.unwrap();
  assert_eq!(log.len(), 2);
  assert_eq!(log[1].action, AuditAction::Update);
  assert_eq!(log[1].prior.as_ref().and_then(AuditPayload::view_count), Some(100));
  assert_eq!(log[1].new.as_ref().and_then(AuditPayload::view_count), Some(150));

  let history = h.store.history("abc123").await.unwrap();
  assert_eq!(
    history.iter().map(|s| s.counts.view_count).collect::<Vec<_>>(),
    vec![100, 150]
  );
}

#[tokio::test]
async fn rerun_with_identical_upstream_writes_nothing() {
  let h = Harness::new().await;
  h.videos.set_views("abc123", 100);
  h.videos.set_views("def456", 2000);
  h.transcripts.set("abc123", "hello");

  h.run(&["abc123", "def456"]).await.unwrap();
  let audits = h.audits().await;
  let snapshots = h.store.history("abc123").await.unwrap().len()
    + h.store.history("def456").await.unwrap().len();

  let report = h.run(&["abc123", "def456"]).await.unwrap();
  assert_eq!(report.metrics.unchanged, 2);
  assert_eq!(report.info.unchanged, 2);
  assert_eq!(report.history.inserted, 0);
  assert_eq!(h.audits().await, audits);
  assert_eq!(
    h.store.history("abc123").await.unwrap().len()
      + h.store.history("def456").await.unwrap().len(),
    snapshots
  );
}

#[tokio::test]
async fn failed_fetch_excludes_only_that_video() {
  let h = Harness::new().await;
  h.videos.set_views("good", 10);
  h.videos.set_views("bad", 20);
  h.videos.fail("bad");

  let report = h.run(&["good", "bad", "unknown"]).await.unwrap();
  assert_eq!(report.requested, 3);
  assert_eq!(report.fetched, 1);
  assert!(h.store.get_video_metrics("good").await.unwrap().is_some());
  assert!(h.store.get_video_metrics("bad").await.unwrap().is_none());
  assert!(h.store.get_video_metrics("unknown").await.unwrap().is_none());
}

#[tokio::test]
async fn nothing_fetched_is_an_error() {
  let h = Harness::new().await;
  h.videos.fail("abc123");

  let err = h.run(&["abc123"]).await.unwrap_err();
  assert!(matches!(err, Error::NothingFetched));
  assert_eq!(h.audits().await, 0);
}

#[tokio::test]
async fn transcript_failure_stores_empty_text() {
  let h = Harness::new().await;
  h.videos.set_views("abc123", 100);
  h.transcripts.fail("abc123");

  h.run(&["abc123"]).await.unwrap();
  let transcript = h.store.get_transcript("abc123").await.unwrap().unwrap();
  assert_eq!(transcript.text_or_empty(), "");
}

#[tokio::test]
async fn transcripts_on_file_are_not_refetched() {
  let h = Harness::new().await;
  h.videos.set_views("abc123", 100);
  h.transcripts.set("abc123", "first version");

  h.run(&["abc123"]).await.unwrap();
  assert_eq!(h.transcripts.calls(), 1);

  h.transcripts.set("abc123", "second version");
  let report = h.run(&["abc123"]).await.unwrap();
  assert_eq!(h.transcripts.calls(), 1);
  assert_eq!(report.transcripts_fetched, 0);

  let transcript = h.store.get_transcript("abc123").await.unwrap().unwrap();
  assert_eq!(transcript.text.as_deref(), Some("first version"));
}

#[tokio::test]
async fn batch_markers_are_written_when_enabled() {
  let h = Harness::new().await;
  h.videos.set_views("abc123", 100);
  h.videos.set_views("def456", 200);

  let options = ReconcileOptions { emit_batch_markers: true, ..Default::default() };
  let ids = vec!["abc123".to_string(), "def456".to_string()];
  let report = h.reconciler(options).run(&ids).await.unwrap();

  let markers = report.markers.expect("markers enabled");
  assert_eq!(markers.inserted, 2);

  let log = h.store.audit_log(Some(TrackedTable::VideoMetrics)).await.unwrap();
  let run_markers: Vec<_> = log
    .iter()
    .filter(|e| {
      matches!(
        e.new,
        Some(AuditPayload::BatchMarker { run_id, .. }) if run_id == report.run_id
      )
    })
    .collect();
  assert_eq!(run_markers.len(), 2);
}

#[tokio::test]
async fn slow_upstream_times_out_without_blocking_others() {
  #[derive(Clone)]
  struct Slow(FakeVideos);

  impl VideoSource for Slow {
    type Error = FakeError;

    async fn fetch_details(
      &self,
      video_id: &str,
    ) -> Result<Option<VideoDetails>, FakeError> {
      if video_id == "slow" {
        tokio::time::sleep(Duration::from_secs(5)).await;
      }
      self.0.fetch_details(video_id).await
    }
  }

  let h = Harness::new().await;
  h.videos.set_views("fast", 1);
  h.videos.set_views("slow", 2);

  let options = ReconcileOptions {
    fetch_timeout: Duration::from_millis(50),
    ..Default::default()
  };
  let reconciler = Reconciler::new(
    h.store.clone(),
    Slow(h.videos.clone()),
    h.transcripts.clone(),
    options,
  );
  let report = reconciler
    .run(&["fast".to_string(), "slow".to_string()])
    .await
    .unwrap();

  assert_eq!(report.fetched, 1);
  assert!(h.store.get_video_metrics("fast").await.unwrap().is_some());
  assert!(h.store.get_video_metrics("slow").await.unwrap().is_none());
}

#[tokio::test]
async fn missing_table_aborts_the_rest_of_the_run() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("warehouse.db");
  let store = SqliteStore::open(&path).await.unwrap();

  // Break the history step from outside the store's own connection.
  rusqlite::Connection::open(&path)
    .unwrap()
    .execute_batch("DROP TABLE fact_video_metrics_history;")
    .unwrap();

  let videos = FakeVideos::default();
  videos.set_views("abc123", 100);
  let transcripts = FakeTranscripts::default();
  transcripts.set("abc123", "hello");

  let options = ReconcileOptions { emit_batch_markers: true, ..Default::default() };
  let reconciler =
    Reconciler::new(store.clone(), videos, transcripts.clone(), options);
  let err = reconciler.run(&["abc123".to_string()]).await.unwrap_err();
  assert!(matches!(err, Error::Store(_)), "{err}");

  // Info was committed before the failing step; nothing after it ran.
  assert!(store.get_video_info("abc123").await.unwrap().is_some());
  assert_eq!(transcripts.calls(), 0);
  assert!(store.get_video_metrics("abc123").await.unwrap().is_none());
  assert!(store.get_transcript("abc123").await.unwrap().is_none());
  let log = store.audit_log(Some(TrackedTable::VideoMetrics)).await.unwrap();
  assert!(log.is_empty());
}

// ─── Scoring ─────────────────────────────────────────────────────────────────

struct Identity;

impl PopularityScaler for Identity {
  fn score(&self, features: &[PopularityFeatures]) -> Vec<PopularityFeatures> {
    features.to_vec()
  }
}

/// Positive iff the text mentions "love".
struct Keyword;

impl SentimentClassifier for Keyword {
  fn classify(&self, text: &str) -> u8 { u8::from(text.contains("love")) }
}

fn metrics_row(id: &str, views: u64) -> VideoMetrics {
  VideoMetrics {
    video_id:     id.into(),
    published_at: Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap(),
    counts:       MetricCounts { view_count: views, ..Default::default() },
    duration:     "PT5M".into(),
  }
}

#[tokio::test]
async fn popularity_threshold_is_the_sixtieth_percentile() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let views = [10, 100, 500, 1000, 5000, 9000];
  let rows = views
    .iter()
    .map(|v| metrics_row(&format!("v{v}"), *v))
    .collect();
  store.upsert_video_metrics("system", rows).await.unwrap();

  let report = score_popularity(&store, &Identity, "system").await.unwrap();
  assert_eq!(report.threshold, Some(1000.0));
  assert_eq!(report.batch.updated, 6);

  for v in views {
    let stat = store.get_popularity(&format!("v{v}")).await.unwrap().unwrap();
    let expected = if v >= 1000 {
      PopularityLabel::Popular
    } else {
      PopularityLabel::NotPopular
    };
    assert_eq!(stat.popularity, expected, "views = {v}");
  }

  let stat_audits = store.audit_log(Some(TrackedTable::Stats)).await.unwrap().len();
  let rerun = score_popularity(&store, &Identity, "system").await.unwrap();
  assert_eq!(rerun.batch.unchanged, 6);
  assert_eq!(
    store.audit_log(Some(TrackedTable::Stats)).await.unwrap().len(),
    stat_audits
  );
}

/// Drops every row it is given.
struct Lossy;

impl PopularityScaler for Lossy {
  fn score(&self, _: &[PopularityFeatures]) -> Vec<PopularityFeatures> { Vec::new() }
}

#[tokio::test]
async fn short_scaler_output_is_an_error() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  store
    .upsert_video_metrics("system", vec![metrics_row("a", 10), metrics_row("b", 20)])
    .await
    .unwrap();
  let stat_audits = store.audit_log(Some(TrackedTable::Stats)).await.unwrap().len();

  let err = score_popularity(&store, &Lossy, "system").await.unwrap_err();
  assert!(matches!(err, Error::ScalerOutput { expected: 2, got: 0 }), "{err}");

  // Placeholders stay in place; nothing was relabelled.
  let stat = store.get_popularity("a").await.unwrap().unwrap();
  assert_eq!(stat.popularity, PopularityLabel::NotRatedYet);
  assert_eq!(
    store.audit_log(Some(TrackedTable::Stats)).await.unwrap().len(),
    stat_audits
  );
}

#[tokio::test]
async fn popularity_over_empty_store_is_a_no_op() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let report = score_popularity(&store, &Identity, "system").await.unwrap();
  assert!(report.threshold.is_none());
  assert!(report.scored.is_empty());
}

#[tokio::test]
async fn sentiment_labels_every_transcript() {
  let h = Harness::new().await;
  h.videos.set_views("happy", 1);
  h.videos.set_views("quiet", 2);
  h.transcripts.set("happy", "we love bees");
  h.run(&["happy", "quiet"]).await.unwrap();

  let report = score_sentiment(&h.store, &Keyword, "system").await.unwrap();
  assert_eq!(report.scored, 2);
  assert_eq!(report.positive, 1);
  assert_eq!(report.negative, 1);

  let happy = h.store.get_sentiment("happy").await.unwrap().unwrap();
  assert_eq!(happy.sentiment, SentimentLabel::Positive);
  // No transcript upstream: stored as empty text, classified negative.
  let quiet = h.store.get_sentiment("quiet").await.unwrap().unwrap();
  assert_eq!(quiet.sentiment, SentimentLabel::Negative);

  let rerun = score_sentiment(&h.store, &Keyword, "system").await.unwrap();
  assert_eq!(rerun.batch.changed(), 0);
}

// ─── Working set ─────────────────────────────────────────────────────────────

#[test]
fn ids_come_from_file_stems() {
  let dir = tempfile::tempdir().unwrap();
  for name in ["abc123.mp4", "abc123.json", "def456", ".hidden"] {
    std::fs::write(dir.path().join(name), b"").unwrap();
  }
  std::fs::create_dir(dir.path().join("nested.dir")).unwrap();

  let ids = discover_video_ids(dir.path()).unwrap();
  assert_eq!(ids, vec!["abc123".to_string(), "def456".to_string()]);
}

#[test]
fn ids_dir_must_exist_and_be_non_empty() {
  let dir = tempfile::tempdir().unwrap();
  assert!(matches!(
    discover_video_ids(dir.path()),
    Err(Error::NoVideoIds(_))
  ));
  assert!(matches!(
    discover_video_ids(&dir.path().join("missing")),
    Err(Error::MissingIdsDir(_))
  ));
}
