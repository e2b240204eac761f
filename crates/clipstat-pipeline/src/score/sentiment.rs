use clipstat_core::{
  batch::BatchReport,
  label::{SentimentLabel, SentimentRecord},
  model::SentimentClassifier,
  store::Warehouse,
};

use crate::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct SentimentReport {
  pub scored:   usize,
  pub positive: usize,
  pub negative: usize,
  pub batch:    BatchReport,
}

/// Classify every stored transcript. Missing text is classified as empty.
pub async fn score_sentiment<W, C>(
  store: &W,
  classifier: &C,
  actor: &str,
) -> Result<SentimentReport>
where
  W: Warehouse,
  C: SentimentClassifier,
{
  let transcripts = store.list_transcripts().await.map_err(Error::store)?;
  if transcripts.is_empty() {
    tracing::warn!("no transcripts on file; nothing to score");
    return Ok(SentimentReport::default());
  }

  let records: Vec<SentimentRecord> = transcripts
    .iter()
    .map(|t| SentimentRecord {
      video_id:  t.video_id.clone(),
      sentiment: SentimentLabel::from_class(classifier.classify(t.text_or_empty())),
    })
    .collect();

  let positive = records
    .iter()
    .filter(|r| r.sentiment == SentimentLabel::Positive)
    .count();
  let scored = records.len();

  let batch = store
    .upsert_sentiment(actor, records)
    .await
    .map_err(Error::store)?;

  let report = SentimentReport {
    scored,
    positive,
    negative: scored - positive,
    batch,
  };
  tracing::info!(
    scored = report.scored,
    positive = report.positive,
    negative = report.negative,
    relabelled = report.batch.changed(),
    "sentiment scoring complete"
  );
  Ok(report)
}
