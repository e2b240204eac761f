use clipstat_core::{
  batch::BatchReport,
  label::{DerivedStat, PopularityLabel},
  model::{PopularityFeatures, PopularityScaler},
  store::Warehouse,
  video::MetricCounts,
};

use crate::{Error, Result};

/// Videos at or above this percentile of view counts are labelled popular.
pub const POPULARITY_PERCENTILE: f64 = 60.0;

/// `ln(1 + count)` for views, likes and comments.
pub fn log_features(counts: &MetricCounts) -> PopularityFeatures {
  [
    (counts.view_count as f64).ln_1p(),
    (counts.like_count as f64).ln_1p(),
    (counts.comment_count as f64).ln_1p(),
  ]
}

/// The `q`th percentile (0..=100) of `values`, interpolating linearly
/// between the closest ranks. `None` for an empty slice.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
  if values.is_empty() {
    return None;
  }
  let mut sorted = values.to_vec();
  sorted.sort_by(f64::total_cmp);

  let rank = q.clamp(0.0, 100.0) / 100.0 * (sorted.len() - 1) as f64;
  let lo = rank.floor() as usize;
  let hi = rank.ceil() as usize;
  let frac = rank - lo as f64;
  Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredVideo {
  pub video_id: String,
  pub scaled:   PopularityFeatures,
  pub label:    PopularityLabel,
}

#[derive(Debug, Clone, Default)]
pub struct PopularityReport {
  /// View-count threshold for this run; `None` when nothing was scored.
  pub threshold: Option<f64>,
  pub scored:    Vec<ScoredVideo>,
  pub batch:     BatchReport,
}

/// Label every stored video `Popular` or `Not Popular` against a threshold
/// recomputed from the current view counts.
pub async fn score_popularity<W, S>(
  store: &W,
  scaler: &S,
  actor: &str,
) -> Result<PopularityReport>
where
  W: Warehouse,
  S: PopularityScaler,
{
  let rows = store.list_video_metrics().await.map_err(Error::store)?;
  if rows.is_empty() {
    tracing::warn!("no video metrics on file; nothing to score");
    return Ok(PopularityReport::default());
  }

  let views: Vec<f64> = rows.iter().map(|r| r.counts.view_count as f64).collect();
  let threshold = percentile(&views, POPULARITY_PERCENTILE);
  let features: Vec<_> = rows.iter().map(|r| log_features(&r.counts)).collect();
  let scaled = scaler.score(&features);
  if scaled.len() != rows.len() {
    tracing::error!(
      expected = rows.len(),
      got = scaled.len(),
      "scaler output does not line up with its input"
    );
    return Err(Error::ScalerOutput { expected: rows.len(), got: scaled.len() });
  }

  let scored: Vec<ScoredVideo> = rows
    .iter()
    .zip(scaled)
    .map(|(row, scaled)| {
      let popular = threshold.is_some_and(|t| row.counts.view_count as f64 >= t);
      ScoredVideo {
        video_id: row.video_id.clone(),
        scaled,
        label: if popular {
          PopularityLabel::Popular
        } else {
          PopularityLabel::NotPopular
        },
      }
    })
    .collect();

  let stats = scored
    .iter()
    .map(|s| DerivedStat { video_id: s.video_id.clone(), popularity: s.label })
    .collect();
  let batch = store
    .upsert_popularity(actor, stats)
    .await
    .map_err(Error::store)?;

  tracing::info!(
    threshold,
    scored = scored.len(),
    popular = scored
      .iter()
      .filter(|s| s.label == PopularityLabel::Popular)
      .count(),
    relabelled = batch.changed(),
    "popularity scoring complete"
  );
  Ok(PopularityReport { threshold, scored, batch })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn percentile_hits_exact_rank() {
    let views = [9000.0, 10.0, 1000.0, 100.0, 5000.0, 500.0];
    assert_eq!(percentile(&views, 60.0), Some(1000.0));
  }

  #[test]
  fn percentile_interpolates_between_ranks() {
    assert_eq!(percentile(&[0.0, 10.0], 25.0), Some(2.5));
    assert_eq!(percentile(&[1.0, 2.0, 3.0, 4.0], 50.0), Some(2.5));
  }

  #[test]
  fn percentile_edges() {
    assert_eq!(percentile(&[], 60.0), None);
    assert_eq!(percentile(&[7.0], 60.0), Some(7.0));
    assert_eq!(percentile(&[1.0, 9.0], 0.0), Some(1.0));
    assert_eq!(percentile(&[1.0, 9.0], 100.0), Some(9.0));
  }

  #[test]
  fn log_features_are_log1p() {
    let counts = MetricCounts { view_count: 0, like_count: 1, comment_count: 99 };
    let [v, l, c] = log_features(&counts);
    assert_eq!(v, 0.0);
    assert!((l - 2f64.ln()).abs() < 1e-12);
    assert!((c - 100f64.ln()).abs() < 1e-12);
  }
}
