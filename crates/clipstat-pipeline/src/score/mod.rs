//! Enrichment passes: read what is stored, derive a label per video, upsert
//! the labels through the warehouse's change-detecting protocol.

mod popularity;
mod sentiment;

pub use popularity::{
  POPULARITY_PERCENTILE, PopularityReport, ScoredVideo, log_features,
  percentile, score_popularity,
};
pub use sentiment::{SentimentReport, score_sentiment};
