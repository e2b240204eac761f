//! Pretrained scoring functions consumed by the enrichment scorers.
//!
//! Both are treated as pure functions; loading and training live elsewhere.

/// `[log_views, log_likes, log_comments]`, each `ln(1 + count)`.
pub type PopularityFeatures = [f64; 3];

/// Feature scaler fitted offline on the popularity training set.
pub trait PopularityScaler: Send + Sync {
  fn score(&self, features: &[PopularityFeatures]) -> Vec<PopularityFeatures>;
}

/// Binary transcript classifier. `1` means positive.
pub trait SentimentClassifier: Send + Sync {
  fn classify(&self, text: &str) -> u8;
}
