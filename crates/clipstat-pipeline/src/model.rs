//! File-backed implementations of the scoring seams.
//!
//! Training happens offline; the fitted parameters are exported as JSON and
//! read from the configured model directory.

use std::{collections::HashMap, path::Path};

use clipstat_core::model::{PopularityFeatures, PopularityScaler, SentimentClassifier};
use serde::{Deserialize, de::DeserializeOwned};

use crate::{Error, Result};

pub const SCALER_FILE: &str = "popularity_scaler.json";
pub const SENTIMENT_FILE: &str = "sentiment_model.json";

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
  let raw = std::fs::read_to_string(path).map_err(|source| Error::Io {
    path: path.to_path_buf(),
    source,
  })?;
  let value = serde_json::from_str(&raw).map_err(|source| Error::Model {
    path: path.to_path_buf(),
    source,
  })?;
  tracing::info!(path = %path.display(), "model loaded");
  Ok(value)
}

// ─── Popularity ──────────────────────────────────────────────────────────────

/// Standardising scaler: `(x - mean) / scale` per feature.
#[derive(Debug, Clone, Deserialize)]
pub struct StandardScaler {
  pub mean:  PopularityFeatures,
  pub scale: PopularityFeatures,
}

impl StandardScaler {
  pub fn load(model_dir: &Path) -> Result<Self> {
    load_json(&model_dir.join(SCALER_FILE))
  }
}

impl PopularityScaler for StandardScaler {
  fn score(&self, features: &[PopularityFeatures]) -> Vec<PopularityFeatures> {
    features
      .iter()
      .map(|row| {
        std::array::from_fn(|i| {
          // A constant training feature has zero scale.
          let scale = if self.scale[i] == 0.0 { 1.0 } else { self.scale[i] };
          (row[i] - self.mean[i]) / scale
        })
      })
      .collect()
  }
}

// ─── Sentiment ───────────────────────────────────────────────────────────────

/// Linear bag-of-words classifier over term frequencies.
#[derive(Debug, Clone, Deserialize)]
pub struct LinearSentimentModel {
  pub weights:   HashMap<String, f64>,
  #[serde(default)]
  pub intercept: f64,
}

impl LinearSentimentModel {
  pub fn load(model_dir: &Path) -> Result<Self> {
    load_json(&model_dir.join(SENTIMENT_FILE))
  }

  pub fn decision(&self, text: &str) -> f64 {
    let tokens = tokenize(text);
    if tokens.is_empty() {
      return self.intercept;
    }
    let n = tokens.len() as f64;
    let score: f64 = tokens
      .iter()
      .filter_map(|t| self.weights.get(t.as_str()))
      .sum();
    self.intercept + score / n
  }
}

impl SentimentClassifier for LinearSentimentModel {
  fn classify(&self, text: &str) -> u8 { u8::from(self.decision(text) > 0.0) }
}

fn tokenize(text: &str) -> Vec<String> {
  text
    .split(|c: char| !c.is_alphanumeric())
    .filter(|t| !t.is_empty())
    .map(str::to_lowercase)
    .collect()
}
