//! Explicit configuration, threaded through constructors.

use std::{path::PathBuf, time::Duration};

use serde::Deserialize;

/// Runtime configuration, deserialised from `clipstat.toml` and
/// `CLIPSTAT_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
  pub store_path:          PathBuf,
  /// Directory of per-video marker files; each file stem is a video id.
  pub ids_dir:             PathBuf,
  #[serde(default = "default_actor")]
  pub actor:               String,
  #[serde(default = "default_fetch_concurrency")]
  pub fetch_concurrency:   usize,
  #[serde(default = "default_fetch_timeout_secs")]
  pub fetch_timeout_secs:  u64,
  #[serde(default = "default_youtube_base_url")]
  pub youtube_base_url:    String,
  #[serde(default)]
  pub youtube_api_key:     String,
  pub transcript_base_url: String,
  #[serde(default = "default_model_dir")]
  pub model_dir:           PathBuf,
  /// Write one audit marker per processed video at the end of each run.
  #[serde(default)]
  pub emit_batch_markers:  bool,
}

fn default_actor() -> String { "system".into() }

fn default_fetch_concurrency() -> usize { 10 }

fn default_fetch_timeout_secs() -> u64 { 30 }

fn default_youtube_base_url() -> String {
  "https://www.googleapis.com/youtube/v3".into()
}

fn default_model_dir() -> PathBuf { PathBuf::from("models") }

impl PipelineConfig {
  pub fn fetch_timeout(&self) -> Duration {
    Duration::from_secs(self.fetch_timeout_secs)
  }

  pub fn reconcile_options(&self) -> ReconcileOptions {
    ReconcileOptions {
      actor:              self.actor.clone(),
      fetch_concurrency:  self.fetch_concurrency,
      fetch_timeout:      self.fetch_timeout(),
      emit_batch_markers: self.emit_batch_markers,
    }
  }
}

/// The subset of [`PipelineConfig`] the reconciler needs.
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
  pub actor:              String,
  pub fetch_concurrency:  usize,
  pub fetch_timeout:      Duration,
  pub emit_batch_markers: bool,
}

impl Default for ReconcileOptions {
  fn default() -> Self {
    Self {
      actor:              default_actor(),
      fetch_concurrency:  default_fetch_concurrency(),
      fetch_timeout:      Duration::from_secs(default_fetch_timeout_secs()),
      emit_batch_markers: false,
    }
  }
}
