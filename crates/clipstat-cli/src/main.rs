//! `clipstat` — ingest and enrich the video metrics warehouse.
//!
//! # Usage
//!
//! ```
//! clipstat ingest
//! clipstat score-popularity
//! clipstat score-sentiment
//! clipstat --config other.toml erase abc123
//! ```
//!
//! Settings come from `clipstat.toml` (or `--config`), overridden by
//! `CLIPSTAT_*` environment variables, e.g. `CLIPSTAT_YOUTUBE_API_KEY`.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use clipstat_core::store::Warehouse as _;
use clipstat_pipeline::{
  PipelineConfig, Reconciler,
  ids::discover_video_ids,
  model::{LinearSentimentModel, StandardScaler},
  score::{score_popularity, score_sentiment},
};
use clipstat_store_sqlite::SqliteStore;
use clipstat_youtube::{TranscriptClient, TranscriptConfig, YouTubeClient, YouTubeConfig};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "clipstat", version, about = "Video metrics warehouse")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "clipstat.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Fetch every video in the ids directory and reconcile the warehouse.
  Ingest,
  /// Recompute popularity labels for every stored video.
  ScorePopularity,
  /// Classify every stored transcript.
  ScoreSentiment,
  /// Remove one video's rows, auditing each deletion.
  Erase {
    video_id: String,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("CLIPSTAT"))
    .build()
    .context("failed to read config file")?;

  let cfg: PipelineConfig = settings
    .try_deserialize()
    .context("failed to deserialise PipelineConfig")?;

  let store = open_store(&cfg.store_path).await?;

  match cli.command {
    Command::Ingest => ingest(&cfg, store).await,
    Command::ScorePopularity => {
      let scaler = StandardScaler::load(&cfg.model_dir)?;
      let report = score_popularity(&store, &scaler, &cfg.actor).await?;
      match report.threshold {
        Some(t) => println!(
          "scored {} videos (threshold {t:.0} views, {} relabelled, {} failed)",
          report.scored.len(),
          report.batch.changed(),
          report.batch.failed.len()
        ),
        None => println!("no videos to score"),
      }
      Ok(())
    }
    Command::ScoreSentiment => {
      let model = LinearSentimentModel::load(&cfg.model_dir)?;
      let report = score_sentiment(&store, &model, &cfg.actor).await?;
      println!(
        "scored {} transcripts ({} positive, {} negative, {} relabelled)",
        report.scored,
        report.positive,
        report.negative,
        report.batch.changed()
      );
      Ok(())
    }
    Command::Erase { video_id } => {
      let removed = store
        .erase_video(&cfg.actor, &video_id)
        .await
        .with_context(|| format!("failed to erase {video_id}"))?;
      println!("removed {removed} rows for {video_id}");
      Ok(())
    }
  }
}

async fn open_store(path: &Path) -> anyhow::Result<SqliteStore> {
  SqliteStore::open(path)
    .await
    .with_context(|| format!("failed to open store at {path:?}"))
}

async fn ingest(cfg: &PipelineConfig, store: SqliteStore) -> anyhow::Result<()> {
  let video_ids = discover_video_ids(&cfg.ids_dir)?;

  let videos = YouTubeClient::new(YouTubeConfig {
    base_url: cfg.youtube_base_url.clone(),
    api_key:  cfg.youtube_api_key.clone(),
    timeout:  cfg.fetch_timeout(),
  })
  .context("failed to build metadata client")?;
  let transcripts = TranscriptClient::new(TranscriptConfig {
    base_url: cfg.transcript_base_url.clone(),
    timeout:  cfg.fetch_timeout(),
  })
  .context("failed to build transcript client")?;

  let reconciler = Reconciler::new(store, videos, transcripts, cfg.reconcile_options());
  let report = reconciler.run(&video_ids).await?;

  println!(
    "run {}: {}/{} fetched, {} inserted, {} updated, {} unchanged, {} failed",
    report.run_id,
    report.fetched,
    report.requested,
    report.metrics.inserted,
    report.metrics.updated,
    report.metrics.unchanged,
    report.metrics.failed.len()
  );
  for failure in &report.metrics.failed {
    eprintln!("  {}: {}", failure.video_id, failure.reason);
  }
  Ok(())
}
