//! Per-record outcomes of a batch operation.
//!
//! Batch writes never abort on a single bad record. Each record produces a
//! [`RecordOutcome`], and the outcomes are folded into a [`BatchReport`] that
//! the caller inspects once the batch has been committed.

use serde::Serialize;

/// What a successful write did to its target row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Change {
  Inserted,
  Updated,
  Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RecordOutcome {
  Applied { change: Change },
  /// Deliberately excluded, e.g. a transcript with no parent metrics row.
  Skipped { reason: String },
  /// The record's statements were rolled back.
  Failed { reason: String },
}

impl RecordOutcome {
  pub fn inserted() -> Self { Self::Applied { change: Change::Inserted } }

  pub fn updated() -> Self { Self::Applied { change: Change::Updated } }

  pub fn unchanged() -> Self { Self::Applied { change: Change::Unchanged } }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordFailure {
  pub video_id: String,
  pub reason:   String,
}

/// Aggregate tallies for one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
  pub inserted:  usize,
  pub updated:   usize,
  pub unchanged: usize,
  pub skipped:   Vec<String>,
  pub failed:    Vec<RecordFailure>,
}

impl BatchReport {
  /// Fold step: account for one record's outcome.
  pub fn record(mut self, video_id: &str, outcome: RecordOutcome) -> Self {
    match outcome {
      RecordOutcome::Applied { change: Change::Inserted } => self.inserted += 1,
      RecordOutcome::Applied { change: Change::Updated } => self.updated += 1,
      RecordOutcome::Applied { change: Change::Unchanged } => {
        self.unchanged += 1
      }
      RecordOutcome::Skipped { .. } => self.skipped.push(video_id.to_owned()),
      RecordOutcome::Failed { reason } => self.failed.push(RecordFailure {
        video_id: video_id.to_owned(),
        reason,
      }),
    }
    self
  }

  pub fn attempted(&self) -> usize {
    self.succeeded() + self.skipped.len() + self.failed.len()
  }

  pub fn succeeded(&self) -> usize {
    self.inserted + self.updated + self.unchanged
  }

  /// Rows actually written.
  pub fn changed(&self) -> usize { self.inserted + self.updated }
}

impl<S: AsRef<str>> FromIterator<(S, RecordOutcome)> for BatchReport {
  fn from_iter<I: IntoIterator<Item = (S, RecordOutcome)>>(iter: I) -> Self {
    iter
      .into_iter()
      .fold(Self::default(), |report, (id, outcome)| {
        report.record(id.as_ref(), outcome)
      })
  }
}
