//! Per-record isolation inside a batch transaction.
//!
//! A batch opens one transaction. Each record runs inside its own savepoint:
//! if any of its statements (including the audit write) fails, only that
//! savepoint is rolled back and the fold moves on to the next record. The
//! transaction is committed once, after the last record.
//!
//! Structural failures (see [`Error::is_structural`]) are not folded. They
//! roll back the whole transaction and are returned to the caller.

use clipstat_core::batch::{BatchReport, RecordOutcome};
use rusqlite::{Connection, Transaction};

use crate::{Error, Result};

pub fn run_batch<T>(
  conn: &mut Connection,
  batch: &'static str,
  rows: &[T],
  key: impl Fn(&T) -> &str,
  mut apply: impl FnMut(&Connection, &T) -> Result<RecordOutcome>,
) -> Result<BatchReport> {
  let mut tx = conn.transaction()?;

  // An early return drops `tx`, which rolls it back.
  let report = rows
    .iter()
    .try_fold(BatchReport::default(), |report, row| {
      let video_id = key(row);
      isolated(&mut tx, batch, video_id, |sp| apply(sp, row))
        .map(|outcome| report.record(video_id, outcome))
    })
    .inspect_err(|e| {
      tracing::error!(batch, error = %e, "structural error; batch rolled back");
    })?;

  tx.commit()?;

  tracing::info!(
    batch,
    attempted = report.attempted(),
    inserted = report.inserted,
    updated = report.updated,
    unchanged = report.unchanged,
    skipped = report.skipped.len(),
    failed = report.failed.len(),
    "batch committed"
  );
  Ok(report)
}

/// Run `op` in a transaction of its own.
pub fn in_transaction<T>(
  conn: &mut Connection,
  op: impl FnOnce(&Connection) -> Result<T>,
) -> Result<T> {
  let tx = conn.transaction()?;
  let value = op(&tx)?;
  tx.commit()?;
  Ok(value)
}

fn isolated(
  tx: &mut Transaction<'_>,
  batch: &'static str,
  video_id: &str,
  op: impl FnOnce(&Connection) -> Result<RecordOutcome>,
) -> Result<RecordOutcome> {
  let result = tx.savepoint().map_err(Error::from).and_then(|sp| -> Result<_> {
    let outcome = op(&sp)?;
    sp.commit()?;
    Ok(outcome)
  });

  match result {
    Ok(outcome) => Ok(outcome),
    Err(e) if e.is_structural() => Err(e),
    Err(e) => {
      tracing::error!(batch, video_id, error = %e, "record rolled back");
      Ok(RecordOutcome::Failed { reason: e.to_string() })
    }
  }
}
