//! The audit recorder.
//!
//! Called synchronously by every mutating statement, on the same connection
//! and inside the same transaction. A failure here is returned to the caller,
//! whose transaction (or savepoint) then rolls the mutation back with it.

use chrono::Utc;
use clipstat_core::audit::NewAuditEntry;
use rusqlite::Connection;

use crate::{
  Result,
  encode::{encode_dt, encode_payload},
};

/// Append one row to `audit_logs`, stamped with the current time.
pub fn record(conn: &Connection, entry: &NewAuditEntry) -> Result<()> {
  tracing::info!(
    action = %entry.action,
    table = %entry.table,
    record_id = %entry.record_id,
    actor = %entry.actor,
    "audit event"
  );

  let result = write(conn, entry);
  if let Err(e) = &result {
    tracing::error!(
      record_id = %entry.record_id,
      table = %entry.table,
      error = %e,
      "failed to write audit entry"
    );
  }
  result
}

fn write(conn: &Connection, entry: &NewAuditEntry) -> Result<()> {
  let old_values = entry.prior.as_ref().map(encode_payload).transpose()?;
  let new_values = entry.new.as_ref().map(encode_payload).transpose()?;

  conn.execute(
    "INSERT INTO audit_logs (
       user_id, action, table_name, record_id, old_values, new_values, action_time
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    rusqlite::params![
      entry.actor,
      entry.action.as_str(),
      entry.table.as_str(),
      entry.record_id,
      old_values,
      new_values,
      encode_dt(Utc::now()),
    ],
  )?;
  Ok(())
}
