//! Reconciliation and enrichment passes over a clipstat [`Warehouse`].
//!
//! [`Reconciler`] drives one ingestion run: fetch upstream records through a
//! bounded pool, then apply them to the warehouse step by step. The
//! [`score`] passes derive popularity and sentiment labels from what is
//! already stored.
//!
//! [`Warehouse`]: clipstat_core::store::Warehouse

pub mod config;
pub mod error;
pub mod fetch;
pub mod ids;
pub mod model;
pub mod reconcile;
pub mod score;

pub use config::{PipelineConfig, ReconcileOptions};
pub use error::{Error, Result};
pub use reconcile::{Reconciler, RunReport};

#[cfg(test)]
mod tests;
