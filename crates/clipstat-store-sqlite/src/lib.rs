//! SQLite backend for the clipstat warehouse.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. The single connection is only ever
//! touched through that thread, which serialises every read and write.

mod audit;
mod batch;
mod encode;
mod history;
mod schema;
mod store;
mod upsert;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
