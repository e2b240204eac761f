//! Core types and trait definitions for the clipstat video warehouse.
//!
//! This crate is free of HTTP and database dependencies. The store, the
//! fetch clients and the pipeline all depend on it.

// Native `async fn` in traits; the `Send` bounds are spelled out on the
// returned futures instead.
#![allow(async_fn_in_trait)]

pub mod audit;
pub mod batch;
pub mod error;
pub mod label;
pub mod model;
pub mod source;
pub mod store;
pub mod video;

pub use error::{Error, Result};
