//! HTTP clients for the upstream video metadata and transcript services.
//!
//! Both clients implement the fetch seams from `clipstat-core` and are cheap
//! to clone; the inner [`reqwest::Client`] is `Arc`-based.

mod transcripts;
mod videos;

pub mod error;

pub use error::{Error, Result};
pub use transcripts::{TranscriptClient, TranscriptConfig};
pub use videos::{YouTubeClient, YouTubeConfig};
