//! Derived labels written by the enrichment scorers.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

// ─── Popularity ──────────────────────────────────────────────────────────────

/// Popularity tier of a video relative to the rest of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PopularityLabel {
  #[serde(rename = "Popular")]
  Popular,
  #[serde(rename = "Not Popular")]
  NotPopular,
  /// Placeholder written alongside the first metrics row for a video.
  #[serde(rename = "Not Rated Yet")]
  NotRatedYet,
}

impl PopularityLabel {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Popular => "Popular",
      Self::NotPopular => "Not Popular",
      Self::NotRatedYet => "Not Rated Yet",
    }
  }
}

impl fmt::Display for PopularityLabel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for PopularityLabel {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "Popular" => Ok(Self::Popular),
      "Not Popular" => Ok(Self::NotPopular),
      "Not Rated Yet" => Ok(Self::NotRatedYet),
      other => Err(Error::UnknownPopularity(other.to_owned())),
    }
  }
}

/// A `dim_stats` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedStat {
  pub video_id:   String,
  pub popularity: PopularityLabel,
}

// ─── Sentiment ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
  Positive,
  Negative,
}

impl SentimentLabel {
  /// Binary classifier output: `1` is positive, anything else negative.
  pub fn from_class(class: u8) -> Self {
    if class == 1 { Self::Positive } else { Self::Negative }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Positive => "positive",
      Self::Negative => "negative",
    }
  }
}

impl fmt::Display for SentimentLabel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for SentimentLabel {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "positive" => Ok(Self::Positive),
      "negative" => Ok(Self::Negative),
      other => Err(Error::UnknownSentiment(other.to_owned())),
    }
  }
}

/// A `dim_sentiment` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentRecord {
  pub video_id:  String,
  pub sentiment: SentimentLabel,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn class_one_is_positive_everything_else_negative() {
    assert_eq!(SentimentLabel::from_class(1), SentimentLabel::Positive);
    assert_eq!(SentimentLabel::from_class(0), SentimentLabel::Negative);
    assert_eq!(SentimentLabel::from_class(7), SentimentLabel::Negative);
  }

  #[test]
  fn popularity_text_matches_serde() {
    for label in [
      PopularityLabel::Popular,
      PopularityLabel::NotPopular,
      PopularityLabel::NotRatedYet,
    ] {
      let json = serde_json::to_string(&label).unwrap();
      assert_eq!(json, format!("\"{}\"", label.as_str()));
      assert_eq!(label.as_str().parse::<PopularityLabel>().unwrap(), label);
    }
  }

  #[test]
  fn unknown_popularity_is_rejected() {
    assert!(matches!(
      "Viral".parse::<PopularityLabel>(),
      Err(Error::UnknownPopularity(s)) if s == "Viral"
    ));
  }
}
