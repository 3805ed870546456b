//! Core types for the prediction pipeline

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// A comment from a discussion thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    /// Nesting depth in the discussion tree (top-level = 0)
    pub level: u32,
    pub author: String,
    pub time: String,
}

impl Comment {
    pub fn new(
        text: impl Into<String>,
        level: u32,
        author: impl Into<String>,
        time: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            level,
            author: author.into(),
            time: time.into(),
        }
    }

    /// Comment known only by its text
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(text, 0, "Anonymous", "Unknown Time")
    }
}

/// Likelihood bucket for a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Likelihood {
    /// p >= 0.7
    Likely,
    /// 0.3 <= p < 0.7
    Maybe,
    /// p < 0.3
    Unlikely,
}

impl Likelihood {
    pub fn from_probability(probability: f64) -> Self {
        if probability >= 0.7 {
            Likelihood::Likely
        } else if probability >= 0.3 {
            Likelihood::Maybe
        } else {
            Likelihood::Unlikely
        }
    }

    pub fn all() -> [Likelihood; 3] {
        [Likelihood::Likely, Likelihood::Maybe, Likelihood::Unlikely]
    }

    /// How many of `predictions` fall in each category, in [`Likelihood::all`] order
    pub fn tally(predictions: &[Prediction]) -> Vec<(Likelihood, usize)> {
        Likelihood::all()
            .into_iter()
            .map(|category| {
                let count = predictions
                    .iter()
                    .filter(|p| Likelihood::from_probability(p.probability) == category)
                    .count();
                (category, count)
            })
            .collect()
    }
}

impl fmt::Display for Likelihood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Likelihood::Likely => "Likely",
            Likelihood::Maybe => "Maybe",
            Likelihood::Unlikely => "Unlikely",
        };
        f.write_str(label)
    }
}

/// A prediction extracted from comment text, with its evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Verbatim prediction text
    pub prediction: String,
    /// Estimated probability, always within [0, 1]
    #[serde(deserialize_with = "clamped_probability")]
    pub probability: f64,
    pub justification: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Likelihood>,
}

impl Prediction {
    pub fn new(
        prediction: impl Into<String>,
        probability: f64,
        justification: impl Into<String>,
    ) -> Self {
        Self {
            prediction: prediction.into(),
            probability: probability.clamp(0.0, 1.0),
            justification: justification.into(),
            category: None,
        }
    }

    /// Copy of this prediction with its likelihood category attached
    pub fn categorized(&self) -> Self {
        Self {
            category: Some(Likelihood::from_probability(self.probability)),
            ..self.clone()
        }
    }
}

/// Out-of-range values read back from disk are pulled into [0, 1]
fn clamped_probability<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value.is_nan() {
        return Err(de::Error::custom("probability is NaN"));
    }
    Ok(value.clamp(0.0, 1.0))
}

/// Transient grouping produced by the clusterer
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Hierarchical id, e.g. "2" or "2-0"
    pub cluster_id: String,
    /// Recursion depth the group was produced at (top level = 0)
    pub depth: usize,
    pub predictions: Vec<Prediction>,
}

/// A labeled theme with its member predictions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub theme: String,
    pub summary: String,
    pub predictions: Vec<Prediction>,
}

/// Final output of an analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub themes: Vec<Theme>,
    pub model: String,
    pub generated_at: DateTime<Utc>,
}

impl AnalysisResult {
    pub fn new(themes: Vec<Theme>, model: impl Into<String>) -> Self {
        Self {
            themes,
            model: model.into(),
            generated_at: Utc::now(),
        }
    }
}

/// Text a value contributes to a cache key
pub trait Fingerprint {
    fn fingerprint(&self) -> Cow<'_, str>;
}

impl Fingerprint for Comment {
    fn fingerprint(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.text)
    }
}

impl Fingerprint for Prediction {
    fn fingerprint(&self) -> Cow<'_, str> {
        match serde_json::to_string(self) {
            Ok(json) => Cow::Owned(json),
            Err(_) => Cow::Borrowed(&self.prediction),
        }
    }
}

impl Fingerprint for String {
    fn fingerprint(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl Fingerprint for &str {
    fn fingerprint(&self) -> Cow<'_, str> {
        Cow::Borrowed(*self)
    }
}
