//! Data model, configuration and prompt templates for prediction analysis

mod config;
mod error;
pub mod prompts;
mod types;

pub use config::{Config, RetryPolicy, DEFAULT_CONFIG_FILE};
pub use error::ConfigError;
pub use prompts::PromptTemplate;
pub use types::{AnalysisResult, Cluster, Comment, Fingerprint, Likelihood, Prediction, Theme};
