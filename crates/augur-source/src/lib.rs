//! Comment ingestion: Hacker News threads and local comment files.
//!
//! Raw comment shapes are normalised into [`augur_core::Comment`] here and
//! nowhere else.

mod error;
mod file;
mod hn;
mod html;

pub use error::SourceError;
pub use file::load_comments;
pub use hn::{HackerNewsSource, DEFAULT_ITEM_ID};
pub use html::html_to_text;
