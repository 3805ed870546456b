//! Analysis stages and the driver that chains them

mod driver;
mod error;
mod extract;
mod filter;
mod themes;

pub use driver::{Pipeline, PipelineOutcome};
pub use error::PipelineError;
pub use extract::{extract, extract_all};
pub use filter::filter_noisy;
pub use themes::identify_themes;

#[cfg(test)]
pub(crate) mod testing;
