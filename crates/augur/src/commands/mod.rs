pub mod analyze;
pub mod cache;
pub mod fetch;
pub mod version;
