//! Model gateway: provider backends, retry, response repair and validation

mod backend;
mod error;
mod gateway;
pub mod parser;
pub mod providers;
pub mod retry;
pub mod schema;

pub use backend::{GenerationRequest, ModelBackend};
pub use error::ModelError;
pub use gateway::ModelGateway;
pub use providers::{build_backend, ProviderKind};
pub use retry::{retry, AttemptError, Backoff};
pub use schema::{NoiseSchema, PredictionSchema, ResponseSchema, ThemeLabel, ThemeSchema};
