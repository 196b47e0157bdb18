//! Configuration Management
//!
//! Layered configuration with figment: defaults, global file, project
//! file, environment variables.

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{Config, GenerationConfig, LlmConfig, ProviderKind};
