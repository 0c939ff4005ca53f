// src/config/mod.rs
//! Configuration objects. Loaded once at startup and passed into constructors.

pub mod credentials;
pub mod pipeline;

pub use credentials::ProviderCredentials;
pub use pipeline::{PipelineConfig, ProviderKind};
