// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod bootstrap;
pub mod config;
pub mod deliver;
pub mod enrich;
pub mod ingest;
pub mod metrics;
pub mod pipeline;
pub mod record;
pub mod relevance;
pub mod select;

// ---- Re-exports for stable public API ----
pub use crate::deliver::{DeliverySink, JsonSink, MemorySink};
pub use crate::enrich::{EnrichmentAgent, ProviderError};
pub use crate::ingest::types::CandidateSource;
pub use crate::pipeline::{CategoryReport, Pipeline, RunReport};
pub use crate::record::{Candidate, Category};
pub use crate::relevance::RelevanceEngine;

