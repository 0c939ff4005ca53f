// src/ingest/types.rs
use anyhow::Result;

use crate::record::{Candidate, Category};

/// Fetch collaborator seam: anything that can produce raw candidates for a category.
///
/// Implementations own their transport (RSS, search APIs, fixtures). The pipeline only
/// relies on the returned records matching the `Candidate` shape; empty fields are fine.
#[async_trait::async_trait]
pub trait CandidateSource: Send + Sync {
    async fn fetch(&self, category: Category) -> Result<Vec<Candidate>>;
    fn name(&self) -> &str;
}

/// In-memory source, handy for tests and for feeding pre-fetched batches.
pub struct StaticSource {
    name: String,
    items: Vec<Candidate>,
}

impl StaticSource {
    pub fn new(name: impl Into<String>, items: Vec<Candidate>) -> Self {
        Self {
            name: name.into(),
            items,
        }
    }
}

#[async_trait::async_trait]
impl CandidateSource for StaticSource {
    async fn fetch(&self, category: Category) -> Result<Vec<Candidate>> {
        Ok(self
            .items
            .iter()
            .filter(|c| c.category == category)
            .cloned()
            .collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
