// src/ingest/file_source.rs
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::ingest::types::CandidateSource;
use crate::record::{Candidate, Category};

/// Reads a JSON array of candidates from disk on every fetch.
///
/// This is the binary's offline input: upstream fetchers dump their batch to a file and
/// the pipeline ranks it. Records for other categories are skipped.
pub struct JsonFileSource {
    path: PathBuf,
    name: String,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = format!("file:{}", path.display());
        Self { path, name }
    }
}

pub fn parse_candidates(json: &str) -> Result<Vec<Candidate>> {
    let items: Vec<Candidate> = serde_json::from_str(json)?;
    Ok(items)
}

#[async_trait::async_trait]
impl CandidateSource for JsonFileSource {
    async fn fetch(&self, category: Category) -> Result<Vec<Candidate>> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("reading candidates from {}", self.path.display()))?;
        let items = parse_candidates(&content)
            .with_context(|| format!("parsing candidates from {}", self.path.display()))?;
        Ok(items.into_iter().filter(|c| c.category == category).collect())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
