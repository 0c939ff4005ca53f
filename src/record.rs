// src/record.rs
//! Candidate record: the unit that flows through scoring, dedup, selection and enrichment.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Editorial bucket assigned at fetch time. Never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    International,
    Domestic,
}

impl Category {
    /// Processing order for a full run.
    pub const ALL: [Category; 2] = [Category::International, Category::Domestic];

    pub fn label(self) -> &'static str {
        match self {
            Category::International => "international",
            Category::Domestic => "domestic",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One discovered article.
///
/// Fetch collaborators fill the raw text fields; the pipeline assigns `score`
/// and, for enrichment survivors, the `agent_*` fields and `processed_summary`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub source: String,
    /// Source-native timestamp, opaque to the pipeline.
    #[serde(default)]
    pub published: String,
    /// Raw excerpt/body text; may be empty or carry HTML.
    #[serde(default)]
    pub summary: String,
    pub category: Category,
    #[serde(default)]
    pub score: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_summary: Option<String>,
}

impl Candidate {
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        source: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            source: source.into(),
            published: String::new(),
            summary: String::new(),
            category,
            score: 0,
            agent_score: None,
            agent_reason: None,
            agent_action: None,
            processed_summary: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    pub fn with_published(mut self, published: impl Into<String>) -> Self {
        self.published = published.into();
        self
    }

    /// Title with all whitespace removed and case folded. Equal keys mean duplicates.
    pub fn dedup_key(&self) -> String {
        title_key(&self.title)
    }

    /// Eligible for delivery: has a final summary and somewhere to link to.
    pub fn is_deliverable(&self) -> bool {
        self.processed_summary.is_some() && !self.link.trim().is_empty()
    }

    /// Short anonymized id for logs (never log raw article text).
    pub fn log_id(&self) -> String {
        if self.link.is_empty() {
            anon_hash(&self.title)
        } else {
            anon_hash(&self.link)
        }
    }

    /// First few characters of the title, for human-readable log lines.
    pub fn title_prefix(&self) -> String {
        self.title.chars().take(24).collect()
    }
}

pub fn title_key(title: &str) -> String {
    title
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
