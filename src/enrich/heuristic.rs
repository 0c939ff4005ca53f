// src/enrich/heuristic.rs
//! Last-resort verdicts when no generative provider produced a usable answer.

use anyhow::Context;
use serde::Deserialize;

use super::clean::truncate_chars;
use super::parse::ScoreVerdict;
use super::rubric::{fill, Rubric};
use crate::relevance::{read_keywords_toml, EMBEDDED_KEYWORDS};

#[derive(Debug, Clone, Deserialize)]
pub struct HeuristicCfg {
    #[serde(default = "default_score")]
    pub default_score: f64,
    #[serde(default)]
    pub default_reason: String,
    #[serde(default)]
    pub default_action: String,
    #[serde(default)]
    pub tiers: Vec<HeuristicTier>,
}

fn default_score() -> f64 {
    7.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeuristicTier {
    pub name: String,
    pub score: f64,
    #[serde(default)]
    pub reason: String,
    pub keywords: Vec<String>,
}

#[derive(Deserialize)]
struct Root {
    heuristic: HeuristicCfg,
}

/// Tiered keyword scorer with fixed scores per tier. First matching tier wins.
#[derive(Debug, Clone)]
pub struct HeuristicScorer {
    cfg: HeuristicCfg,
}

impl HeuristicScorer {
    pub fn new(mut cfg: HeuristicCfg) -> Self {
        for tier in &mut cfg.tiers {
            tier.keywords = tier
                .keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect();
        }
        Self { cfg }
    }

    /// Reads the `[heuristic]` section of a keywords TOML document.
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let root: Root = toml::from_str(s).context("parsing [heuristic] section")?;
        Ok(Self::new(root.heuristic))
    }

    pub fn embedded() -> anyhow::Result<Self> {
        Self::from_toml_str(EMBEDDED_KEYWORDS)
    }

    /// Same file resolution as [`crate::relevance::RelevanceEngine::load`].
    pub fn load() -> anyhow::Result<Self> {
        let (content, origin) = read_keywords_toml()?;
        Self::from_toml_str(&content).with_context(|| format!("heuristic tiers from {origin}"))
    }

    /// Fallback pass score used when nothing matches.
    pub fn default_score(&self) -> f64 {
        self.cfg.default_score
    }

    pub fn evaluate(&self, title: &str, body: &str) -> ScoreVerdict {
        let text = format!("{title} {body}").to_lowercase();
        for tier in &self.cfg.tiers {
            if let Some(kw) = tier.keywords.iter().find(|k| text.contains(k.as_str())) {
                return ScoreVerdict {
                    score: tier.score,
                    reason: format!("Heuristic tier {} ({}): {}", tier.name, kw, tier.reason),
                    action: self.cfg.default_action.clone(),
                };
            }
        }
        ScoreVerdict {
            score: self.cfg.default_score,
            reason: self.cfg.default_reason.clone(),
            action: self.cfg.default_action.clone(),
        }
    }
}

/// Summary used when every provider failed. Never empty: title-only when there is no
/// excerpt, otherwise title plus the excerpt cut to `max_excerpt_chars`.
pub fn degraded_summary(rubric: &Rubric, title: &str, excerpt: &str, max_excerpt_chars: usize) -> String {
    let excerpt = excerpt.trim();
    let title = if title.trim().is_empty() { "(untitled)" } else { title.trim() };
    if excerpt.is_empty() {
        fill(&rubric.degraded_title_only, &[("title", title)])
    } else {
        let cut = truncate_chars(excerpt, max_excerpt_chars);
        fill(&rubric.degraded_with_excerpt, &[("title", title), ("excerpt", &cut)])
    }
}
