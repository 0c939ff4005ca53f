// src/relevance.rs
//! Relevance scorer: tiered keyword tables, negative keywords and title reject patterns.
//!
//! Scoring is additive and presence-based. Every keyword found in the lower-cased
//! `title + " " + body` adds its tier weight once; all tiers are always checked.
//! Any negative keyword, or any reject pattern matching the title, short-circuits to
//! [`REJECT_SCORE`] with `hard_reject = true`.

use anyhow::Context;
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::record::{anon_hash, Category};

// --- env defaults & names ---
pub const DEFAULT_KEYWORDS_CONFIG_PATH: &str = "config/keywords.toml";
pub const ENV_KEYWORDS_CONFIG_PATH: &str = "KEYWORDS_CONFIG_PATH";

/// Shipped tables, used when no file is found on disk.
pub(crate) const EMBEDDED_KEYWORDS: &str = include_str!("../config/keywords.toml");

/// Sentinel score for hard-rejected items.
pub const REJECT_SCORE: i32 = -999;

/// Minimum keyword score for the initial filter.
pub const DEFAULT_KEYWORD_MIN: i32 = 2;

// Dev logging gate: RELEVANCE_DEV_LOG=1 AND dev env (debug build or APP_ENV in {local,development,dev})
pub(crate) fn dev_logging_enabled() -> bool {
    let on = std::env::var("RELEVANCE_DEV_LOG").ok().as_deref() == Some("1");
    if !on {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var("APP_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

/// Minimal, anonymized dev logger for scoring events.
fn dev_log_verdict(event: &str, title: &str, verdict: &Verdict) {
    if !dev_logging_enabled() {
        return;
    }
    let id = anon_hash(title);
    let matched_short = truncate_vec(&verdict.matched, 5);
    let reasons_short = truncate_vec(&verdict.reasons, 5);
    // Never log raw text. Only hashed id + short lists.
    info!(
        target: "relevance",
        %id, score = verdict.score, event,
        matched = ?matched_short,
        reasons = ?reasons_short
    );
}

pub(crate) fn truncate_vec<T: ToString>(v: &[T], max: usize) -> Vec<String> {
    v.iter().take(max).map(|x| x.to_string()).collect()
}

/// Result of keyword scoring.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Verdict {
    pub score: i32,
    pub hard_reject: bool,
    /// Matched positive keywords, in table order.
    pub matched: Vec<String>,
    /// Tagged explanations: `reject_pattern:..`, `negative:..`, `tier:<name>:<kw>`.
    pub reasons: Vec<String>,
}

impl Verdict {
    fn rejected(reason: String) -> Self {
        Self {
            score: REJECT_SCORE,
            hard_reject: true,
            matched: Vec::new(),
            reasons: vec![reason],
        }
    }

    /// Initial-filter decision: not hard-rejected and at least `min` points.
    pub fn passes(&self, min: i32) -> bool {
        !self.hard_reject && self.score >= min
    }
}

/* ----------------------------
Config schema (from TOML)
---------------------------- */

#[derive(Debug, Clone, Deserialize)]
pub struct KeywordsRoot {
    pub international: TableCfg,
    pub domestic: TableCfg,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableCfg {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub tiers: Vec<TierCfg>,
    #[serde(default)]
    pub negative: Vec<String>,
    #[serde(default)]
    pub reject_patterns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TierCfg {
    pub name: String,
    pub weight: i32,
    pub keywords: Vec<String>,
}

/* ----------------------------
Compiled structures
---------------------------- */

#[derive(Debug)]
struct CompiledTier {
    name: String,
    weight: i32,
    // lower-cased once at load
    keywords: Vec<String>,
}

/// One category's compiled table. Holds no category-specific logic.
#[derive(Debug)]
pub struct KeywordTable {
    pub version: String,
    tiers: Vec<CompiledTier>,
    negative: Vec<String>,
    reject: Vec<(String, Regex)>,
}

impl KeywordTable {
    pub fn compile(cfg: &TableCfg) -> anyhow::Result<Self> {
        let reject = cfg
            .reject_patterns
            .iter()
            .map(|p| {
                let re = Regex::new(p)
                    .map_err(|e| anyhow::anyhow!("reject pattern `{}` regex error: {}", p, e))?;
                Ok((p.clone(), re))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        let tiers = cfg
            .tiers
            .iter()
            .map(|t| CompiledTier {
                name: t.name.clone(),
                weight: t.weight,
                keywords: lower_all(&t.keywords),
            })
            .collect();

        Ok(Self {
            version: cfg.version.clone(),
            tiers,
            negative: lower_all(&cfg.negative),
            reject,
        })
    }

    /// Score `title` + `body`. Pure; identical input always yields the identical verdict.
    pub fn score(&self, title: &str, body: &str) -> Verdict {
        // 1) Title-only reject patterns, before any keyword work
        if let Some((pat, _)) = self.reject.iter().find(|(_, re)| re.is_match(title)) {
            let v = Verdict::rejected(format!("reject_pattern:{pat}"));
            dev_log_verdict("rejected_pattern", title, &v);
            return v;
        }

        let text = format!("{title} {body}").to_lowercase();

        // 2) Negative keywords force the sentinel
        if let Some(kw) = self.negative.iter().find(|kw| text.contains(kw.as_str())) {
            let v = Verdict::rejected(format!("negative:{kw}"));
            dev_log_verdict("rejected_negative", title, &v);
            return v;
        }

        // 3) Additive tiers, no early exit
        let mut v = Verdict::default();
        for tier in &self.tiers {
            for kw in &tier.keywords {
                if text.contains(kw.as_str()) {
                    v.score += tier.weight;
                    v.matched.push(kw.clone());
                    v.reasons.push(format!("tier:{}:{}", tier.name, kw));
                }
            }
        }

        dev_log_verdict("scored", title, &v);
        v
    }
}

fn lower_all(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Raw keywords TOML and where it came from. Shared by the relevance tables and the
/// heuristic fallback so both always read the same file.
pub(crate) fn read_keywords_toml() -> anyhow::Result<(String, String)> {
    let path = std::env::var(ENV_KEYWORDS_CONFIG_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_KEYWORDS_CONFIG_PATH));

    if !path.exists() {
        info!(path = %path.display(), "keyword tables not found on disk; using embedded defaults");
        return Ok((EMBEDDED_KEYWORDS.to_string(), "embedded defaults".to_string()));
    }
    let content = fs::read_to_string(&path)
        .with_context(|| format!("reading keyword tables from {}", path.display()))?;
    Ok((content, path.display().to_string()))
}

/// Both category tables, compiled.
#[derive(Debug)]
pub struct RelevanceEngine {
    international: KeywordTable,
    domestic: KeywordTable,
}

impl RelevanceEngine {
    /// Load from `KEYWORDS_CONFIG_PATH`, else `config/keywords.toml`, else the embedded tables.
    pub fn load() -> anyhow::Result<Self> {
        let (content, origin) = read_keywords_toml()?;
        Self::from_toml_str(&content).with_context(|| format!("parsing keyword tables from {origin}"))
    }

    /// Load from a TOML string
    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        let cfg: KeywordsRoot = toml::from_str(toml_str)?;
        Ok(Self {
            international: KeywordTable::compile(&cfg.international)?,
            domestic: KeywordTable::compile(&cfg.domestic)?,
        })
    }

    pub fn embedded() -> anyhow::Result<Self> {
        Self::from_toml_str(EMBEDDED_KEYWORDS)
    }

    pub fn table(&self, category: Category) -> &KeywordTable {
        match category {
            Category::International => &self.international,
            Category::Domestic => &self.domestic,
        }
    }

    pub fn score(&self, category: Category, title: &str, body: &str) -> Verdict {
        self.table(category).score(title, body)
    }
}

/* ----------------------------
Tests
---------------------------- */
