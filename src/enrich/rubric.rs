// src/enrich/rubric.rs
//! Versioned prompt rubric, loaded from TOML like the keyword tables.

use anyhow::Context;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Deserialize;
use std::{env, fs, path::PathBuf};
use tracing::info;

pub const DEFAULT_RUBRIC_CONFIG_PATH: &str = "config/rubric.toml";
pub const ENV_RUBRIC_CONFIG_PATH: &str = "RUBRIC_CONFIG_PATH";

const EMBEDDED_RUBRIC: &str = include_str!("../../config/rubric.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct Rubric {
    #[serde(default)]
    pub version: String,
    pub target_language: String,
    #[serde(default)]
    pub banned_phrases: Vec<String>,
    pub scoring_prompt: String,
    pub summary_prompt: String,
    #[serde(default)]
    pub verdict_footer: String,
    pub rescue_reason: String,
    pub degraded_title_only: String,
    pub degraded_with_excerpt: String,
}

static RE_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder regex"));

/// Single-pass `{name}` substitution. Unknown placeholders and other braces are kept, and
/// substituted values are never re-expanded.
pub fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    RE_PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let key = &caps[1];
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

impl Rubric {
    /// `RUBRIC_CONFIG_PATH`, else `config/rubric.toml`, else embedded.
    pub fn load() -> anyhow::Result<Self> {
        let path = env::var(ENV_RUBRIC_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_RUBRIC_CONFIG_PATH));
        if !path.exists() {
            info!(path = %path.display(), "rubric not found on disk; using embedded defaults");
            return Self::embedded();
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("reading rubric from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing rubric from {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn embedded() -> anyhow::Result<Self> {
        Self::from_toml_str(EMBEDDED_RUBRIC)
    }

    pub fn scoring_prompt(&self, title: &str, content: &str) -> String {
        self.prompt(&self.scoring_prompt, title, content)
    }

    pub fn summary_prompt(&self, title: &str, content: &str) -> String {
        self.prompt(&self.summary_prompt, title, content)
    }

    fn prompt(&self, template: &str, title: &str, content: &str) -> String {
        let banned = self.banned_phrases.join(", ");
        let content = if content.trim().is_empty() { "(no body text)" } else { content };
        fill(
            template,
            &[
                ("title", title),
                ("content", content),
                ("language", &self.target_language),
                ("banned", &banned),
            ],
        )
        .trim()
        .to_string()
    }

    /// Footer appended to a summary, e.g. "[Agent verdict: 8.5 / reason]".
    pub fn footer(&self, score: f64, reason: &str) -> String {
        if self.verdict_footer.is_empty() {
            return String::new();
        }
        let score = format!("{score:.1}");
        fill(&self.verdict_footer, &[("score", &score), ("reason", reason)])
    }
}
