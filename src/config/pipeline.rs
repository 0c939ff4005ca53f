// src/config/pipeline.rs
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf, time::Duration};
use tracing::info;

pub const DEFAULT_PIPELINE_CONFIG_PATH: &str = "config/pipeline.toml";
pub const ENV_PIPELINE_CONFIG_PATH: &str = "PIPELINE_CONFIG_PATH";
pub const ENV_PIPELINE_CANDIDATES: &str = "PIPELINE_CANDIDATES";
pub const ENV_PIPELINE_FINAL: &str = "PIPELINE_FINAL";
pub const ENV_PIPELINE_ITEM_DELAY_MS: &str = "PIPELINE_ITEM_DELAY_MS";

const EMBEDDED_PIPELINE: &str = include_str!("../../config/pipeline.toml");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub selection: SelectionCfg,
    pub thresholds: ThresholdsCfg,
    pub retry: RetryCfg,
    pub enrich: EnrichCfg,
    pub providers: ProvidersCfg,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionCfg {
    pub candidate_set_size: usize,
    pub final_size: usize,
}

impl Default for SelectionCfg {
    fn default() -> Self {
        Self {
            candidate_set_size: 6,
            final_size: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdsCfg {
    pub keyword_min: i32,
    pub agent_min: f64,
    pub rescue_score: f64,
}

impl Default for ThresholdsCfg {
    fn default() -> Self {
        Self {
            keyword_min: 2,
            agent_min: 7.0,
            rescue_score: 7.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryCfg {
    pub primary_attempts: u32,
    pub secondary_attempts: u32,
    pub generic_backoff_ms: u64,
    pub rate_limit_backoff_ms: u64,
}

impl Default for RetryCfg {
    fn default() -> Self {
        Self {
            primary_attempts: 3,
            secondary_attempts: 1,
            generic_backoff_ms: 2_000,
            rate_limit_backoff_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichCfg {
    pub inter_item_delay_ms: u64,
    pub excerpt_chars: usize,
    pub degraded_excerpt_chars: usize,
}

impl Default for EnrichCfg {
    fn default() -> Self {
        Self {
            inter_item_delay_ms: 5_000,
            excerpt_chars: 1_500,
            degraded_excerpt_chars: 200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersCfg {
    /// "gemini" | "openai" | "none" (case-insensitive)
    pub primary: String,
    pub secondary: String,
    pub gemini_model: String,
    pub openai_model: String,
    pub timeout_secs: u64,
}

impl Default for ProvidersCfg {
    fn default() -> Self {
        Self {
            primary: "gemini".into(),
            secondary: "openai".into(),
            gemini_model: "gemini-flash-latest".into(),
            openai_model: "gpt-4o-mini".into(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    OpenAi,
    None,
}

impl ProviderKind {
    /// Unknown names map to `None` (the slot is left empty).
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => ProviderKind::Gemini,
            "openai" | "gpt" => ProviderKind::OpenAi,
            _ => ProviderKind::None,
        }
    }
}

impl ProvidersCfg {
    pub fn primary_kind(&self) -> ProviderKind {
        ProviderKind::parse(&self.primary)
    }

    pub fn secondary_kind(&self) -> ProviderKind {
        ProviderKind::parse(&self.secondary)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RetryCfg {
    pub fn generic_backoff(&self) -> Duration {
        Duration::from_millis(self.generic_backoff_ms)
    }

    pub fn rate_limit_backoff(&self) -> Duration {
        Duration::from_millis(self.rate_limit_backoff_ms)
    }
}

impl EnrichCfg {
    pub fn inter_item_delay(&self) -> Duration {
        Duration::from_millis(self.inter_item_delay_ms)
    }
}

// parse optional env value; invalid input is ignored
fn parse_env<T: std::str::FromStr>(raw: Option<String>) -> Option<T> {
    raw.and_then(|s| s.trim().parse::<T>().ok())
}

impl PipelineConfig {
    /// Resolve the config file (`PIPELINE_CONFIG_PATH` or `config/pipeline.toml`), falling back
    /// to the embedded defaults when it doesn't exist, then apply env overrides.
    pub fn load() -> anyhow::Result<Self> {
        let path = env::var(ENV_PIPELINE_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_PIPELINE_CONFIG_PATH));

        let mut cfg = if path.exists() {
            Self::load_from_file(&path)?
        } else {
            info!(path = %path.display(), "pipeline config not found; using embedded defaults");
            Self::from_toml_str(EMBEDDED_PIPELINE)?
        };
        cfg.apply_env_overrides();
        cfg.sanitize();
        Ok(cfg)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading pipeline config from {}", path.display()))?;
        Self::from_toml_str(&data)
            .with_context(|| format!("parsing pipeline config from {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let mut cfg: PipelineConfig = toml::from_str(s)?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// `PIPELINE_CANDIDATES`, `PIPELINE_FINAL`, `PIPELINE_ITEM_DELAY_MS`.
    pub fn apply_env_overrides(&mut self) {
        if let Some(n) = parse_env::<usize>(env::var(ENV_PIPELINE_CANDIDATES).ok()) {
            self.selection.candidate_set_size = n;
        }
        if let Some(k) = parse_env::<usize>(env::var(ENV_PIPELINE_FINAL).ok()) {
            self.selection.final_size = k;
        }
        if let Some(ms) = parse_env::<u64>(env::var(ENV_PIPELINE_ITEM_DELAY_MS).ok()) {
            self.enrich.inter_item_delay_ms = ms;
        }
    }

    /// Keep values usable: non-zero sizes and attempts, finite non-negative thresholds.
    pub fn sanitize(&mut self) {
        self.selection.candidate_set_size = self.selection.candidate_set_size.max(1);
        self.selection.final_size = self.selection.final_size.max(1);
        self.retry.primary_attempts = self.retry.primary_attempts.max(1);
        self.retry.secondary_attempts = self.retry.secondary_attempts.max(1);

        let defaults = ThresholdsCfg::default();
        if self.thresholds.keyword_min < 0 {
            self.thresholds.keyword_min = defaults.keyword_min;
        }
        if !self.thresholds.agent_min.is_finite() || self.thresholds.agent_min < 0.0 {
            self.thresholds.agent_min = defaults.agent_min;
        }
        if !self.thresholds.rescue_score.is_finite() || self.thresholds.rescue_score < 0.0 {
            self.thresholds.rescue_score = defaults.rescue_score;
        }
        self.provider_names_lowercase();
    }

    fn provider_names_lowercase(&mut self) {
        self.providers.primary = self.providers.primary.trim().to_lowercase();
        self.providers.secondary = self.providers.secondary.trim().to_lowercase();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_matches_defaults() {
        let cfg = PipelineConfig::from_toml_str(EMBEDDED_PIPELINE).unwrap();
        assert_eq!(cfg.selection.candidate_set_size, 6);
        assert_eq!(cfg.selection.final_size, 3);
        assert_eq!(cfg.thresholds.keyword_min, 2);
        assert_eq!(cfg.thresholds.agent_min, 7.0);
        assert_eq!(cfg.retry.primary_attempts, 3);
        assert_eq!(cfg.providers.primary_kind(), ProviderKind::Gemini);
        assert_eq!(cfg.providers.secondary_kind(), ProviderKind::OpenAi);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg = PipelineConfig::from_toml_str("[selection]\nfinal_size = 5\n").unwrap();
        assert_eq!(cfg.selection.final_size, 5);
        assert_eq!(cfg.selection.candidate_set_size, 6);
        assert_eq!(cfg.retry.rate_limit_backoff_ms, 10_000);
    }

    #[test]
    fn sanitize_fixes_zeroes_and_bad_thresholds() {
        let cfg = PipelineConfig::from_toml_str(
            r#"
[selection]
candidate_set_size = 0
final_size = 0
[retry]
primary_attempts = 0
[thresholds]
agent_min = -3.0
[providers]
primary = " OpenAI "
secondary = "nobody"
"#,
        )
        .unwrap();
        assert_eq!(cfg.selection.candidate_set_size, 1);
        assert_eq!(cfg.selection.final_size, 1);
        assert_eq!(cfg.retry.primary_attempts, 1);
        assert_eq!(cfg.thresholds.agent_min, 7.0);
        assert_eq!(cfg.providers.primary_kind(), ProviderKind::OpenAi);
        assert_eq!(cfg.providers.secondary_kind(), ProviderKind::None);
    }

    #[test]
    fn negative_thresholds_fall_back_to_defaults() {
        let cfg = PipelineConfig::from_toml_str(
            "[thresholds]\nkeyword_min = -5\nagent_min = -1.0\nrescue_score = -2.0\n",
        )
        .unwrap();
        assert_eq!(cfg.thresholds.keyword_min, 2);
        assert_eq!(cfg.thresholds.agent_min, 7.0);
        assert_eq!(cfg.thresholds.rescue_score, 7.0);

        let zero = PipelineConfig::from_toml_str("[thresholds]\nkeyword_min = 0\n").unwrap();
        assert_eq!(zero.thresholds.keyword_min, 0);
    }
}
