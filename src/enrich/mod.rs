// src/enrich/mod.rs
//! Enrichment agent: per-item re-scoring and summarization over a provider fallback chain,
//! with a keyword heuristic as the final backstop and a safety net for empty batches.
//!
//! Per item:
//! ```text
//! CANDIDATE -> re-score -> score >= pass  -> summarize -> ENRICHED
//!                       -> score <  pass  -> DROPPED
//! ```
//! Items are processed strictly one at a time with a fixed delay after each.

pub mod chain;
pub mod clean;
pub mod gemini;
pub mod heuristic;
pub mod openai;
pub mod parse;
pub mod provider;
pub mod rubric;

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use tracing::{info, warn};

use crate::config::pipeline::{PipelineConfig, ProviderKind, ProvidersCfg};
use crate::config::ProviderCredentials;
use crate::record::Candidate;

use self::chain::{FallbackChain, RetryPolicy};
use self::clean::prompt_excerpt;
use self::gemini::GeminiProvider;
use self::heuristic::{degraded_summary, HeuristicScorer};
use self::openai::OpenAiProvider;
use self::parse::{parse_score_response, ScoreVerdict};
use self::provider::{DynProvider, ResponseFormat};
use self::rubric::Rubric;

pub use self::chain::ChainOutput;
pub use self::provider::{GenerativeProvider, MockProvider, ProviderError};

/// Tunables for the agent itself (the chain carries its own retry policy).
#[derive(Debug, Clone)]
pub struct EnrichSettings {
    /// Minimum agent score to survive enrichment.
    pub pass_score: f64,
    /// Score given to the safety-net rescue.
    pub rescue_score: f64,
    /// Sleep after every processed item, success or not.
    pub inter_item_delay: Duration,
    pub excerpt_chars: usize,
    pub degraded_excerpt_chars: usize,
}

impl Default for EnrichSettings {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl EnrichSettings {
    pub fn from_config(cfg: &PipelineConfig) -> Self {
        Self {
            pass_score: cfg.thresholds.agent_min,
            rescue_score: cfg.thresholds.rescue_score,
            inter_item_delay: cfg.enrich.inter_item_delay(),
            excerpt_chars: cfg.enrich.excerpt_chars,
            degraded_excerpt_chars: cfg.enrich.degraded_excerpt_chars,
        }
    }

    /// Defaults without the inter-item sleep.
    pub fn immediate() -> Self {
        Self {
            inter_item_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Who produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictSource {
    Provider(&'static str),
    Heuristic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub verdict: ScoreVerdict,
    pub source: VerdictSource,
}

/// Result of enriching one category's candidate set.
#[derive(Debug, Clone, Default)]
pub struct EnrichOutcome {
    pub survivors: Vec<Candidate>,
    pub dropped: usize,
    pub safety_net_used: bool,
}

pub struct EnrichmentAgent {
    chain: FallbackChain,
    heuristic: HeuristicScorer,
    rubric: Rubric,
    settings: EnrichSettings,
}

impl EnrichmentAgent {
    pub fn new(
        chain: FallbackChain,
        heuristic: HeuristicScorer,
        rubric: Rubric,
        settings: EnrichSettings,
    ) -> Self {
        Self {
            chain,
            heuristic,
            rubric,
            settings,
        }
    }

    /// Build the real provider chain. Providers without credentials are skipped; with none
    /// configured every verdict comes from the heuristic and summaries are degraded.
    pub fn from_config(
        cfg: &PipelineConfig,
        creds: &ProviderCredentials,
        heuristic: HeuristicScorer,
        rubric: Rubric,
    ) -> anyhow::Result<Self> {
        let primary = build_provider(cfg.providers.primary_kind(), &cfg.providers, creds)?;
        let secondary = build_provider(cfg.providers.secondary_kind(), &cfg.providers, creds)?;
        let chain = FallbackChain::new(primary, secondary, RetryPolicy::from(&cfg.retry));
        if chain.is_empty() {
            warn!("no generative provider configured; enrichment degrades to heuristic verdicts");
        } else {
            info!(providers = ?chain.provider_names(), "enrichment providers active");
        }
        Ok(Self::new(chain, heuristic, rubric, EnrichSettings::from_config(cfg)))
    }

    pub fn settings(&self) -> &EnrichSettings {
        &self.settings
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.chain.provider_names()
    }

    /// Re-score one candidate: provider chain → structured parser → heuristic.
    pub async fn evaluate(&self, item: &Candidate) -> Evaluation {
        let content = prompt_excerpt(&item.summary, self.settings.excerpt_chars);
        let prompt = self.rubric.scoring_prompt(&item.title, &content);

        match self.chain.run(&prompt, ResponseFormat::Json).await {
            Some(out) => match parse_score_response(&out.text) {
                Some(mut verdict) => {
                    if verdict.reason.is_empty() {
                        verdict.reason = "No rationale given".to_string();
                    }
                    Evaluation {
                        verdict,
                        source: VerdictSource::Provider(out.provider),
                    }
                }
                None => {
                    counter!("enrich_fallback_total", "stage" => "malformed_score").increment(1);
                    warn!(id = %item.log_id(), provider = out.provider, "unparseable score response; using heuristic");
                    self.heuristic_verdict(item, &content)
                }
            },
            None => {
                counter!("enrich_fallback_total", "stage" => "score_exhausted").increment(1);
                self.heuristic_verdict(item, &content)
            }
        }
    }

    fn heuristic_verdict(&self, item: &Candidate, content: &str) -> Evaluation {
        Evaluation {
            verdict: self.heuristic.evaluate(&item.title, content),
            source: VerdictSource::Heuristic,
        }
    }

    /// Produce the human-facing summary. Never fails: falls back to a degraded summary.
    pub async fn summarize(&self, item: &Candidate) -> String {
        let content = prompt_excerpt(&item.summary, self.settings.excerpt_chars);
        let prompt = self.rubric.summary_prompt(&item.title, &content);

        match self.chain.run(&prompt, ResponseFormat::Text).await {
            Some(out) if !out.text.trim().is_empty() => out.text.trim().to_string(),
            _ => {
                counter!("enrich_fallback_total", "stage" => "summary_degraded").increment(1);
                warn!(id = %item.log_id(), "summarization failed on every provider; using degraded summary");
                degraded_summary(
                    &self.rubric,
                    &item.title,
                    &content,
                    self.settings.degraded_excerpt_chars,
                )
            }
        }
    }

    async fn finish(&self, mut item: Candidate) -> Candidate {
        let mut summary = self.summarize(&item).await;
        if let Some(score) = item.agent_score.filter(|s| *s > 0.0) {
            let reason = item.agent_reason.as_deref().unwrap_or_default();
            summary.push_str(&self.rubric.footer(score, reason));
        }
        item.processed_summary = Some(summary);
        item
    }

    /// Enrich a candidate set sequentially. Survivors keep input order.
    pub async fn enrich_batch(&self, candidates: Vec<Candidate>) -> EnrichOutcome {
        let mut out = EnrichOutcome::default();
        let mut rejected: Vec<Candidate> = Vec::new();

        for mut item in candidates {
            let t0 = Instant::now();
            let eval = self.evaluate(&item).await;
            let score = eval.verdict.score;
            item.agent_score = Some(score);
            item.agent_reason = Some(eval.verdict.reason);
            item.agent_action = Some(eval.verdict.action);

            if score >= self.settings.pass_score {
                info!(
                    id = %item.log_id(),
                    title = %item.title_prefix(),
                    score,
                    source = ?eval.source,
                    "candidate kept"
                );
                out.survivors.push(self.finish(item).await);
            } else {
                info!(
                    id = %item.log_id(),
                    title = %item.title_prefix(),
                    score,
                    source = ?eval.source,
                    "candidate dropped: score below bar"
                );
                counter!("enrich_dropped_total").increment(1);
                out.dropped += 1;
                rejected.push(item);
            }

            histogram!("enrich_item_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
            if !self.settings.inter_item_delay.is_zero() {
                tokio::time::sleep(self.settings.inter_item_delay).await;
            }
        }

        if out.survivors.is_empty() {
            if let Some(rescued) = self.rescue(rejected).await {
                out.survivors.push(rescued);
                out.safety_net_used = true;
            }
        }
        out
    }

    /// Safety net: the highest raw-score candidate (first seen on ties) is forced through.
    async fn rescue(&self, rejected: Vec<Candidate>) -> Option<Candidate> {
        let best = best_raw_index(&rejected)?;
        let mut item = rejected.into_iter().nth(best)?;
        warn!(id = %item.log_id(), title = %item.title_prefix(), "all candidates dropped; safety net rescues top raw candidate");
        counter!("pipeline_safety_net_total").increment(1);
        item.agent_score = Some(self.settings.rescue_score);
        item.agent_reason = Some(self.rubric.rescue_reason.clone());
        Some(self.finish(item).await)
    }
}

fn best_raw_index(items: &[Candidate]) -> Option<usize> {
    let mut best: Option<(usize, i32)> = None;
    for (i, c) in items.iter().enumerate() {
        match best {
            Some((_, s)) if c.score <= s => {}
            _ => best = Some((i, c.score)),
        }
    }
    best.map(|(i, _)| i)
}

fn build_provider(
    kind: ProviderKind,
    cfg: &ProvidersCfg,
    creds: &ProviderCredentials,
) -> anyhow::Result<Option<DynProvider>> {
    let provider: Option<DynProvider> = match kind {
        ProviderKind::Gemini => match creds.gemini_api_key.as_deref() {
            Some(key) => Some(Arc::new(GeminiProvider::new(key, &cfg.gemini_model, cfg.timeout())?) as DynProvider),
            None => {
                warn!("gemini selected but GOOGLE_API_KEY is missing; skipping");
                None
            }
        },
        ProviderKind::OpenAi => match creds.openai_api_key.as_deref() {
            Some(key) => Some(Arc::new(OpenAiProvider::new(key, &cfg.openai_model, cfg.timeout())?) as DynProvider),
            None => {
                warn!("openai selected but OPENAI_API_KEY is missing; skipping");
                None
            }
        },
        ProviderKind::None => None,
    };
    Ok(provider)
}
