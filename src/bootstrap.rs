// src/bootstrap.rs
//! Wiring: loads configuration and credentials once and builds the pipeline from them.

use std::env;
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{PipelineConfig, ProviderCredentials};
use crate::enrich::chain::{FallbackChain, RetryPolicy};
use crate::enrich::heuristic::HeuristicScorer;
use crate::enrich::rubric::Rubric;
use crate::enrich::{EnrichSettings, EnrichmentAgent, MockProvider, ProviderError};
use crate::pipeline::Pipeline;
use crate::record::{Candidate, Category};
use crate::relevance::RelevanceEngine;

/// `AI_TEST_MODE=mock` swaps real providers for mocks that always fail, so the whole
/// fallback path runs without network access.
pub const ENV_AI_TEST_MODE: &str = "AI_TEST_MODE";

pub struct Runtime {
    pub cfg: PipelineConfig,
    pub pipeline: Pipeline,
}

impl Runtime {
    pub fn from_env() -> anyhow::Result<Self> {
        let cfg = PipelineConfig::load()?;
        let creds = ProviderCredentials::from_env();
        Self::build(cfg, &creds)
    }

    pub fn build(cfg: PipelineConfig, creds: &ProviderCredentials) -> anyhow::Result<Self> {
        let engine = RelevanceEngine::load()?;
        let heuristic = HeuristicScorer::load()?;
        let rubric = Rubric::load()?;

        // Safe diagnostics: only which keys are present, never their values
        info!(
            primary = %cfg.providers.primary,
            secondary = %cfg.providers.secondary,
            gemini_key = creds.gemini_api_key.is_some(),
            openai_key = creds.openai_api_key.is_some(),
            rubric = %rubric.version,
            "pipeline config loaded"
        );

        let agent = if mock_mode() {
            warn!("{ENV_AI_TEST_MODE}=mock: providers replaced by failing mocks");
            mock_agent(&cfg, heuristic, rubric)
        } else {
            EnrichmentAgent::from_config(&cfg, creds, heuristic, rubric)?
        };
        let pipeline = Pipeline::new(engine, agent, &cfg);
        Ok(Self { cfg, pipeline })
    }

    /// One scoring call on a fixed sample, logged. Never fails.
    pub async fn quick_probe(&self) {
        let agent = self.pipeline.agent();
        if agent.provider_names().is_empty() {
            warn!("quick probe: no provider configured, verdict will come from the heuristic");
        }
        let sample = Candidate::new(
            "Anthropic releases Claude update with longer context",
            "https://example.com/probe",
            "probe",
            Category::International,
        )
        .with_summary("The update targets agentic coding workflows and enterprise automation.");
        let eval = agent.evaluate(&sample).await;
        info!(
            score = eval.verdict.score,
            source = ?eval.source,
            reason = %eval.verdict.reason,
            "quick probe verdict"
        );
    }
}

fn mock_mode() -> bool {
    env::var(ENV_AI_TEST_MODE)
        .map(|v| v.trim().eq_ignore_ascii_case("mock"))
        .unwrap_or(false)
}

fn mock_agent(cfg: &PipelineConfig, heuristic: HeuristicScorer, rubric: Rubric) -> EnrichmentAgent {
    let primary = Arc::new(MockProvider::always_err(
        "mock-primary",
        ProviderError::Transient("mock mode".into()),
    ));
    let secondary = Arc::new(MockProvider::always_err(
        "mock-secondary",
        ProviderError::Transient("mock mode".into()),
    ));
    let chain = FallbackChain::new(Some(primary), Some(secondary), RetryPolicy::immediate());
    EnrichmentAgent::new(chain, heuristic, rubric, EnrichSettings::from_config(cfg))
}
