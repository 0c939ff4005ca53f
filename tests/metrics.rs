// tests/metrics.rs
// Runs only with `--features strict-metrics`: installs a global recorder.
#![cfg(feature = "strict-metrics")]

use std::sync::Arc;

use ai_news_briefing::config::PipelineConfig;
use ai_news_briefing::enrich::chain::FallbackChain;
use ai_news_briefing::enrich::heuristic::HeuristicScorer;
use ai_news_briefing::enrich::rubric::Rubric;
use ai_news_briefing::enrich::{EnrichSettings, EnrichmentAgent};
use ai_news_briefing::ingest::types::StaticSource;
use ai_news_briefing::metrics::Metrics;
use ai_news_briefing::pipeline::DynSource;
use ai_news_briefing::{Candidate, Category, Pipeline, RelevanceEngine};

#[tokio::test]
async fn run_exports_pipeline_series() {
    let metrics = Metrics::install().expect("recorder installs once per test binary");

    let agent = EnrichmentAgent::new(
        FallbackChain::empty(),
        HeuristicScorer::embedded().unwrap(),
        Rubric::embedded().unwrap(),
        EnrichSettings::immediate(),
    );
    let pipeline = Pipeline::new(RelevanceEngine::embedded().unwrap(), agent, &PipelineConfig::default());
    let items = vec![
        Candidate::new("Claude Opus update announced", "https://m.test/1", "t", Category::International),
        Candidate::new("Startup hires CTO", "https://m.test/2", "t", Category::International),
    ];
    let sources: Vec<DynSource> = vec![Arc::new(StaticSource::new("s", items))];
    let _ = pipeline.run(&sources).await;

    let text = metrics.render();
    for needle in [
        "pipeline_fetched_total",
        "pipeline_rejected_total",
        "pipeline_delivered_total",
        "enrich_fallback_total",
        "enrich_item_ms",
        "pipeline_last_run_ts",
    ] {
        assert!(text.contains(needle), "missing {needle} in:\n{text}");
    }

    let dir = tempfile::tempdir().unwrap();
    let snap = dir.path().join("briefing.prom");
    metrics.write_snapshot(&snap).unwrap();
    assert!(std::fs::read_to_string(&snap).unwrap().contains("pipeline_fetched_total"));
}
