// tests/pipeline_e2e.rs
// Whole-pipeline runs with in-memory sources and no generative providers.

use std::fs;
use std::sync::Arc;

use ai_news_briefing::config::PipelineConfig;
use ai_news_briefing::enrich::chain::{FallbackChain, RetryPolicy};
use ai_news_briefing::enrich::heuristic::HeuristicScorer;
use ai_news_briefing::enrich::provider::DynProvider;
use ai_news_briefing::enrich::rubric::Rubric;
use ai_news_briefing::enrich::{EnrichSettings, EnrichmentAgent, MockProvider};
use ai_news_briefing::ingest::file_source::JsonFileSource;
use ai_news_briefing::ingest::types::StaticSource;
use ai_news_briefing::pipeline::{CategoryReport, DynSource};
use ai_news_briefing::{Candidate, Category, DeliverySink, MemorySink, Pipeline, RelevanceEngine};

fn pipeline_with(chain: FallbackChain) -> Pipeline {
    let agent = EnrichmentAgent::new(
        chain,
        HeuristicScorer::embedded().unwrap(),
        Rubric::embedded().unwrap(),
        EnrichSettings::immediate(),
    );
    Pipeline::new(RelevanceEngine::embedded().unwrap(), agent, &PipelineConfig::default())
}

fn intl(title: &str, link: &str) -> Candidate {
    Candidate::new(title, link, "fixture", Category::International)
}

#[tokio::test]
async fn claude_kept_hiring_rejected_duplicate_collapsed() {
    let a = intl("Claude Opus update announced", "https://news.test/a");
    let b = intl("Local startup hires new CEO", "https://news.test/b")
        .with_summary("The company is hiring across teams.");
    let c = intl("claude opus UPDATE announced", "https://other.test/c");

    let sources: Vec<DynSource> = vec![
        Arc::new(StaticSource::new("one", vec![a, b])),
        Arc::new(StaticSource::new("two", vec![c])),
    ];
    let report = pipeline_with(FallbackChain::empty())
        .run_category(&sources, Category::International)
        .await;

    assert_eq!(report.fetched, 3);
    assert_eq!(report.rejected, 1);
    assert_eq!(report.deduplicated, 1);
    assert_eq!(report.delivered.len(), 1);

    let only = &report.delivered[0];
    assert_eq!(only.link, "https://news.test/a");
    assert_eq!(only.score, 15);
    assert_eq!(only.agent_score, Some(9.0));
    assert!(only.processed_summary.as_deref().is_some_and(|s| !s.is_empty()));
    assert!(!report.safety_net_used);
}

#[tokio::test]
async fn all_low_scores_still_deliver_one() {
    let provider: DynProvider = Arc::new(MockProvider::always_ok(
        "strict",
        r#"{"score": 3.0, "reason": "marginal"}"#,
    ));
    let chain = FallbackChain::new(Some(provider), None, RetryPolicy::immediate());
    let items = vec![
        intl("Enterprise LLM adoption survey", "https://n.test/1"),
        intl("Claude gets a new coding mode", "https://n.test/2"),
        intl("Workflow automation for business", "https://n.test/3"),
    ];
    let sources: Vec<DynSource> = vec![Arc::new(StaticSource::new("s", items))];

    let report = pipeline_with(chain)
        .run_category(&sources, Category::International)
        .await;
    assert!(report.safety_net_used);
    assert_eq!(report.enriched, 1);
    assert_eq!(report.delivered.len(), 1);
    assert_eq!(report.delivered[0].link, "https://n.test/2");
}

#[tokio::test]
async fn categories_are_independent_and_bounded() {
    let mut items = Vec::new();
    for i in 0..10 {
        items.push(intl(&format!("OpenAI release {i}"), &format!("https://i.test/{i}")));
    }
    items.push(Candidate::new(
        "제미나이 업무 자동화 도입",
        "https://d.test/1",
        "fixture",
        Category::Domestic,
    ));
    let sources: Vec<DynSource> = vec![Arc::new(StaticSource::new("mixed", items))];

    let sink = MemorySink::new();
    let report = pipeline_with(FallbackChain::empty())
        .run_and_deliver(&sources, &sink)
        .await;
    assert!(report.delivery_ok());

    let i = report.category(Category::International).unwrap();
    assert_eq!(i.candidates, 6);
    assert_eq!(i.delivered.len(), 3);
    let d = report.category(Category::Domestic).unwrap();
    assert_eq!(d.delivered.len(), 1);

    let delivered = sink.reports();
    assert_eq!(delivered.len(), 2);
    assert_eq!(delivered[0].category, Category::International);
    assert!(delivered
        .iter()
        .flat_map(|r| r.delivered.iter())
        .all(|c| c.is_deliverable()));
}

#[tokio::test]
async fn empty_run_yields_nothing() {
    let sources: Vec<DynSource> = vec![Arc::new(StaticSource::new("none", Vec::new()))];
    let report = pipeline_with(FallbackChain::empty()).run(&sources).await;
    assert_eq!(report.delivered_total(), 0);
    assert!(report.categories.iter().all(|r| !r.safety_net_used));
}

#[tokio::test]
async fn file_source_feeds_the_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("candidates.json");
    fs::write(
        &path,
        r#"[
            {"title": "Anthropic launches Claude agent SDK", "link": "https://f.test/1", "category": "international"},
            {"title": "Crypto game NFT drop", "link": "https://f.test/2", "category": "international"},
            {"title": "챗GPT 기업 도입 사례", "link": "https://f.test/3", "category": "domestic", "summary": "<b>생산성</b> 향상"}
        ]"#,
    )
    .unwrap();

    let sources: Vec<DynSource> = vec![Arc::new(JsonFileSource::new(&path))];
    let report = pipeline_with(FallbackChain::empty()).run(&sources).await;

    let i = report.category(Category::International).unwrap();
    assert_eq!(i.fetched, 2);
    assert_eq!(i.rejected, 1);
    assert_eq!(i.delivered.len(), 1);
    let d = report.category(Category::Domestic).unwrap();
    assert_eq!(d.delivered.len(), 1);
}

#[tokio::test]
async fn missing_file_is_not_fatal() {
    let sources: Vec<DynSource> = vec![Arc::new(JsonFileSource::new("/nonexistent/candidates.json"))];
    let report = pipeline_with(FallbackChain::empty()).run(&sources).await;
    assert_eq!(report.delivered_total(), 0);
}

/// Refuses international reports, records everything else.
struct RefusesInternational {
    inner: MemorySink,
}

#[async_trait::async_trait]
impl DeliverySink for RefusesInternational {
    async fn deliver(&self, report: &CategoryReport) -> anyhow::Result<()> {
        if report.category == Category::International {
            anyhow::bail!("webhook rejected payload");
        }
        self.inner.deliver(report).await
    }
}

#[tokio::test]
async fn sink_failure_does_not_stop_later_categories() {
    let items = vec![
        intl("Claude Opus update announced", "https://s.test/1"),
        Candidate::new("클로드 업무 자동화 사례", "https://s.test/2", "fixture", Category::Domestic),
    ];
    let sources: Vec<DynSource> = vec![Arc::new(StaticSource::new("mixed", items))];
    let sink = RefusesInternational {
        inner: MemorySink::new(),
    };

    let report = pipeline_with(FallbackChain::empty())
        .run_and_deliver(&sources, &sink)
        .await;

    assert!(!report.delivery_ok());
    assert_eq!(report.delivery_failures, vec![Category::International]);
    assert_eq!(report.categories.len(), 2);

    let delivered = sink.inner.reports();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].category, Category::Domestic);
    assert_eq!(delivered[0].delivered.len(), 1);
}
