// tests/relevance_tables.rs
// Keyword tables: determinism, hard-reject precedence and the initial threshold boundary.

use ai_news_briefing::ingest::score_and_filter;
use ai_news_briefing::relevance::{RelevanceEngine, REJECT_SCORE};
use ai_news_briefing::{Candidate, Category};

const TINY_TOML: &str = r#"
[international]
version = "test"
reject_patterns = []
negative = []

[[international.tiers]]
name = "one"
weight = 1
keywords = ["alpha"]

[[international.tiers]]
name = "two"
weight = 2
keywords = ["beta"]

[domestic]
version = "test"
"#;

#[test]
fn same_input_same_score() {
    let engine = RelevanceEngine::embedded().unwrap();
    let title = "Anthropic ships Claude agentic coding assistant";
    let body = "Enterprise adoption of the AI tool grows";
    let first = engine.score(Category::International, title, body);
    for _ in 0..5 {
        assert_eq!(engine.score(Category::International, title, body), first);
    }
    assert!(first.score >= 15);
}

#[test]
fn conference_beats_positive_keywords() {
    let engine = RelevanceEngine::embedded().unwrap();
    let v = engine.score(
        Category::International,
        "AI Startup Launches at Conference",
        "A showcase of generative AI products for enterprise",
    );
    assert!(v.hard_reject);
    assert_eq!(v.score, REJECT_SCORE);
}

#[test]
fn negative_keyword_rejects_claude_story() {
    let engine = RelevanceEngine::embedded().unwrap();
    let v = engine.score(Category::International, "OpenAI hires new CFO", "");
    assert!(v.hard_reject);
    assert!(!v.passes(2));
}

#[test]
fn domestic_table_scores_korean() {
    let engine = RelevanceEngine::embedded().unwrap();
    let v = engine.score(Category::Domestic, "클로드 기반 업무 자동화 사례", "");
    assert!(!v.hard_reject);
    assert!(v.score >= 15);

    let r = engine.score(Category::Domestic, "AI 스타트업 개발자 채용 공고", "");
    assert!(r.hard_reject);
}

#[test]
fn threshold_two_passes_one_does_not() {
    let engine = RelevanceEngine::from_toml_str(TINY_TOML).unwrap();
    let exactly_two = Candidate::new("beta news", "https://t/2", "t", Category::International);
    let exactly_one = Candidate::new("alpha news", "https://t/1", "t", Category::International);

    let (kept, rejected) = score_and_filter(&engine, vec![exactly_two, exactly_one], 2);
    assert_eq!(rejected, 1);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].title, "beta news");
    assert_eq!(kept[0].score, 2);
}

const ORDERED_TOML: &str = r#"
[international]
negative = ["obituary", "horoscope"]

[[international.tiers]]
name = "S"
weight = 15
keywords = ["claude", "openai"]

[[international.tiers]]
name = "B"
weight = 3
keywords = ["automation", "enterprise"]

[domestic]
"#;

const PERMUTED_TOML: &str = r#"
[international]
negative = ["horoscope", "obituary"]

[[international.tiers]]
name = "B"
weight = 3
keywords = ["enterprise", "automation"]

[[international.tiers]]
name = "S"
weight = 15
keywords = ["openai", "claude"]

[domestic]
"#;

#[test]
fn table_order_does_not_change_scores() {
    let a = RelevanceEngine::from_toml_str(ORDERED_TOML).unwrap();
    let b = RelevanceEngine::from_toml_str(PERMUTED_TOML).unwrap();
    for (title, body) in [
        ("Claude and OpenAI race for enterprise automation", ""),
        ("Enterprise automation roundup", "mentions claude once"),
        ("Claude horoscope for developers", ""),
        ("Nothing relevant here", ""),
    ] {
        let va = a.score(Category::International, title, body);
        let vb = b.score(Category::International, title, body);
        assert_eq!(va.score, vb.score, "{title}");
        assert_eq!(va.hard_reject, vb.hard_reject, "{title}");
    }
    assert_eq!(
        a.score(Category::International, "Claude and OpenAI race for enterprise automation", "").score,
        36
    );
}

#[test]
fn empty_body_is_no_signal_not_error() {
    let engine = RelevanceEngine::embedded().unwrap();
    let v = engine.score(Category::International, "", "");
    assert_eq!(v.score, 0);
    assert!(!v.hard_reject);
}
