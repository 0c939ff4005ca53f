// src/pipeline.rs
//! Per-category orchestration: fetch → score/filter → dedup → top-N → enrich → top-K → deliver.
//!
//! Categories share no mutable state and run one after the other. Nothing in here aborts a
//! run: failing sources are skipped and enrichment never errors.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::pipeline::{PipelineConfig, SelectionCfg};
use crate::deliver::DeliverySink;
use crate::enrich::EnrichmentAgent;
use crate::ingest::types::CandidateSource;
use crate::ingest::{dedup_with_stats, dedup_within_source, score_and_filter};
use crate::metrics::ensure_metrics_described;
use crate::record::{Candidate, Category};
use crate::relevance::RelevanceEngine;
use crate::select::{select, select_enriched};

pub type DynSource = Arc<dyn CandidateSource>;

/// Outcome of one category pass. `delivered` is the ordered final result.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryReport {
    pub category: Category,
    pub fetched: usize,
    pub rejected: usize,
    pub deduplicated: usize,
    /// Size of the enrichment candidate set (top-N).
    pub candidates: usize,
    /// Enrichment survivors before the final top-K cut.
    pub enriched: usize,
    pub delivered: Vec<Candidate>,
    pub safety_net_used: bool,
}

impl CategoryReport {
    fn empty(category: Category) -> Self {
        Self {
            category,
            fetched: 0,
            rejected: 0,
            deduplicated: 0,
            candidates: 0,
            enriched: 0,
            delivered: Vec::new(),
            safety_net_used: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub categories: Vec<CategoryReport>,
    /// Categories the sink refused. Their reports are still in `categories`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub delivery_failures: Vec<Category>,
}

impl RunReport {
    pub fn category(&self, category: Category) -> Option<&CategoryReport> {
        self.categories.iter().find(|r| r.category == category)
    }

    pub fn delivered_total(&self) -> usize {
        self.categories.iter().map(|r| r.delivered.len()).sum()
    }

    pub fn delivery_ok(&self) -> bool {
        self.delivery_failures.is_empty()
    }
}

pub struct Pipeline {
    engine: RelevanceEngine,
    agent: EnrichmentAgent,
    selection: SelectionCfg,
    keyword_min: i32,
}

impl Pipeline {
    pub fn new(engine: RelevanceEngine, agent: EnrichmentAgent, cfg: &PipelineConfig) -> Self {
        ensure_metrics_described();
        Self {
            engine,
            agent,
            selection: cfg.selection.clone(),
            keyword_min: cfg.thresholds.keyword_min,
        }
    }

    pub fn agent(&self) -> &EnrichmentAgent {
        &self.agent
    }

    /// Both categories, in [`Category::ALL`] order.
    pub async fn run(&self, sources: &[DynSource]) -> RunReport {
        let started_at = Utc::now();
        let mut categories = Vec::with_capacity(Category::ALL.len());
        for category in Category::ALL {
            categories.push(self.run_category(sources, category).await);
        }
        gauge!("pipeline_last_run_ts").set(Utc::now().timestamp() as f64);
        RunReport {
            started_at,
            categories,
            delivery_failures: Vec::new(),
        }
    }

    /// Like [`Pipeline::run`], handing each category report to `sink` as it completes.
    /// A sink error is logged and recorded in [`RunReport::delivery_failures`]; the
    /// remaining categories still run.
    pub async fn run_and_deliver(&self, sources: &[DynSource], sink: &dyn DeliverySink) -> RunReport {
        let started_at = Utc::now();
        let mut categories = Vec::with_capacity(Category::ALL.len());
        let mut delivery_failures = Vec::new();
        for category in Category::ALL {
            let report = self.run_category(sources, category).await;
            if let Err(e) = sink.deliver(&report).await {
                counter!("pipeline_delivery_errors_total", "category" => category.label()).increment(1);
                warn!(category = category.label(), error = ?e, "delivery failed; continuing with next category");
                delivery_failures.push(category);
            }
            categories.push(report);
        }
        gauge!("pipeline_last_run_ts").set(Utc::now().timestamp() as f64);
        RunReport {
            started_at,
            categories,
            delivery_failures,
        }
    }

    pub async fn run_category(&self, sources: &[DynSource], category: Category) -> CategoryReport {
        let cat = category.label();
        let mut report = CategoryReport::empty(category);

        // 1. fetch, with per-source dedup right after each pass
        let mut raw: Vec<Candidate> = Vec::new();
        for source in sources {
            let fetched = match source.fetch(category).await {
                Ok(items) => items,
                Err(e) => {
                    counter!("pipeline_source_errors_total", "source" => source.name().to_string())
                        .increment(1);
                    warn!(source = source.name(), category = cat, error = ?e, "source fetch failed; skipping");
                    continue;
                }
            };
            report.fetched += fetched.len();

            let (matching, foreign): (Vec<_>, Vec<_>) =
                fetched.into_iter().partition(|c| c.category == category);
            if !foreign.is_empty() {
                warn!(
                    source = source.name(),
                    category = cat,
                    count = foreign.len(),
                    "dropping records tagged with another category"
                );
            }

            let (unique, dropped) = dedup_within_source(matching);
            report.deduplicated += dropped;
            raw.extend(unique);
        }
        counter!("pipeline_fetched_total", "category" => cat).increment(report.fetched as u64);

        if raw.is_empty() {
            info!(category = cat, "no candidates fetched");
            return report;
        }

        // 2. keyword score + filter
        let (kept, rejected) = score_and_filter(&self.engine, raw, self.keyword_min);
        report.rejected = rejected;
        counter!("pipeline_rejected_total", "category" => cat).increment(rejected as u64);

        // 3. cross-source dedup
        let (unique, dropped) = dedup_with_stats(kept);
        report.deduplicated += dropped;
        counter!("pipeline_dedup_total", "category" => cat).increment(report.deduplicated as u64);

        // 4. top-N
        let candidates = select(unique, self.selection.candidate_set_size);
        report.candidates = candidates.len();
        if candidates.is_empty() {
            info!(category = cat, rejected, "every candidate was filtered out before enrichment");
            return report;
        }

        // 5. enrich
        let outcome = self.agent.enrich_batch(candidates).await;
        report.enriched = outcome.survivors.len();
        report.safety_net_used = outcome.safety_net_used;

        // 6. top-K, deliverable only
        let (delivered, incomplete): (Vec<_>, Vec<_>) =
            select_enriched(outcome.survivors, self.selection.final_size)
                .into_iter()
                .partition(Candidate::is_deliverable);
        for c in &incomplete {
            warn!(id = %c.log_id(), category = cat, "enriched record lacks link or summary; not delivered");
        }
        counter!("pipeline_delivered_total", "category" => cat).increment(delivered.len() as u64);

        info!(
            category = cat,
            fetched = report.fetched,
            rejected = report.rejected,
            deduplicated = report.deduplicated,
            candidates = report.candidates,
            enriched = report.enriched,
            dropped = outcome.dropped,
            delivered = delivered.len(),
            safety_net = report.safety_net_used,
            "category done"
        );
        report.delivered = delivered;
        report
    }
}
