// src/metrics.rs
//! Metric names, one-time descriptions and the optional Prometheus snapshot for batch runs.

use anyhow::Context;
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::{fs, path::Path};

/// One-time metrics registration (so series carry help text once a recorder is installed).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("pipeline_fetched_total", "Raw candidates returned by sources.");
        describe_counter!(
            "pipeline_source_errors_total",
            "Source fetch errors (source skipped for the run)."
        );
        describe_counter!(
            "pipeline_rejected_total",
            "Candidates hard-rejected or under the keyword threshold."
        );
        describe_counter!("pipeline_dedup_total", "Candidates removed as duplicates.");
        describe_counter!("pipeline_delivered_total", "Enriched records handed to delivery.");
        describe_counter!(
            "pipeline_delivery_errors_total",
            "Category reports the delivery sink failed to accept."
        );
        describe_counter!(
            "pipeline_safety_net_total",
            "Runs where every candidate was dropped and the top one was rescued."
        );
        describe_counter!("enrich_dropped_total", "Candidates dropped for a low agent score.");
        describe_counter!(
            "enrich_fallback_total",
            "Fallbacks taken during enrichment, by stage."
        );
        describe_counter!(
            "enrich_provider_errors_total",
            "Failed generative provider calls, by provider and kind."
        );
        describe_histogram!("enrich_item_ms", "Enrichment time per candidate in milliseconds.");
        describe_gauge!("pipeline_last_run_ts", "Unix ts when the pipeline last ran.");
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder for this process.
    pub fn install() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("installing prometheus recorder")?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// Write the exposition text to `path` (for node-exporter textfile collectors).
    pub fn write_snapshot(&self, path: &Path) -> anyhow::Result<()> {
        let tmp = path.with_extension("prom.tmp");
        fs::write(&tmp, self.render())
            .with_context(|| format!("writing metrics snapshot to {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("moving metrics snapshot to {}", path.display()))?;
        Ok(())
    }
}
