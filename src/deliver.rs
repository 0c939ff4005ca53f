// src/deliver.rs
//! Delivery seam. Formatting and transport live outside this crate; the core only promises
//! that every delivered record carries a link and a processed summary.

use std::io::{self, Write};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use tracing::debug;

use crate::pipeline::CategoryReport;
use crate::record::Candidate;

#[async_trait::async_trait]
pub trait DeliverySink: Send + Sync {
    async fn deliver(&self, report: &CategoryReport) -> Result<()>;
}

/// Compact per-category payload: just what a downstream formatter needs.
#[derive(Debug, Serialize)]
struct DeliveryPayload<'a> {
    category: &'a str,
    safety_net_used: bool,
    items: &'a [Candidate],
}

/// Writes one JSON line per category to the wrapped writer.
pub struct JsonSink {
    out: Mutex<Box<dyn Write + Send>>,
}

impl JsonSink {
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }
}

#[async_trait::async_trait]
impl DeliverySink for JsonSink {
    async fn deliver(&self, report: &CategoryReport) -> Result<()> {
        let payload = DeliveryPayload {
            category: report.category.label(),
            safety_net_used: report.safety_net_used,
            items: &report.delivered,
        };
        let body = serde_json::to_string(&payload)?;
        let mut out = self
            .out
            .lock()
            .map_err(|_| anyhow!("delivery writer lock poisoned"))?;
        writeln!(out, "{body}").context("writing delivery payload")?;
        out.flush().context("flushing delivery payload")?;
        debug!(category = payload.category, items = report.delivered.len(), "category delivered");
        Ok(())
    }
}

/// Keeps delivered reports in memory.
#[derive(Default)]
pub struct MemorySink {
    reports: Mutex<Vec<CategoryReport>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> Vec<CategoryReport> {
        self.reports.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl DeliverySink for MemorySink {
    async fn deliver(&self, report: &CategoryReport) -> Result<()> {
        self.reports
            .lock()
            .map_err(|_| anyhow!("memory sink lock poisoned"))?
            .push(report.clone());
        Ok(())
    }
}
