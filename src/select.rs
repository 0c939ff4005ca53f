// src/select.rs
//! Rank-and-truncate selection. Stable: on equal keys the earlier record wins.

use std::cmp::Ordering;

use crate::record::Candidate;

/// Top `n` records by raw keyword `score`, descending.
pub fn select(records: Vec<Candidate>, n: usize) -> Vec<Candidate> {
    select_by(records, n, |c| f64::from(c.score))
}

/// Top `k` enriched records by `agent_score` (absent counts as 0.0), descending.
pub fn select_enriched(records: Vec<Candidate>, k: usize) -> Vec<Candidate> {
    select_by(records, k, |c| c.agent_score.unwrap_or(0.0))
}

/// Generic selector. Never returns more than `min(n, records.len())` items.
pub fn select_by<F>(mut records: Vec<Candidate>, n: usize, key: F) -> Vec<Candidate>
where
    F: Fn(&Candidate) -> f64,
{
    // `sort_by` is stable, so ties keep discovery order.
    records.sort_by(|a, b| cmp_f64_desc(key(a), key(b)));
    records.truncate(n);
    records
}

fn cmp_f64_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}
