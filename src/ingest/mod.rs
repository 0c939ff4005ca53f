// src/ingest/mod.rs
//! Raw candidate handling: keyword scoring/filtering and title-based deduplication.

pub mod file_source;
pub mod types;

use std::collections::HashSet;

use crate::record::{title_key, Candidate};
use crate::relevance::RelevanceEngine;

/// Score every record with its category table, dropping hard rejects and anything under `min`.
/// Returns (kept, rejected_count). Order is preserved.
pub fn score_and_filter(
    engine: &RelevanceEngine,
    records: Vec<Candidate>,
    min: i32,
) -> (Vec<Candidate>, usize) {
    let mut rejected = 0usize;
    let mut kept = Vec::with_capacity(records.len());
    for mut rec in records {
        // Always recomputed from the current text, never patched.
        let verdict = engine.score(rec.category, &rec.title, &rec.summary);
        rec.score = verdict.score;
        if verdict.passes(min) {
            kept.push(rec);
        } else {
            tracing::debug!(
                target: "ingest",
                id = %rec.log_id(),
                score = verdict.score,
                hard_reject = verdict.hard_reject,
                "candidate filtered"
            );
            rejected += 1;
        }
    }
    (kept, rejected)
}

/// Cross-source dedup: first occurrence of each normalized title wins.
pub fn dedup(records: Vec<Candidate>) -> Vec<Candidate> {
    dedup_with_stats(records).0
}

/// Same as [`dedup`], also returning how many records were dropped.
pub fn dedup_with_stats(records: Vec<Candidate>) -> (Vec<Candidate>, usize) {
    let mut seen: HashSet<String> = HashSet::new();
    let mut keep = Vec::with_capacity(records.len());
    let mut dropped = 0usize;
    for rec in records {
        if !seen.insert(rec.dedup_key()) {
            dropped += 1;
            continue;
        }
        keep.push(rec);
    }
    (keep, dropped)
}

/// Dedup inside one source's fetch pass: a record is dropped when either its normalized
/// title or its link was already seen. Empty links never collide.
pub fn dedup_within_source(records: Vec<Candidate>) -> (Vec<Candidate>, usize) {
    let mut seen_titles: HashSet<String> = HashSet::new();
    let mut seen_links: HashSet<String> = HashSet::new();
    let mut keep = Vec::with_capacity(records.len());
    let mut dropped = 0usize;

    for rec in records {
        let link = rec.link.trim();
        let link_dup = !link.is_empty() && seen_links.contains(link);
        let key = title_key(&rec.title);
        if link_dup || seen_titles.contains(&key) {
            dropped += 1;
            continue;
        }
        if !link.is_empty() {
            seen_links.insert(link.to_string());
        }
        seen_titles.insert(key);
        keep.push(rec);
    }
    (keep, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Category;

    fn c(title: &str, link: &str) -> Candidate {
        Candidate::new(title, link, "test", Category::International)
    }

    #[test]
    fn dedup_keeps_first_seen() {
        let out = dedup(vec![
            c("AI Agent Launch", "https://a.test/1"),
            c("ai agent launch", "https://b.test/2"),
            c("Other", "https://a.test/3"),
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].link, "https://a.test/1");
        assert_eq!(out[1].title, "Other");
    }

    #[test]
    fn cross_source_dedup_ignores_links() {
        let (out, dropped) = dedup_with_stats(vec![
            c("First", "https://same.test"),
            c("Second", "https://same.test"),
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn within_source_uses_links_too() {
        let (out, dropped) = dedup_within_source(vec![
            c("First", "https://same.test"),
            c("Second", "https://same.test"),
            c("first", "https://other.test"),
            c("Third", ""),
            c("Fourth", ""),
        ]);
        let titles: Vec<_> = out.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Third", "Fourth"]);
        assert_eq!(dropped, 2);
    }

    #[test]
    fn score_and_filter_assigns_scores() {
        let engine = RelevanceEngine::embedded().unwrap();
        let (kept, rejected) = score_and_filter(
            &engine,
            vec![
                c("Claude Opus update announced", ""),
                c("Local startup hires new CEO", ""),
                c("Weather is nice", ""),
            ],
            2,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].score, 15);
        assert_eq!(rejected, 2);
    }
}
