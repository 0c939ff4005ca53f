// src/enrich/parse.rs
//! Structured-response parser for scoring answers.
//!
//! Stages, tried in order, each a pure function:
//! 1. [`parse_strict`]: the whole answer (minus code fences) is a JSON object.
//! 2. [`parse_brace_substring`]: JSON between the first `{` and the last `}`.
//! 3. [`parse_fields`]: regex extraction of `score` / `reason` / `action`.
//!
//! `None` from [`parse_score_response`] means the caller should use its heuristic.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// A parsed relevance verdict on the 0..=10 scale.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreVerdict {
    pub score: f64,
    pub reason: String,
    pub action: String,
}

pub fn parse_score_response(text: &str) -> Option<ScoreVerdict> {
    parse_strict(text)
        .or_else(|| parse_brace_substring(text))
        .or_else(|| parse_fields(text))
}

/// Strip markdown code fences around a response.
pub fn strip_code_fences(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

pub fn parse_strict(text: &str) -> Option<ScoreVerdict> {
    let v: Value = serde_json::from_str(strip_code_fences(text)).ok()?;
    from_json(&v)
}

pub fn parse_brace_substring(text: &str) -> Option<ScoreVerdict> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    let v: Value = serde_json::from_str(&text[start..=end]).ok()?;
    from_json(&v)
}

static RE_SCORE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)"?score"?\s*[:=]\s*"?\s*(\d+(?:\.\d+)?)"#).expect("score regex")
});
// "8/10" or "7.5 / 10", but not dates such as 2025/10/03 or 3/10/2025.
static RE_OUT_OF_TEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^\d/.])(\d{1,2}(?:\.\d+)?)\s*/\s*10(?:[^\d/]|$)").expect("out-of-ten regex")
});
static RE_REASON: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?im)^\W*"?reason"?\s*[:=]\s*"?(.+?)"?,?\s*$"#).expect("reason regex"));
static RE_ACTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?im)^\W*"?action"?\s*[:=]\s*"?(.+?)"?,?\s*$"#).expect("action regex"));

pub fn parse_fields(text: &str) -> Option<ScoreVerdict> {
    let raw = RE_SCORE
        .captures(text)
        .or_else(|| RE_OUT_OF_TEN.captures(text))
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|s| (0.0..=10.0).contains(s))?;

    let grab = |re: &Regex| {
        re.captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default()
    };

    Some(ScoreVerdict {
        score: raw,
        reason: grab(&RE_REASON),
        action: grab(&RE_ACTION),
    })
}

fn from_json(v: &Value) -> Option<ScoreVerdict> {
    let obj = v.as_object()?;
    let score = match obj.get("score")? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    let text_field = |key: &str| {
        obj.get(key)
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };
    Some(ScoreVerdict {
        score: clamp_score(score),
        reason: text_field("reason"),
        action: text_field("action"),
    })
}

fn clamp_score(s: f64) -> f64 {
    if s.is_finite() {
        s.clamp(0.0, 10.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_json() {
        let v = parse_strict(r#"{"score": 8.5, "reason": "Useful", "action": "Try it"}"#).unwrap();
        assert_eq!(v.score, 8.5);
        assert_eq!(v.reason, "Useful");
        assert_eq!(v.action, "Try it");
    }

    #[test]
    fn strict_json_in_code_fence_with_string_score() {
        let v = parse_strict("```json\n{\"score\": \"7\", \"reason\": \"ok\"}\n```").unwrap();
        assert_eq!(v.score, 7.0);
        assert!(v.action.is_empty());
    }

    #[test]
    fn brace_substring_inside_prose() {
        let text = "Sure! Here is my rating:\n{\"score\": 6.0, \"reason\": \"generic\"}\nHope it helps.";
        assert!(parse_strict(text).is_none());
        let v = parse_brace_substring(text).unwrap();
        assert_eq!(v.score, 6.0);
    }

    #[test]
    fn field_extraction_legacy_format() {
        let text = "SCORE: 9.2\nREASON: Major model release\nACTION: Benchmark it";
        let v = parse_fields(text).unwrap();
        assert_eq!(v.score, 9.2);
        assert_eq!(v.reason, "Major model release");
        assert_eq!(v.action, "Benchmark it");
    }

    #[test]
    fn field_extraction_out_of_ten() {
        let v = parse_score_response("I'd give this 8/10 overall.").unwrap();
        assert_eq!(v.score, 8.0);
    }

    #[test]
    fn dates_are_not_scores() {
        assert!(parse_score_response("Published 2025/10/03. I cannot assess this article.").is_none());
        assert!(parse_score_response("Updated 3/10/2025, no rating possible.").is_none());
        assert_eq!(parse_score_response("8/10").unwrap().score, 8.0);
        assert_eq!(parse_score_response("Rating: 7.5 / 10.").unwrap().score, 7.5);
    }

    #[test]
    fn out_of_range_field_scores_are_dropped() {
        assert!(parse_fields("SCORE: 85").is_none());
        assert!(parse_fields("I'd say 42/10").is_none());
    }

    #[test]
    fn broken_json_falls_to_regex() {
        let v = parse_score_response(r#"{"score": 7.5, "reason": "cut off"#).unwrap();
        assert_eq!(v.score, 7.5);
    }

    #[test]
    fn unparseable_yields_none() {
        assert!(parse_score_response("I cannot rate this article.").is_none());
        assert!(parse_score_response(r#"{"reason": "no score"}"#).is_none());
    }

    #[test]
    fn scores_are_clamped() {
        assert_eq!(parse_strict(r#"{"score": 42}"#).unwrap().score, 10.0);
    }
}
