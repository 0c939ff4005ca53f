// src/enrich/provider.rs
//! Generative provider abstraction + scripted mock.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;

/// What the caller expects back from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Text,
    /// Ask the provider for a JSON object (native JSON mode where supported).
    Json,
}

/// Typed failure of a single provider call. Drives the retry/escalation policy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// HTTP 429 / quota exhausted. Retried with the longer backoff.
    #[error("rate limited: {0}")]
    RateLimited(String),
    /// The provider refused to answer (safety filter, block reason).
    #[error("content blocked: {0}")]
    ContentBlocked(String),
    /// Network error, timeout, 5xx, empty answer.
    #[error("transient error: {0}")]
    Transient(String),
    /// Bad request/credentials; retrying the same provider is pointless.
    #[error("fatal error: {0}")]
    Fatal(String),
}

impl ProviderError {
    /// Short label for logs/metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::RateLimited(_) => "rate_limited",
            ProviderError::ContentBlocked(_) => "content_blocked",
            ProviderError::Transient(_) => "transient",
            ProviderError::Fatal(_) => "fatal",
        }
    }

    /// Classify an HTTP status + body from a provider.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let msg = format!("HTTP {}: {}", status.as_u16(), snippet(body));
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            ProviderError::RateLimited(msg)
        } else if status.is_server_error() || status == reqwest::StatusCode::REQUEST_TIMEOUT {
            ProviderError::Transient(msg)
        } else {
            ProviderError::Fatal(msg)
        }
    }

    /// Classify a transport-level reqwest error.
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::from_status(status, &err.to_string()),
            None => ProviderError::Transient(err.to_string()),
        }
    }
}

fn snippet(body: &str) -> String {
    body.chars().take(200).collect()
}

/// Low-level generative provider: one remote call, no retries.
#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    async fn generate(&self, prompt: &str, format: ResponseFormat) -> Result<String, ProviderError>;
    fn name(&self) -> &'static str;
}

pub type DynProvider = Arc<dyn GenerativeProvider>;

/// Replays a scripted queue of outcomes; once the queue is empty every call returns
/// `fallback`. Counts calls so tests can assert on retry behavior.
pub struct MockProvider {
    name: &'static str,
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    fallback: Result<String, ProviderError>,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(name: &'static str, script: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            name,
            script: Mutex::new(script.into()),
            fallback: Err(ProviderError::Transient("mock script exhausted".into())),
            calls: AtomicUsize::new(0),
        }
    }

    /// A provider that answers every call with `text`.
    pub fn always_ok(name: &'static str, text: impl Into<String>) -> Self {
        Self::new(name, Vec::new()).with_fallback(Ok(text.into()))
    }

    /// A provider that fails every call with `err`.
    pub fn always_err(name: &'static str, err: ProviderError) -> Self {
        Self::new(name, Vec::new()).with_fallback(Err(err))
    }

    pub fn with_fallback(mut self, outcome: Result<String, ProviderError>) -> Self {
        self.fallback = outcome;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerativeProvider for MockProvider {
    async fn generate(&self, _prompt: &str, _format: ResponseFormat) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .ok()
            .and_then(|mut q| q.pop_front());
        next.unwrap_or_else(|| self.fallback.clone())
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
