// src/enrich/chain.rs
//! Provider fallback chain: primary with retries and backoff, then secondary.

use std::time::Duration;

use metrics::counter;
use tracing::{debug, warn};

use super::provider::{DynProvider, ProviderError, ResponseFormat};
use crate::config::pipeline::RetryCfg;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub primary_attempts: u32,
    pub secondary_attempts: u32,
    /// Base delay after transient/blocked failures; multiplied by the attempt number.
    pub generic_backoff: Duration,
    /// Base delay after rate-limit failures; multiplied by the attempt number.
    pub rate_limit_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryCfg::default())
    }
}

impl From<&RetryCfg> for RetryPolicy {
    fn from(cfg: &RetryCfg) -> Self {
        Self {
            primary_attempts: cfg.primary_attempts.max(1),
            secondary_attempts: cfg.secondary_attempts.max(1),
            generic_backoff: cfg.generic_backoff(),
            rate_limit_backoff: cfg.rate_limit_backoff(),
        }
    }
}

impl RetryPolicy {
    /// No sleeping at all; for tests and offline runs.
    pub fn immediate() -> Self {
        Self {
            generic_backoff: Duration::ZERO,
            rate_limit_backoff: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Escalating delay before the next attempt.
    pub fn backoff_for(&self, err: &ProviderError, attempt: u32) -> Duration {
        let base = match err {
            ProviderError::RateLimited(_) => self.rate_limit_backoff,
            _ => self.generic_backoff,
        };
        base.saturating_mul(attempt.max(1))
    }
}

/// Successful chain result: the text and which provider produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainOutput {
    pub text: String,
    pub provider: &'static str,
}

pub struct FallbackChain {
    primary: Option<DynProvider>,
    secondary: Option<DynProvider>,
    policy: RetryPolicy,
}

impl FallbackChain {
    pub fn new(primary: Option<DynProvider>, secondary: Option<DynProvider>, policy: RetryPolicy) -> Self {
        Self {
            primary,
            secondary,
            policy,
        }
    }

    /// A chain with no providers: every call falls through to the caller's heuristic.
    pub fn empty() -> Self {
        Self::new(None, None, RetryPolicy::immediate())
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_none() && self.secondary.is_none()
    }

    /// Names of configured providers, in call order.
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.primary
            .iter()
            .chain(self.secondary.iter())
            .map(|p| p.name())
            .collect()
    }

    /// Run the prompt through the chain. `None` means every configured provider failed.
    pub async fn run(&self, prompt: &str, format: ResponseFormat) -> Option<ChainOutput> {
        if let Some(p) = &self.primary {
            if let Some(out) = self.try_provider(p, prompt, format, self.policy.primary_attempts).await {
                return Some(out);
            }
        }
        if let Some(s) = &self.secondary {
            if let Some(out) = self.try_provider(s, prompt, format, self.policy.secondary_attempts).await {
                return Some(out);
            }
        }
        None
    }

    async fn try_provider(
        &self,
        provider: &DynProvider,
        prompt: &str,
        format: ResponseFormat,
        attempts: u32,
    ) -> Option<ChainOutput> {
        let name = provider.name();
        for attempt in 1..=attempts {
            match provider.generate(prompt, format).await {
                Ok(text) => {
                    debug!(provider = name, attempt, "provider call ok");
                    return Some(ChainOutput { text, provider: name });
                }
                Err(err) => {
                    counter!("enrich_provider_errors_total", "provider" => name, "kind" => err.kind())
                        .increment(1);
                    warn!(provider = name, attempt, kind = err.kind(), error = %err, "provider call failed");

                    if matches!(err, ProviderError::Fatal(_)) {
                        break;
                    }
                    if attempt < attempts {
                        let delay = self.policy.backoff_for(&err, attempt);
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                    }
                }
            }
        }
        None
    }
}
