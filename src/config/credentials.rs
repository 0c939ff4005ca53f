// src/config/credentials.rs
use std::{env, fmt};

pub const ENV_GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// API keys for the generative providers. `None` means the provider is not configured
/// and gets skipped when the enrichment agent is built.
#[derive(Clone, Default)]
pub struct ProviderCredentials {
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
}

impl ProviderCredentials {
    /// Read keys from the process environment (after `.env` has been loaded). Blank → `None`.
    pub fn from_env() -> Self {
        Self {
            gemini_api_key: non_blank(env::var(ENV_GOOGLE_API_KEY).ok()),
            openai_api_key: non_blank(env::var(ENV_OPENAI_API_KEY).ok()),
        }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

// Safe diagnostics: key lengths only.
impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("gemini_key_len", &self.gemini_api_key.as_ref().map(|k| k.len()))
            .field("openai_key_len", &self.openai_api_key.as_ref().map(|k| k.len()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[serial_test::serial]
    #[test]
    fn blank_keys_are_unconfigured() {
        env::set_var(ENV_GOOGLE_API_KEY, "   ");
        env::set_var(ENV_OPENAI_API_KEY, "sk-test");
        let c = ProviderCredentials::from_env();
        assert!(c.gemini_api_key.is_none());
        assert_eq!(c.openai_api_key.as_deref(), Some("sk-test"));
        env::remove_var(ENV_GOOGLE_API_KEY);
        env::remove_var(ENV_OPENAI_API_KEY);
    }

    #[test]
    fn debug_never_prints_keys() {
        let c = ProviderCredentials {
            gemini_api_key: Some("secret-value".into()),
            openai_api_key: None,
        };
        let s = format!("{c:?}");
        assert!(!s.contains("secret-value"));
        assert!(s.contains("12"));
    }
}
