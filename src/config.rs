//! Environment-driven settings.

use std::path::PathBuf;
use std::time::Duration;

use crate::gateway::openrouter::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};

pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";

#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite file holding profiles and responses.
    pub db_path: PathBuf,
    /// `None` disables narrative analysis.
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
    pub model: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(".culture_lens.sqlite"),
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl Config {
    /// Reads `CULTURE_LENS_DB_PATH`, `OPENROUTER_API_KEY`,
    /// `OPENROUTER_BASE_URL`, `OPENROUTER_TIMEOUT_SECONDS` and
    /// `CULTURE_LENS_MODEL`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            db_path: non_blank("CULTURE_LENS_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            api_key: non_blank("OPENROUTER_API_KEY"),
            base_url: non_blank("OPENROUTER_BASE_URL").unwrap_or(defaults.base_url),
            timeout: non_blank("OPENROUTER_TIMEOUT_SECONDS")
                .and_then(|s| s.trim().parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            model: non_blank("CULTURE_LENS_MODEL").unwrap_or(defaults.model),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config.db_path, PathBuf::from(".culture_lens.sqlite"));
        assert_eq!(config.api_key, None);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let config = Config::from_lookup(lookup(&[("OPENROUTER_API_KEY", "  ")]));
        assert_eq!(config.api_key, None);
    }

    #[test]
    fn overrides_are_read() {
        let config = Config::from_lookup(lookup(&[
            ("CULTURE_LENS_DB_PATH", "/tmp/survey.sqlite"),
            ("OPENROUTER_API_KEY", "sk-test"),
            ("OPENROUTER_TIMEOUT_SECONDS", "15"),
            ("CULTURE_LENS_MODEL", "openai/gpt-4o-mini"),
        ]));
        assert_eq!(config.db_path, PathBuf::from("/tmp/survey.sqlite"));
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.model, "openai/gpt-4o-mini");
    }

    #[test]
    fn unparsable_timeout_falls_back() {
        let config = Config::from_lookup(lookup(&[("OPENROUTER_TIMEOUT_SECONDS", "soon")]));
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }
}
