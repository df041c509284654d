/// Configuration management using figment
///
/// Loads configuration with this precedence (highest wins):
/// 1. Defaults (hardcoded)
/// 2. TOML file: bioseeker.toml (in working directory)
/// 3. Environment variables: prefixed BIOSEEKER_, nested with `__`
///    (e.g., BIOSEEKER_AI__API_KEY=pplx-..., BIOSEEKER_SEARCH__CACHE_TTL_SECS=60)
///
/// The AI credential is also picked up from PERPLEXITY_API_KEY when the
/// prefixed variable is not set.

use figment::{
    Figment,
    providers::{Env, Format, Toml, Serialized},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use crate::errors::BioseekerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Optional file path for log output (in addition to stderr)
    #[serde(default)]
    pub log_file: Option<String>,

    #[serde(default)]
    pub collection: CollectionConfig,

    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

/// Where the publication catalog is fetched from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// "file" (local JSON array) or "firestore" (Firestore REST API)
    #[serde(default = "default_collection_provider")]
    pub provider: String,

    /// Path of the JSON catalog used by the "file" provider
    #[serde(default = "default_file_path")]
    pub file_path: String,

    #[serde(default = "default_firestore_base_url")]
    pub firestore_base_url: String,

    #[serde(default)]
    pub firestore_project_id: Option<String>,

    /// Web API key appended as `?key=` to Firestore requests
    #[serde(default)]
    pub firestore_api_key: Option<String>,

    /// Collection name holding the publications
    #[serde(default = "default_collection_name")]
    pub collection: String,

    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

/// AI collaborator (Perplexity-compatible chat completions endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Bearer credential. Absent → every AI feature is disabled.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_ai_base_url")]
    pub base_url: String,

    #[serde(default = "default_ai_model")]
    pub model: String,

    /// Hard timeout for a single completion call
    #[serde(default = "default_ai_timeout_secs")]
    pub timeout_secs: u64,

    /// Only citations hosted on these domains (or their subdomains) are kept
    #[serde(default = "default_allowed_domains")]
    pub allowed_domains: Vec<String>,

    /// Upper bound on external records requested and kept per search
    #[serde(default = "default_max_external_results")]
    pub max_external_results: usize,
}

/// Ranking, merging and caching knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Size of the merged result list
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Added to every external record's score during merge
    #[serde(default = "default_external_boost")]
    pub external_boost: i64,

    /// Number of local results formatted for display
    #[serde(default = "default_format_limit")]
    pub format_limit: usize,

    /// Quiet period before an edited query is searched (interactive mode)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Ask the AI collaborator for an overview/answer after each search
    #[serde(default = "default_summarize")]
    pub summarize: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_collection_provider() -> String {
    "file".to_string()
}

fn default_file_path() -> String {
    "publications.json".to_string()
}

fn default_firestore_base_url() -> String {
    "https://firestore.googleapis.com/v1".to_string()
}

fn default_collection_name() -> String {
    "publications".to_string()
}

fn default_page_size() -> u32 {
    300
}

fn default_ai_base_url() -> String {
    "https://api.perplexity.ai".to_string()
}

fn default_ai_model() -> String {
    "sonar".to_string()
}

fn default_ai_timeout_secs() -> u64 {
    30
}

fn default_allowed_domains() -> Vec<String> {
    vec![
        "science.nasa.gov".to_string(),
        "public.ksc.nasa.gov".to_string(),
        "taskbook.nasaprs.com".to_string(),
    ]
}

fn default_max_external_results() -> usize {
    10
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_cache_capacity() -> usize {
    50
}

fn default_max_results() -> usize {
    40
}

fn default_external_boost() -> i64 {
    10
}

fn default_format_limit() -> usize {
    50
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_summarize() -> bool {
    true
}

impl Default for CollectionConfig {
    fn default() -> Self {
        CollectionConfig {
            provider: default_collection_provider(),
            file_path: default_file_path(),
            firestore_base_url: default_firestore_base_url(),
            firestore_project_id: None,
            firestore_api_key: None,
            collection: default_collection_name(),
            page_size: default_page_size(),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig {
            api_key: None,
            base_url: default_ai_base_url(),
            model: default_ai_model(),
            timeout_secs: default_ai_timeout_secs(),
            allowed_domains: default_allowed_domains(),
            max_external_results: default_max_external_results(),
        }
    }
}

impl AiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// True when a non-blank credential is configured.
    pub fn is_enabled(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_capacity: default_cache_capacity(),
            max_results: default_max_results(),
            external_boost: default_external_boost(),
            format_limit: default_format_limit(),
            debounce_ms: default_debounce_ms(),
            summarize: default_summarize(),
        }
    }
}

impl SearchConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: default_log_level(),
            log_file: None,
            collection: CollectionConfig::default(),
            ai: AiConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from defaults, TOML file, and environment variables
    ///
    /// Environment variables override TOML file values.
    /// Example: BIOSEEKER_LOG_LEVEL=debug overrides log_level in bioseeker.toml
    pub fn load() -> Result<Config, BioseekerError> {
        Self::from_figment(
            Figment::new()
                .merge(Serialized::defaults(Config::default()))
                .merge(Toml::file("bioseeker.toml"))
                .merge(Env::prefixed("BIOSEEKER_").split("__")),
        )
    }

    fn from_figment(figment: Figment) -> Result<Config, BioseekerError> {
        let mut config: Config = figment
            .extract()
            .map_err(|e| BioseekerError::Config(format!("Failed to load config: {}", e)))?;

        if config.ai.api_key.is_none() {
            config.ai.api_key = std::env::var("PERPLEXITY_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty());
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_file, None);
        assert_eq!(config.collection.provider, "file");
        assert_eq!(config.ai.model, "sonar");
        assert_eq!(config.ai.timeout(), Duration::from_secs(30));
        assert_eq!(config.ai.allowed_domains.len(), 3);
        assert_eq!(config.search.cache_capacity, 50);
        assert_eq!(config.search.cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.search.max_results, 40);
        assert_eq!(config.search.external_boost, 10);
        assert_eq!(config.search.debounce(), Duration::from_millis(500));
    }

    #[test]
    fn test_ai_disabled_without_key() {
        let mut ai = AiConfig::default();
        assert!(!ai.is_enabled());
        ai.api_key = Some("   ".to_string());
        assert!(!ai.is_enabled());
        ai.api_key = Some("pplx-123".to_string());
        assert!(ai.is_enabled());
    }

    #[test]
    fn test_toml_overrides_nested_sections() {
        let toml = r#"
            log_level = "debug"

            [ai]
            api_key = "pplx-test"
            timeout_secs = 5

            [search]
            cache_capacity = 3
        "#;
        let config = Config::from_figment(
            Figment::new()
                .merge(Serialized::defaults(Config::default()))
                .merge(Toml::string(toml)),
        )
        .unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.ai.api_key.as_deref(), Some("pplx-test"));
        assert_eq!(config.ai.timeout_secs, 5);
        assert_eq!(config.ai.model, "sonar");
        assert_eq!(config.search.cache_capacity, 3);
        assert_eq!(config.search.max_results, 40);
    }
}
