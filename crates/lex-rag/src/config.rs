use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::LexError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexConfig {
    pub cache: CacheConfig,
    pub search: SearchConfig,
    pub features: FeatureFlags,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Version tag baked into every cache key. Bumping it orphans old entries
    /// without any explicit invalidation.
    pub key_version: String,
    /// Redis connection URL; None means in-memory caching only.
    pub redis_url: Option<String>,
}

impl CacheConfig {
    /// Key prefix derived from the version tag, e.g. "lex:v2.7:".
    pub fn prefix(&self) -> String {
        format!("lex:v{}:", self.key_version)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Results kept after fusion.
    pub top_k: usize,
    /// RRF constant; higher values flatten the reward for top ranks.
    pub rrf_k: usize,
    /// Token budget for the augmented context injected into prompts.
    pub max_context_tokens: usize,
    /// Token budget for the formatted precedent block in the pipeline.
    pub precedent_tokens: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFlags {
    pub check_hallucinations: bool,
    pub include_scenarios: bool,
}

impl LexConfig {
    /// Validate config values, rejecting clearly broken configurations.
    pub fn validate(&self) -> Result<(), LexError> {
        if self.cache.key_version.trim().is_empty() {
            return Err(LexError::Config("cache.key_version must not be empty".into()));
        }
        if self.search.top_k == 0 {
            return Err(LexError::Config("search.top_k must be > 0".into()));
        }
        if self.search.rrf_k == 0 {
            return Err(LexError::Config("search.rrf_k must be > 0".into()));
        }
        if self.search.max_context_tokens < 500 {
            return Err(LexError::Config(
                "search.max_context_tokens must be >= 500".into(),
            ));
        }
        Ok(())
    }

    /// Load config from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, LexError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| LexError::Config(format!("failed to read config file: {e}")))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| LexError::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for LexConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig {
                key_version: "2.7".to_string(),
                redis_url: std::env::var("REDIS_URL").ok(),
            },
            search: SearchConfig {
                top_k: 7,
                rrf_k: 60,
                max_context_tokens: 4000,
                precedent_tokens: 2000,
            },
            features: FeatureFlags {
                check_hallucinations: true,
                include_scenarios: true,
            },
        }
    }
}
