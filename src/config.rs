//! Runtime settings.
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! `mon_toit.toml`, then `MON_TOIT__<SECTION>__<KEY>` environment variables.

use crate::error::{MarketError, Result};
use crate::recommendation::ScoringWeights;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "mon_toit.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub backend: BackendSettings,
    pub pagination: PaginationSettings,
    pub recommendation: RecommendationSettings,
}

/// Hosted backend connection; without a URL the in-memory store is used
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            timeout_secs: 30,
        }
    }
}

impl BackendSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PaginationSettings {
    pub page_size: usize,
    pub cache_ttl_minutes: i64,
    pub prefetch: bool,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            page_size: 20,
            cache_ttl_minutes: 5,
            prefetch: true,
        }
    }
}

impl PaginationSettings {
    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.cache_ttl_minutes)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecommendationSettings {
    /// Number of recommendations returned
    pub limit: usize,
    /// Number of available listings scored per request
    pub candidate_pool: usize,
    /// Number of activity records read per request
    pub activity_window: usize,
    pub weights: ScoringWeights,
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            limit: 10,
            candidate_pool: 100,
            activity_window: 50,
            weights: ScoringWeights::default(),
        }
    }
}

impl Settings {
    /// Load from `mon_toit.toml` in the working directory and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let settings: Settings = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("MON_TOIT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(|err| MarketError::Config(err.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.pagination.page_size == 0 {
            return Err(MarketError::Config("pagination.page_size must be positive".into()));
        }
        if self.pagination.cache_ttl_minutes < 0 {
            return Err(MarketError::Config(
                "pagination.cache_ttl_minutes must not be negative".into(),
            ));
        }
        if self.recommendation.candidate_pool == 0 {
            return Err(MarketError::Config(
                "recommendation.candidate_pool must be positive".into(),
            ));
        }
        if self.backend.url.is_some() && self.backend.api_key.is_none() {
            return Err(MarketError::Config("backend.api_key is required with backend.url".into()));
        }
        Ok(())
    }
}
