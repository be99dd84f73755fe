//! Configuration for a content root.
//!
//! Content root sources (highest priority first):
//! 1. Explicit path (CLI `--root`)
//! 2. Environment variable (LISTING_CONTENT_ROOT)
//! 3. Default (./.content)
//!
//! Site settings live in `<root>/config.yml`. The file is optional; unknown
//! keys are kept in `extra` so site-specific settings pass through untouched.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::safety::{is_valid_locale, safe_read_file};
use crate::core::similarity::{DEFAULT_CACHE_TTL, DEFAULT_MAX_RESULTS, DEFAULT_SWEEP_PROBABILITY};

/// Environment variable naming the content root
pub const ROOT_ENV: &str = "LISTING_CONTENT_ROOT";

/// Content root used when nothing else is configured
pub const DEFAULT_ROOT: &str = ".content";

/// Site config file name, relative to the content root
pub const CONFIG_FILE: &str = "config.yml";

/// `config.yml` schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,

    /// Singular noun for listed items ("tool", "app", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,

    /// Locale of the base YAML files; it never gets an overlay
    #[serde(default = "default_locale")]
    pub default_locale: String,

    /// Locales the site advertises
    #[serde(default)]
    pub locales: Vec<String>,

    #[serde(default)]
    pub similarity: SimilaritySettings,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

fn default_locale() -> String {
    "en".to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_name: None,
            item_name: None,
            default_locale: default_locale(),
            locales: Vec::new(),
            similarity: SimilaritySettings::default(),
            extra: BTreeMap::new(),
        }
    }
}

/// Related-items tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilaritySettings {
    /// Results returned when the caller does not pass a count (default: 6)
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Cached ranking lifetime in seconds (default: 300 = 5 min)
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,

    /// Per-call chance of sweeping expired cache entries (default: 0.1)
    #[serde(default = "default_sweep_probability")]
    pub sweep_probability: f64,
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}
fn default_cache_ttl() -> u64 {
    DEFAULT_CACHE_TTL.as_secs()
}
fn default_sweep_probability() -> f64 {
    DEFAULT_SWEEP_PROBABILITY
}

impl Default for SimilaritySettings {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            cache_ttl_seconds: default_cache_ttl(),
            sweep_probability: default_sweep_probability(),
        }
    }
}

impl SimilaritySettings {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }
}

impl SiteConfig {
    /// Parse and validate `config.yml` content
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content).context("Failed to parse config YAML")?;
        config.validate()?;
        Ok(config)
    }

    /// Check locale codes and similarity settings
    pub fn validate(&self) -> Result<()> {
        if !is_valid_locale(&self.default_locale) {
            anyhow::bail!("Invalid default_locale: {:?}", self.default_locale);
        }
        if let Some(bad) = self.locales.iter().find(|l| !is_valid_locale(l)) {
            anyhow::bail!("Invalid locale in locales: {:?}", bad);
        }
        if !(0.0..=1.0).contains(&self.similarity.sweep_probability) {
            anyhow::bail!(
                "similarity.sweep_probability must be within [0, 1], got {}",
                self.similarity.sweep_probability
            );
        }
        Ok(())
    }
}

/// Pick the content root from an explicit path, the environment, or the default
pub fn resolve_content_root(explicit: Option<&Path>) -> PathBuf {
    pick_root(explicit, std::env::var(ROOT_ENV).ok())
}

fn pick_root(explicit: Option<&Path>, env_root: Option<String>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match env_root {
        Some(root) if !root.trim().is_empty() => PathBuf::from(root),
        _ => PathBuf::from(DEFAULT_ROOT),
    }
}

/// Load `<root>/config.yml`, falling back to defaults when it is absent
pub async fn load_site_config(root: &Path) -> Result<SiteConfig> {
    let path = root.join(CONFIG_FILE);
    match safe_read_file(&path, root).await {
        Ok(content) => SiteConfig::from_yaml(&content)
            .with_context(|| format!("Invalid config file: {}", path.display())),
        Err(e) if e.is_not_found() => Ok(SiteConfig::default()),
        Err(e) => Err(e).with_context(|| format!("Failed to read config file: {}", path.display())),
    }
}
