//! TOML configuration for runtriage.
//!
//! Layered: an explicit `--config` path, then the file named by
//! `RUNTRIAGE_CONFIG`, then compiled-in defaults. `RUNTRIAGE_HISTORY_URL`
//! overrides the history service address on top of whichever layer won.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub const CONFIG_ENV: &str = "RUNTRIAGE_CONFIG";
pub const HISTORY_URL_ENV: &str = "RUNTRIAGE_HISTORY_URL";
pub const DEFAULT_HISTORY_URL: &str = "http://localhost:8000";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriageConfig {
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

impl TriageConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        if config.history.timeout_secs < MIN_TIMEOUT_SECS {
            warn!(
                timeout_secs = config.history.timeout_secs,
                min = MIN_TIMEOUT_SECS,
                "history timeout too small, clamping"
            );
        }
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Resolve the effective configuration. Never fails: unreadable files
    /// are logged and skipped.
    pub fn resolve(explicit: Option<&Path>) -> Self {
        let env_path = std::env::var(CONFIG_ENV).ok();
        let mut config = Self::from_layers(explicit, env_path.as_deref().map(Path::new));
        if let Ok(url) = std::env::var(HISTORY_URL_ENV) {
            debug!(%url, "history URL overridden from environment");
            config.history.base_url = url;
        }
        config
    }

    fn from_layers(explicit: Option<&Path>, env_path: Option<&Path>) -> Self {
        for path in [explicit, env_path].into_iter().flatten() {
            match Self::load(path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "config file could not be loaded, trying fallback"
                    );
                }
            }
        }
        debug!("no config file loaded, using compiled-in defaults");
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Base URL of the results history service.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_HISTORY_URL.to_string(),
            timeout_secs: 5,
        }
    }
}

/// Shortest request timeout honored; `0` would fail every fetch.
pub const MIN_TIMEOUT_SECS: u64 = 1;

impl HistoryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(MIN_TIMEOUT_SECS))
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Link printed at the top of every summary, e.g. the CI job page.
    pub results_link: Option<String>,
    /// Known-failure hints file used when `--hints` is not given.
    pub hints_file: Option<String>,
}
