//! Configuration for registry access and generation.
//!
//! Load order: explicit path or `crate2guix.toml` in the working directory →
//! environment variables → defaults. Command-line flags are applied by the binary
//! on top of the loaded value.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the config file looked up in the working directory.
pub const CONFIG_FILE: &str = "crate2guix.toml";

/// Upper bound accepted for `registry.max_retries`.
pub const MAX_RETRIES_LIMIT: u32 = 32;

/// Top-level crate2guix configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Crate2GuixConfig {
    pub registry: RegistryConfig,
    pub generate: GenerateConfig,
}

/// Registry access configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Base of the JSON API, e.g. `https://crates.io/api/v1`.
    pub api_url: String,
    /// Site root that relative paths in version records (`dl_path`, `links`) are appended to.
    pub site_url: String,
    pub user_agent: String,
    /// Per-request timeout covering connect and body.
    pub timeout_secs: u64,
    /// Retries after the first attempt for transient failures.
    pub max_retries: u32,
    /// First retry delay; doubles on every attempt.
    pub retry_backoff_ms: u64,
    /// Directory for the on-disk response cache. `None` disables it.
    pub cache_dir: Option<PathBuf>,
}

/// Generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// Worker threads resolving lockfile nodes.
    pub jobs: usize,
    /// Where downloaded crates are unpacked when no lockfile is given.
    pub downloads_dir: PathBuf,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            api_url: "https://crates.io/api/v1".to_string(),
            site_url: "https://crates.io".to_string(),
            user_agent: format!("crate2guix/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 60,
            max_retries: 5,
            retry_backoff_ms: 500,
            cache_dir: default_cache_dir(),
        }
    }
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            jobs: 24,
            downloads_dir: PathBuf::from("crates_downloads"),
        }
    }
}

/// `$XDG_CACHE_HOME/crate2guix`, else `$HOME/.cache/crate2guix`.
fn default_cache_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache")))
        .map(|base| base.join("crate2guix"))
}

/// Helper to parse an env var and apply it to a config field.
fn env_override<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    target: &mut T,
) {
    if let Some(v) = lookup(var)
        && let Ok(n) = v.parse()
    {
        *target = n;
    }
}

impl Crate2GuixConfig {
    /// Load config from `path`, or from `crate2guix.toml` in `cwd` when `path` is
    /// `None`, with env var overrides. Falls back to defaults if no file exists.
    pub fn load(path: Option<&Path>, cwd: &Path) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let candidate = cwd.join(CONFIG_FILE);
                if candidate.exists() {
                    Self::from_file(&candidate)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env(|var| std::env::var(var).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply `C2G_*` overrides read through `lookup`. Unparsable values are ignored;
    /// an empty `C2G_CACHE_DIR` disables the disk cache.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        env_override(&lookup, "C2G_API_URL", &mut self.registry.api_url);
        env_override(&lookup, "C2G_SITE_URL", &mut self.registry.site_url);
        env_override(&lookup, "C2G_TIMEOUT_SECS", &mut self.registry.timeout_secs);
        env_override(&lookup, "C2G_MAX_RETRIES", &mut self.registry.max_retries);
        env_override(&lookup, "C2G_JOBS", &mut self.generate.jobs);
        if let Some(dir) = lookup("C2G_CACHE_DIR") {
            self.registry.cache_dir = (!dir.is_empty()).then(|| PathBuf::from(dir));
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    /// Reject values that would stall or disable the run.
    pub fn validate(&self) -> Result<()> {
        if self.generate.jobs == 0 {
            anyhow::bail!("generate.jobs must be at least 1");
        }
        if self.registry.timeout_secs == 0 {
            anyhow::bail!("registry.timeout_secs must be at least 1");
        }
        if self.registry.max_retries > MAX_RETRIES_LIMIT {
            anyhow::bail!(
                "registry.max_retries ({}) exceeds the limit of {}",
                self.registry.max_retries,
                MAX_RETRIES_LIMIT
            );
        }
        Ok(())
    }
}
