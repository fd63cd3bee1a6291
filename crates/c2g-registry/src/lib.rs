//! Registry side of crate2guix.
//!
//! # Architecture
//!
//! - **fetch**: the `Fetch` capability with HTTP, disk and in-memory layers
//! - **api**: crates.io endpoints and defensively decoded records
//! - **resolver**: package metadata, local overrides first
//! - **classify**: build-required vs development-only dependency edges
//! - **digest**: SHA-256 of source archives in Nix base32

pub mod api;
pub mod classify;
pub mod digest;
pub mod fetch;
pub mod resolver;

pub use api::RegistryClient;
pub use classify::{Classification, DependencyClassifier};
pub use digest::ArchiveDigests;
pub use fetch::{
    CachedFetcher, DiskCache, Fetch, FetchError, HttpFetcher, StaticFetcher,
    is_immutable_registry_url,
};
pub use resolver::MetadataResolver;

use c2g_core::PackageRef;
use c2g_core::config::RegistryConfig;
use std::sync::Arc;
use std::time::Duration;

/// Registry errors that callers either recover from or report.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("no source archive for {package}: {reason}")]
    ArchiveUnavailable { package: PackageRef, reason: String },
    #[error("registry has no dependency list for {package}")]
    DependencyLinkMissing { package: PackageRef },
    #[error("cannot determine latest version of '{name}': {reason}")]
    MaxVersionUnavailable { name: String, reason: String },
}

/// Build the layered fetcher described by `config`: memo → disk (optional) → HTTP.
///
/// The disk layer only keeps immutable registry URLs, so crate records (and with
/// them `max_version`) are fetched fresh on every run.
pub fn build_fetcher(config: &RegistryConfig, use_disk_cache: bool) -> Arc<dyn Fetch> {
    let http: Box<dyn Fetch> = Box::new(HttpFetcher::new(
        &config.user_agent,
        Duration::from_secs(config.timeout_secs),
        config.max_retries,
        Duration::from_millis(config.retry_backoff_ms),
    ));

    let below_memo = match (&config.cache_dir, use_disk_cache) {
        (Some(dir), true) => {
            tracing::debug!(dir = %dir.display(), "using disk cache");
            Box::new(DiskCache::new(dir.clone(), http).only_if(is_immutable_registry_url))
                as Box<dyn Fetch>
        }
        _ => http,
    };

    Arc::new(CachedFetcher::new(below_memo))
}
