//! crates.io endpoints and typed records.
//!
//! Every field is optional: the registry omits or nulls fields freely, and a missing
//! crate comes back either as HTTP 404 or as a body with an `errors` array.

use crate::fetch::{Body, Fetch, FetchError, fetch_json};
use c2g_core::PackageRef;
use serde::Deserialize;
use std::sync::Arc;

/// `GET {api}/crates/{name}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrateResponse {
    #[serde(rename = "crate")]
    pub krate: Option<CrateInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrateInfo {
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub repository: Option<String>,
    pub max_version: Option<String>,
}

/// `GET {api}/crates/{name}/{version}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionResponse {
    pub version: Option<VersionInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionInfo {
    pub license: Option<String>,
    /// Site-relative download path, e.g. `/api/v1/crates/foo/1.0.0/download`.
    pub dl_path: Option<String>,
    pub links: Option<VersionLinks>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionLinks {
    /// Site-relative path of the per-version dependency list.
    pub dependencies: Option<String>,
}

/// Body behind [`VersionLinks::dependencies`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DependenciesResponse {
    #[serde(default)]
    pub dependencies: Vec<DependencyRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DependencyRecord {
    pub crate_id: String,
    #[serde(default = "default_kind")]
    pub kind: String,
}

fn default_kind() -> String {
    "normal".to_string()
}

/// Typed access to the registry over a [`Fetch`] implementation.
pub struct RegistryClient {
    fetcher: Arc<dyn Fetch>,
    api_url: String,
    site_url: String,
}

impl RegistryClient {
    pub fn new(fetcher: Arc<dyn Fetch>, api_url: &str, site_url: &str) -> Self {
        Self {
            fetcher,
            api_url: api_url.trim_end_matches('/').to_string(),
            site_url: site_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn crate_url(&self, name: &str) -> String {
        format!("{}/crates/{}", self.api_url, name)
    }

    pub fn version_url(&self, package: &PackageRef) -> String {
        format!(
            "{}/crates/{}/{}",
            self.api_url, package.name, package.version
        )
    }

    /// Join a site-relative path from a version record onto the site root.
    pub fn site_path(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.site_url, path.trim_start_matches('/'))
        }
    }

    /// The crate-level record, `None` if the registry does not know the crate.
    pub fn crate_info(&self, name: &str) -> Result<Option<CrateInfo>, FetchError> {
        absent_on_404(fetch_json::<CrateResponse>(
            self.fetcher.as_ref(),
            &self.crate_url(name),
        ))
        .map(|r| r.and_then(|r| r.krate))
    }

    /// The version-level record, `None` if this exact version is unknown.
    pub fn version_info(&self, package: &PackageRef) -> Result<Option<VersionInfo>, FetchError> {
        absent_on_404(fetch_json::<VersionResponse>(
            self.fetcher.as_ref(),
            &self.version_url(package),
        ))
        .map(|r| r.and_then(|r| r.version))
    }

    /// The dependency list behind a version's `links.dependencies`.
    pub fn dependencies(&self, link: &str) -> Result<DependenciesResponse, FetchError> {
        fetch_json(self.fetcher.as_ref(), &self.site_path(link))
    }

    /// Raw bytes at a site-relative path (used for `dl_path`).
    pub fn download(&self, path: &str) -> Result<Body, FetchError> {
        self.fetcher.fetch(&self.site_path(path))
    }
}

fn absent_on_404<T>(result: Result<T, FetchError>) -> Result<Option<T>, FetchError> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}
