//! Package metadata resolution.
//!
//! A local manifest that matches the package's name and version wins outright; the
//! registry is not consulted for that package, not even to fill gaps.

use crate::RegistryError;
use crate::api::RegistryClient;
use crate::fetch::FetchError;
use c2g_core::memo::MemoCache;
use c2g_core::metadata::MetadataSource;
use c2g_core::{PLACEHOLDER, PackageRef, RegistryMetadata, ResolveError};
use c2g_lock::LocalManifests;
use std::sync::Arc;

/// Resolves [`RegistryMetadata`] per package, memoized for the run.
pub struct MetadataResolver {
    client: Arc<RegistryClient>,
    local: Arc<LocalManifests>,
    cache: MemoCache<PackageRef, Result<RegistryMetadata, ResolveError>>,
}

impl MetadataResolver {
    pub fn new(client: Arc<RegistryClient>, local: Arc<LocalManifests>) -> Self {
        Self {
            client,
            local,
            cache: MemoCache::new(),
        }
    }

    /// Metadata for `package`, from a matching local manifest or else the registry.
    pub fn resolve(&self, package: &PackageRef) -> Result<RegistryMetadata, ResolveError> {
        self.cache.get_or_compute(package, || {
            match self.local_override(&package.name, Some(&package.version)) {
                Some(metadata) => {
                    tracing::debug!(%package, "using local manifest");
                    Ok(metadata)
                }
                None => self.resolve_remote(package),
            }
        })
    }

    /// Whether a local manifest describes `package`.
    pub fn is_local(&self, package: &PackageRef) -> bool {
        self.local
            .lookup(&package.name, Some(&package.version))
            .is_some()
    }

    /// Metadata from a local manifest for `name` (at `version`, or any version).
    ///
    /// Missing homepage becomes the placeholder (after falling back to `repository`),
    /// missing description becomes empty, missing license stays absent.
    pub fn local_override(&self, name: &str, version: Option<&str>) -> Option<RegistryMetadata> {
        let manifest = self.local.lookup(name, version)?;
        Some(RegistryMetadata {
            description: Some(manifest.description.clone().unwrap_or_default()),
            homepage: Some(
                manifest
                    .homepage
                    .clone()
                    .or_else(|| manifest.repository.clone())
                    .unwrap_or_else(|| PLACEHOLDER.to_string()),
            ),
            license: manifest.license.clone(),
            source: MetadataSource::LocalOverride,
        })
    }

    fn resolve_remote(&self, package: &PackageRef) -> Result<RegistryMetadata, ResolveError> {
        let unavailable = |record: String| ResolveError::MetadataUnavailable {
            package: package.clone(),
            record,
        };

        let krate = self
            .client
            .crate_info(&package.name)
            .map_err(|e| unavailable(format!("crate record: {e}")))?
            .ok_or_else(|| unavailable("crate record not found in registry".to_string()))?;

        let version = self
            .client
            .version_info(package)
            .map_err(|e| unavailable(format!("version record: {e}")))?
            .ok_or_else(|| unavailable("version record not found in registry".to_string()))?;

        Ok(RegistryMetadata {
            description: krate.description,
            homepage: krate.homepage.or(krate.repository),
            license: version.license,
            source: MetadataSource::Remote,
        })
    }

    /// The registry's highest published version of `name`.
    ///
    /// Only the registry is asked; local manifests carry no such notion.
    pub fn max_version(&self, name: &str) -> Result<String, RegistryError> {
        let unavailable = |reason: String| RegistryError::MaxVersionUnavailable {
            name: name.to_string(),
            reason,
        };

        self.client
            .crate_info(name)
            .map_err(|e: FetchError| unavailable(e.to_string()))?
            .ok_or_else(|| unavailable("crate not found in registry".to_string()))?
            .max_version
            .ok_or_else(|| unavailable("crate record has no max_version".to_string()))
    }
}
