//! Source archive digests.

use crate::RegistryError;
use crate::api::RegistryClient;
use crate::fetch::Body;
use crate::resolver::MetadataResolver;
use c2g_core::memo::MemoCache;
use c2g_core::{PLACEHOLDER, PackageRef, base32};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Computes and memoizes the base32 SHA-256 of each package's `.crate` archive.
pub struct ArchiveDigests {
    client: Arc<RegistryClient>,
    resolver: Arc<MetadataResolver>,
    cache: MemoCache<PackageRef, Result<String, RegistryError>>,
}

impl ArchiveDigests {
    pub fn new(client: Arc<RegistryClient>, resolver: Arc<MetadataResolver>) -> Self {
        Self {
            client,
            resolver,
            cache: MemoCache::new(),
        }
    }

    /// Download the archive of `package`.
    ///
    /// Local packages have no published archive; neither do versions whose record
    /// lacks a `dl_path`.
    pub fn archive(&self, package: &PackageRef) -> Result<Body, RegistryError> {
        let unavailable = |reason: String| RegistryError::ArchiveUnavailable {
            package: package.clone(),
            reason,
        };

        if self.resolver.is_local(package) {
            return Err(unavailable("package comes from a local manifest".to_string()));
        }

        let dl_path = self
            .client
            .version_info(package)
            .map_err(|e| unavailable(e.to_string()))?
            .and_then(|v| v.dl_path)
            .ok_or_else(|| unavailable("version record has no dl_path".to_string()))?;

        self.client
            .download(&dl_path)
            .map_err(|e| unavailable(e.to_string()))
    }

    /// Base32 SHA-256 of the archive of `package`.
    pub fn digest(&self, package: &PackageRef) -> Result<String, RegistryError> {
        self.cache.get_or_compute(package, || {
            let archive = self.archive(package)?;
            Ok(base32::encode(&Sha256::digest(archive.as_slice())))
        })
    }

    /// Like [`Self::digest`], substituting [`PLACEHOLDER`] when the archive is
    /// unavailable. A missing hash can be fixed by hand; a missing package cannot.
    pub fn digest_or_placeholder(&self, package: &PackageRef) -> String {
        match self.digest(package) {
            Ok(digest) => digest,
            Err(e) => {
                tracing::warn!(%package, "using placeholder hash: {}", e);
                PLACEHOLDER.to_string()
            }
        }
    }
}
