//! The render-ready record produced for every lockfile node.

use crate::metadata::LicenseExpr;
use crate::package::PackageRef;
use serde::{Deserialize, Serialize};

/// Fully normalized description of one package.
///
/// Dependencies are referenced by value, so a descriptor never needs another
/// descriptor to exist in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    pub package: PackageRef,
    /// Base32 SHA-256 of the source archive, or [`crate::PLACEHOLDER`].
    pub digest: String,
    /// Build-required dependencies, in lockfile declaration order.
    pub normal_deps: Vec<PackageRef>,
    /// Development-only dependencies, in lockfile declaration order.
    pub dev_deps: Vec<PackageRef>,
    /// Trimmed, possibly empty.
    pub description: String,
    /// Trimmed, or [`crate::PLACEHOLDER`].
    pub homepage: String,
    pub license: LicenseExpr,
}

impl PackageDescriptor {
    pub fn has_dependencies(&self) -> bool {
        !self.normal_deps.is_empty() || !self.dev_deps.is_empty()
    }
}
