//! Descriptor synthesis.

use c2g_core::{LicenseExpr, PLACEHOLDER, PackageDescriptor, PackageRef, RegistryMetadata};
use c2g_registry::Classification;

/// Combine everything known about one node into a [`PackageDescriptor`].
///
/// `edges` are the node's resolved dependencies in lockfile order; both output
/// lists keep that order.
pub fn synthesize(
    package: &PackageRef,
    edges: &[PackageRef],
    classification: &Classification,
    metadata: &RegistryMetadata,
    digest: String,
) -> PackageDescriptor {
    let (normal_deps, dev_deps): (Vec<PackageRef>, Vec<PackageRef>) = edges
        .iter()
        .cloned()
        .partition(|edge| classification.kind_of(&edge.name).is_build_required());

    let description = metadata
        .description
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();

    let homepage = metadata
        .homepage
        .as_deref()
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .unwrap_or(PLACEHOLDER)
        .to_string();

    PackageDescriptor {
        package: package.clone(),
        digest,
        normal_deps,
        dev_deps,
        description,
        homepage,
        license: LicenseExpr::parse(metadata.license.as_deref()),
    }
}
