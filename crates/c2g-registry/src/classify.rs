//! Dependency kind classification.
//!
//! The lockfile says which edges exist; the registry's per-version dependency list
//! says what they are for. When the registry has no list (local or unpublished
//! packages) every edge is treated as build-required. That fallback is permissive:
//! it can turn a development-only dependency into a build input, never the reverse.

use crate::RegistryError;
use crate::api::RegistryClient;
use crate::resolver::MetadataResolver;
use c2g_core::{Kind, PackageRef, ResolveError};
use std::collections::HashMap;
use std::sync::Arc;

/// Kinds of a package's dependency edges, keyed by dependency name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    kinds: HashMap<String, Kind>,
    /// True when no registry data was available and everything defaulted to `Normal`.
    pub fallback: bool,
}

impl Classification {
    /// Every declared edge is `Normal`.
    pub fn permissive(edges: &[PackageRef]) -> Self {
        Self {
            kinds: edges
                .iter()
                .map(|edge| (edge.name.clone(), Kind::Normal))
                .collect(),
            fallback: true,
        }
    }

    pub fn from_kinds(kinds: HashMap<String, Kind>) -> Self {
        Self {
            kinds,
            fallback: false,
        }
    }

    /// Kind of the dependency named `name`; names the registry did not list are `Normal`.
    pub fn kind_of(&self, name: &str) -> Kind {
        self.kinds.get(name).copied().unwrap_or(Kind::Normal)
    }
}

/// Classifies dependency edges from registry per-version data.
pub struct DependencyClassifier {
    client: Arc<RegistryClient>,
    resolver: Arc<MetadataResolver>,
}

impl DependencyClassifier {
    pub fn new(client: Arc<RegistryClient>, resolver: Arc<MetadataResolver>) -> Self {
        Self { client, resolver }
    }

    /// Classify `parent`'s declared edges.
    ///
    /// A missing dependency link degrades to [`Classification::permissive`]. A link
    /// that exists but cannot be read is an error: guessing there would hide a
    /// network problem behind wrong output.
    pub fn classify(
        &self,
        parent: &PackageRef,
        edges: &[PackageRef],
    ) -> Result<Classification, ResolveError> {
        match self.registry_kinds(parent) {
            Ok(kinds) => Ok(Classification::from_kinds(kinds)),
            Err(RegistryError::DependencyLinkMissing { package }) => {
                if !edges.is_empty() {
                    tracing::warn!(
                        %package,
                        "no registry dependency data, treating {} dependencies as build inputs",
                        edges.len()
                    );
                }
                Ok(Classification::permissive(edges))
            }
            Err(e) => Err(ResolveError::MetadataUnavailable {
                package: parent.clone(),
                record: format!("dependency list: {e}"),
            }),
        }
    }

    fn registry_kinds(&self, parent: &PackageRef) -> Result<HashMap<String, Kind>, RegistryError> {
        let missing = || RegistryError::DependencyLinkMissing {
            package: parent.clone(),
        };

        if self.resolver.is_local(parent) {
            return Err(missing());
        }

        let link = self
            .client
            .version_info(parent)?
            .and_then(|v| v.links)
            .and_then(|l| l.dependencies)
            .ok_or_else(missing)?;

        let mut kinds: HashMap<String, Kind> = HashMap::new();
        for dep in self.client.dependencies(&link)?.dependencies {
            let kind = Kind::from_registry(&dep.kind);
            // A crate listed as both dev and normal/build is needed for the build.
            kinds
                .entry(dep.crate_id)
                .and_modify(|existing| {
                    if !existing.is_build_required() {
                        *existing = kind;
                    }
                })
                .or_insert(kind);
        }
        Ok(kinds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{FetchError, StaticFetcher};
    use c2g_lock::{LocalManifest, LocalManifests};
    use serde_json::json;
    use std::path::PathBuf;

    fn classifier(fetcher: StaticFetcher, local: LocalManifests) -> DependencyClassifier {
        let client = Arc::new(RegistryClient::new(Arc::new(fetcher), "http://r", "http://s"));
        let resolver = Arc::new(MetadataResolver::new(client.clone(), Arc::new(local)));
        DependencyClassifier::new(client, resolver)
    }

    fn with_dependency_list(fetcher: StaticFetcher, deps: serde_json::Value) -> StaticFetcher {
        fetcher
            .with_json(
                "http://r/crates/p/1.0.0",
                &json!({"version": {"links": {"dependencies": "/crates/p/1.0.0/dependencies"}}}),
            )
            .with_json(
                "http://s/crates/p/1.0.0/dependencies",
                &json!({ "dependencies": deps }),
            )
    }

    fn edges(names: &[&str]) -> Vec<PackageRef> {
        names.iter().map(|n| PackageRef::new(*n, "1.0.0")).collect()
    }

    #[test]
    fn test_registry_kinds() {
        let fetcher = with_dependency_list(
            StaticFetcher::new(),
            json!([
                {"crate_id": "a", "kind": "normal"},
                {"crate_id": "b", "kind": "dev"},
                {"crate_id": "c", "kind": "build"}
            ]),
        );
        let c = classifier(fetcher, LocalManifests::new());
        let result = c
            .classify(&PackageRef::new("p", "1.0.0"), &edges(&["a", "b", "c"]))
            .unwrap();
        assert!(!result.fallback);
        assert_eq!(result.kind_of("a"), Kind::Normal);
        assert_eq!(result.kind_of("b"), Kind::Development);
        assert_eq!(result.kind_of("c"), Kind::Build);
        // Declared in the lockfile but unknown to the registry.
        assert_eq!(result.kind_of("d"), Kind::Normal);
    }

    #[test]
    fn test_dev_and_normal_listing_counts_as_normal() {
        let fetcher = with_dependency_list(
            StaticFetcher::new(),
            json!([
                {"crate_id": "rand_hc", "kind": "dev"},
                {"crate_id": "rand_hc", "kind": "normal"},
                {"crate_id": "rand_pcg", "kind": "build"},
                {"crate_id": "rand_pcg", "kind": "dev"}
            ]),
        );
        let c = classifier(fetcher, LocalManifests::new());
        let result = c
            .classify(
                &PackageRef::new("p", "1.0.0"),
                &edges(&["rand_hc", "rand_pcg"]),
            )
            .unwrap();
        assert_eq!(result.kind_of("rand_hc"), Kind::Normal);
        assert_eq!(result.kind_of("rand_pcg"), Kind::Build);
    }

    #[test]
    fn test_missing_link_falls_back_to_normal() {
        let fetcher =
            StaticFetcher::new().with_json("http://r/crates/p/1.0.0", &json!({"version": {}}));
        let c = classifier(fetcher, LocalManifests::new());
        let result = c
            .classify(&PackageRef::new("p", "1.0.0"), &edges(&["x", "y"]))
            .unwrap();
        assert!(result.fallback);
        assert_eq!(result.kind_of("x"), Kind::Normal);
        assert_eq!(result.kind_of("y"), Kind::Normal);
    }

    #[test]
    fn test_local_package_never_hits_registry() {
        let fetcher = Arc::new(StaticFetcher::new());
        let client = Arc::new(RegistryClient::new(fetcher.clone(), "http://r", "http://s"));
        let local = LocalManifests::from_manifests([LocalManifest {
            name: "p".into(),
            version: Some("1.0.0".into()),
            license: None,
            homepage: None,
            repository: None,
            description: None,
            path: PathBuf::from("Cargo.toml"),
        }]);
        let resolver = Arc::new(MetadataResolver::new(client.clone(), Arc::new(local)));
        let c = DependencyClassifier::new(client, resolver);

        let result = c
            .classify(&PackageRef::new("p", "1.0.0"), &edges(&["dev-only"]))
            .unwrap();
        assert!(result.fallback);
        assert_eq!(fetcher.total_calls(), 0);
    }

    #[test]
    fn test_unreadable_dependency_list_is_an_error() {
        let fetcher = StaticFetcher::new()
            .with_json(
                "http://r/crates/p/1.0.0",
                &json!({"version": {"links": {"dependencies": "/deps"}}}),
            )
            .with_error(
                "http://s/deps",
                FetchError::RetriesExhausted {
                    url: "http://s/deps".into(),
                    attempts: 3,
                    last: "timeout".into(),
                },
            );
        let c = classifier(fetcher, LocalManifests::new());
        let err = c
            .classify(&PackageRef::new("p", "1.0.0"), &edges(&["a"]))
            .unwrap_err();
        assert!(matches!(err, ResolveError::MetadataUnavailable { .. }));
    }
}
