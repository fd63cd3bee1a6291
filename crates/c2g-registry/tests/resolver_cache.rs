//! Cache coherence and override isolation across threads.

use c2g_core::PackageRef;
use c2g_lock::{LocalManifest, LocalManifests};
use c2g_registry::{
    CachedFetcher, DiskCache, MetadataResolver, RegistryClient, StaticFetcher,
    is_immutable_registry_url,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

fn remote_serde() -> StaticFetcher {
    StaticFetcher::new()
        .with_json(
            "http://r/crates/serde",
            &json!({"crate": {
                "description": "A generic serialization/deserialization framework\n",
                "homepage": "https://serde.rs",
                "max_version": "1.0.200"
            }}),
        )
        .with_json(
            "http://r/crates/serde/1.0.188",
            &json!({"version": {"license": "MIT OR Apache-2.0"}}),
        )
}

#[test]
fn test_concurrent_resolves_share_one_fetch_per_url() {
    let network = Arc::new(remote_serde());
    let fetcher = Arc::new(CachedFetcher::new(Box::new(network.clone())));
    let client = Arc::new(RegistryClient::new(fetcher, "http://r", "http://s"));
    let resolver = MetadataResolver::new(client, Arc::new(LocalManifests::new()));
    let pkg = PackageRef::new("serde", "1.0.188");

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..12)
            .map(|_| scope.spawn(|| resolver.resolve(&pkg).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(results.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(results[0].homepage.as_deref(), Some("https://serde.rs"));
    assert_eq!(results[0].license.as_deref(), Some("MIT OR Apache-2.0"));
    assert_eq!(network.calls("http://r/crates/serde"), 1);
    assert_eq!(network.calls("http://r/crates/serde/1.0.188"), 1);
}

#[test]
fn test_local_override_is_never_backfilled_from_registry() {
    let network = Arc::new(remote_serde());
    let client = Arc::new(RegistryClient::new(network.clone(), "http://r", "http://s"));
    let local = LocalManifests::from_manifests([LocalManifest {
        name: "serde".into(),
        version: Some("1.0.188".into()),
        license: Some("MIT".into()),
        homepage: None,
        repository: None,
        description: Some("patched serde".into()),
        path: PathBuf::from("vendor/serde/Cargo.toml"),
    }]);
    let resolver = MetadataResolver::new(client, Arc::new(local));

    let meta = resolver
        .resolve(&PackageRef::new("serde", "1.0.188"))
        .unwrap();
    assert_eq!(meta.description.as_deref(), Some("patched serde"));
    assert_eq!(meta.homepage.as_deref(), Some(c2g_core::PLACEHOLDER));
    assert_eq!(meta.license.as_deref(), Some("MIT"));
    assert_eq!(network.total_calls(), 0);
}

/// One run's resolver over a persistent cache directory.
fn resolver_over_disk(dir: &std::path::Path, network: Arc<StaticFetcher>) -> MetadataResolver {
    let disk = DiskCache::new(dir.to_path_buf(), Box::new(network))
        .only_if(is_immutable_registry_url);
    let fetcher = Arc::new(CachedFetcher::new(Box::new(disk)));
    let client = Arc::new(RegistryClient::new(fetcher, "http://r", "http://s"));
    MetadataResolver::new(client, Arc::new(LocalManifests::new()))
}

#[test]
fn test_latest_version_is_not_served_from_a_previous_run() {
    let cache = tempfile::tempdir().unwrap();
    let crate_record = |max: &str| json!({"crate": {"max_version": max}});

    let first = Arc::new(
        StaticFetcher::new().with_json("http://r/crates/serde", &crate_record("1.0.0")),
    );
    let run = resolver_over_disk(cache.path(), first.clone());
    assert_eq!(run.max_version("serde").unwrap(), "1.0.0");
    assert_eq!(run.max_version("serde").unwrap(), "1.0.0");
    assert_eq!(first.calls("http://r/crates/serde"), 1);

    let second = Arc::new(
        StaticFetcher::new().with_json("http://r/crates/serde", &crate_record("2.0.0")),
    );
    let run = resolver_over_disk(cache.path(), second.clone());
    assert_eq!(run.max_version("serde").unwrap(), "2.0.0");
    assert_eq!(second.calls("http://r/crates/serde"), 1);
}
