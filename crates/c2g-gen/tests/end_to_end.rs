//! Lockfile in, Guix Scheme out, against a canned registry.

use c2g_core::{PLACEHOLDER, PackageRef, ResolveError};
use c2g_gen::{Generator, render_document};
use c2g_lock::{LocalManifest, LocalManifests, Lockfile};
use c2g_registry::{RegistryClient, StaticFetcher};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

fn local(name: &str, version: &str) -> LocalManifest {
    LocalManifest {
        name: name.into(),
        version: Some(version.into()),
        license: Some("MIT".into()),
        homepage: Some(format!("https://{name}.example")),
        repository: None,
        description: Some(format!("The {name} crate.")),
        path: PathBuf::from(format!("{name}/Cargo.toml")),
    }
}

fn generator(fetcher: StaticFetcher, local: LocalManifests) -> Generator {
    let client = Arc::new(RegistryClient::new(Arc::new(fetcher), "http://r", "http://s"));
    Generator::new(client, Arc::new(local), 4)
}

/// `p@1.0.0` published with a dependency list and an archive whose bytes are "abc".
fn published_p(deps: serde_json::Value) -> StaticFetcher {
    StaticFetcher::new()
        .with_json(
            "http://r/crates/p",
            &json!({"crate": {"description": "Parent crate", "repository": "https://git.example/p"}}),
        )
        .with_json(
            "http://r/crates/p/1.0.0",
            &json!({"version": {
                "license": "MIT/Apache-2.0",
                "dl_path": "/api/v1/crates/p/1.0.0/download",
                "links": {"dependencies": "/api/v1/crates/p/1.0.0/dependencies"}
            }}),
        )
        .with_json(
            "http://s/api/v1/crates/p/1.0.0/dependencies",
            &json!({ "dependencies": deps }),
        )
        .with_body("http://s/api/v1/crates/p/1.0.0/download", "abc")
}

#[test]
fn test_single_local_package_document() {
    let lockfile = Lockfile::parse(
        r#"
version = 3

[[package]]
name = "foo"
version = "1.0.0"
"#,
    )
    .unwrap();
    let g = generator(
        StaticFetcher::new(),
        LocalManifests::from_manifests([local("foo", "1.0.0")]),
    );

    let report = g.run(&lockfile, PackageRef::new("foo", "1.0.0")).unwrap();
    assert!(report.is_complete());
    let doc = render_document(&report);

    assert!(doc.starts_with("(use-modules (guix build-system cargo))\n"));
    assert_eq!(doc.matches("(define-public ").count(), 1);
    assert!(doc.contains("(define-public rust-foo_1_0_0\n"));
    assert!(!doc.contains("(arguments"));
    assert!(doc.contains("(home-page \"https://foo.example\")"));
    assert!(doc.contains("(synopsis \"The foo crate.\")"));
    assert!(doc.contains("(license (spdx-string->license \"MIT\"))"));
    assert!(doc.contains(&format!("\"{PLACEHOLDER}\"))))")));
    assert!(doc.ends_with("\nrust-foo_1_0_0\n"));
}

#[test]
fn test_unversioned_edge_takes_the_only_locked_version() {
    let lockfile = Lockfile::parse(
        r#"
[[package]]
name = "p"
version = "1.0.0"
dependencies = ["b"]

[[package]]
name = "b"
version = "2.0.0"
"#,
    )
    .unwrap();
    let fetcher = published_p(json!([{"crate_id": "b", "kind": "normal"}]));
    let g = generator(
        fetcher,
        LocalManifests::from_manifests([local("b", "2.0.0")]),
    );

    let report = g.run(&lockfile, PackageRef::new("p", "1.0.0")).unwrap();
    assert!(report.is_complete(), "{:?}", report.failures);

    let p = &report.descriptors[0];
    assert_eq!(p.normal_deps, vec![PackageRef::new("b", "2.0.0")]);
    assert!(p.dev_deps.is_empty());
    // sha256("abc")
    assert_eq!(p.digest, "1b8m03r63zqhnjf7l5wnldhh7c134ap5vpj0850ymkq1iyzicy5s");
    assert_eq!(p.homepage, "https://git.example/p");

    let doc = render_document(&report);
    assert!(doc.contains("#:cargo-inputs\n        ((\"rust-b\" ,rust-b_2_0_0))"));
    assert!(doc.contains(
        "(license (list (spdx-string->license \"MIT\")\n                   (spdx-string->license \"Apache-2.0\")))"
    ));
    assert!(doc.ends_with("\nrust-p_1_0_0\n"));
}

#[test]
fn test_build_and_normal_edges_are_inputs_dev_edges_are_not() {
    let lockfile = Lockfile::parse(
        r#"
[[package]]
name = "p"
version = "1.0.0"
dependencies = ["a", "b", "c"]

[[package]]
name = "a"
version = "1.0.0"

[[package]]
name = "b"
version = "1.0.0"

[[package]]
name = "c"
version = "1.0.0"
"#,
    )
    .unwrap();
    let fetcher = published_p(json!([
        {"crate_id": "a", "kind": "normal"},
        {"crate_id": "b", "kind": "dev"},
        {"crate_id": "c", "kind": "build"}
    ]));
    let g = generator(
        fetcher,
        LocalManifests::from_manifests([
            local("a", "1.0.0"),
            local("b", "1.0.0"),
            local("c", "1.0.0"),
        ]),
    );

    let report = g.run(&lockfile, PackageRef::new("p", "1.0.0")).unwrap();
    assert!(report.is_complete(), "{:?}", report.failures);

    let names: Vec<_> = report
        .descriptors
        .iter()
        .map(|d| d.package.name.as_str())
        .collect();
    assert_eq!(names, ["p", "a", "b", "c"]);

    let p = &report.descriptors[0];
    assert_eq!(
        p.normal_deps,
        vec![PackageRef::new("a", "1.0.0"), PackageRef::new("c", "1.0.0")]
    );
    assert_eq!(p.dev_deps, vec![PackageRef::new("b", "1.0.0")]);
}

#[test]
fn test_ambiguous_edge_fails_its_node_only() {
    let lockfile = Lockfile::parse(
        r#"
[[package]]
name = "app"
version = "0.1.0"
dependencies = ["rand"]

[[package]]
name = "rand"
version = "0.7.3"

[[package]]
name = "rand"
version = "0.8.5"
"#,
    )
    .unwrap();
    let g = generator(
        StaticFetcher::new(),
        LocalManifests::from_manifests([
            local("app", "0.1.0"),
            local("rand", "0.7.3"),
            local("rand", "0.8.5"),
        ]),
    );

    let report = g.run(&lockfile, PackageRef::new("app", "0.1.0")).unwrap();
    assert_eq!(report.descriptors.len(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].package, PackageRef::new("app", "0.1.0"));
    assert_eq!(
        report.failures[0].error,
        ResolveError::AmbiguousVersionInference {
            parent: PackageRef::new("app", "0.1.0"),
            dependency: "rand".into(),
            candidates: 2,
        }
    );

    let doc = render_document(&report);
    assert!(!doc.contains("(define-public rust-app_0_1_0"));
    assert!(doc.contains("(define-public rust-rand_0_7_3"));
    assert!(doc.contains("(define-public rust-rand_0_8_5"));
}
