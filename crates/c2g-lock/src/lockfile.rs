//! `Cargo.lock` parsing.
//!
//! The lockfile is the closed universe of a run: every dependency edge must resolve
//! to one of its nodes.

use crate::LockError;
use c2g_core::{DeclaredDependency, PackageRef, ResolveError};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Deserialize)]
struct RawLockfile {
    #[serde(default)]
    package: Vec<RawPackage>,
}

#[derive(Deserialize)]
struct RawPackage {
    name: Option<String>,
    version: Option<String>,
    source: Option<String>,
    checksum: Option<String>,
    #[serde(default)]
    dependencies: Vec<String>,
}

/// One `[[package]]` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockfileNode {
    pub package: PackageRef,
    /// `registry+...`, `git+...`, or `None` for path dependencies.
    pub source: Option<String>,
    pub checksum: Option<String>,
    /// Raw dependency strings, in file order.
    pub dependencies: Vec<String>,
}

impl LockfileNode {
    pub fn new(name: &str, version: &str, dependencies: &[&str]) -> Self {
        Self {
            package: PackageRef::new(name, version),
            source: None,
            checksum: None,
            dependencies: dependencies.iter().map(|d| (*d).to_string()).collect(),
        }
    }
}

/// A parsed lockfile with a name → versions index.
#[derive(Debug, Clone, Default)]
pub struct Lockfile {
    nodes: Vec<LockfileNode>,
    versions: HashMap<String, Vec<String>>,
}

impl Lockfile {
    pub fn from_nodes(nodes: Vec<LockfileNode>) -> Self {
        let mut versions: HashMap<String, Vec<String>> = HashMap::new();
        for node in &nodes {
            versions
                .entry(node.package.name.clone())
                .or_default()
                .push(node.package.version.clone());
        }
        Self { nodes, versions }
    }

    /// Parse lockfile text. Entries missing `name` or `version` are rejected.
    pub fn parse(text: &str) -> Result<Self, LockError> {
        let raw: RawLockfile = toml::from_str(text).map_err(|source| LockError::Toml {
            what: "Cargo.lock".to_string(),
            source,
        })?;

        let mut nodes = Vec::with_capacity(raw.package.len());
        for (index, pkg) in raw.package.into_iter().enumerate() {
            let name = pkg.name.ok_or(LockError::MissingField {
                index,
                field: "name",
            })?;
            let version = pkg.version.ok_or(LockError::MissingField {
                index,
                field: "version",
            })?;
            nodes.push(LockfileNode {
                package: PackageRef::new(name, version),
                source: pkg.source,
                checksum: pkg.checksum,
                dependencies: pkg.dependencies,
            });
        }

        Ok(Self::from_nodes(nodes))
    }

    /// Read and parse a lockfile from disk.
    pub fn load(path: &Path) -> Result<Self, LockError> {
        let text = std::fs::read_to_string(path).map_err(|source| LockError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn nodes(&self) -> &[LockfileNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All versions of `name` present in the lockfile.
    pub fn versions_of(&self, name: &str) -> &[String] {
        self.versions.get(name).map_or(&[], Vec::as_slice)
    }

    pub fn contains(&self, package: &PackageRef) -> bool {
        self.versions_of(&package.name)
            .iter()
            .any(|v| *v == package.version)
    }

    /// Resolve `node`'s dependency strings to lockfile packages, in declaration order.
    ///
    /// An unversioned entry takes the version of the single node with that name;
    /// zero or several candidates is an error rather than a guess.
    pub fn declared_edges(&self, node: &LockfileNode) -> Result<Vec<PackageRef>, ResolveError> {
        node.dependencies
            .iter()
            .map(|spec| self.resolve_edge(&node.package, spec))
            .collect()
    }

    fn resolve_edge(&self, parent: &PackageRef, spec: &str) -> Result<PackageRef, ResolveError> {
        let declared =
            DeclaredDependency::parse(spec).ok_or_else(|| ResolveError::MalformedDependency {
                parent: parent.clone(),
                spec: spec.to_string(),
            })?;

        match declared.version {
            Some(version) => {
                let target = PackageRef::new(declared.name, version);
                if self.contains(&target) {
                    Ok(target)
                } else {
                    Err(ResolveError::UnknownDependency {
                        parent: parent.clone(),
                        dependency: target,
                    })
                }
            }
            None => match self.versions_of(&declared.name) {
                [version] => Ok(PackageRef::new(declared.name, version.clone())),
                candidates => Err(ResolveError::AmbiguousVersionInference {
                    parent: parent.clone(),
                    dependency: declared.name,
                    candidates: candidates.len(),
                }),
            },
        }
    }
}
