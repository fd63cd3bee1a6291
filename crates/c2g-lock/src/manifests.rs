//! Local `Cargo.toml` manifests that take priority over registry metadata.
//!
//! When generating from an existing lockfile, the tree around it usually contains
//! the workspace's own crates, which may not be published at all.

use crate::LockError;
use ignore::WalkBuilder;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use toml::{Table, Value};

/// Metadata declared by one on-disk manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalManifest {
    pub name: String,
    /// `None` when the manifest does not pin a version; it then matches any version.
    pub version: Option<String>,
    pub license: Option<String>,
    pub homepage: Option<String>,
    pub repository: Option<String>,
    pub description: Option<String>,
    pub path: PathBuf,
}

impl LocalManifest {
    /// Whether this manifest describes `name` at `version` (any version if `None`).
    pub fn matches(&self, name: &str, version: Option<&str>) -> bool {
        self.name == name
            && match (version, self.version.as_deref()) {
                (None, _) | (_, None) => true,
                (Some(wanted), Some(declared)) => wanted == declared,
            }
    }
}

/// All local manifests found under a directory, indexed by package name.
#[derive(Debug, Clone, Default)]
pub struct LocalManifests {
    by_name: HashMap<String, Vec<LocalManifest>>,
}

impl LocalManifests {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_manifests(manifests: impl IntoIterator<Item = LocalManifest>) -> Self {
        let mut table = Self::new();
        for manifest in manifests {
            table.insert(manifest);
        }
        table
    }

    pub fn insert(&mut self, manifest: LocalManifest) {
        self.by_name
            .entry(manifest.name.clone())
            .or_default()
            .push(manifest);
    }

    /// First manifest (in path order) for `name` whose version matches.
    pub fn lookup(&self, name: &str, version: Option<&str>) -> Option<&LocalManifest> {
        self.by_name
            .get(name)?
            .iter()
            .find(|m| m.matches(name, version))
    }

    pub fn len(&self) -> usize {
        self.by_name.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Recursively scan `root` for `Cargo.toml` files with a `[package]` table.
    ///
    /// `target/` and `.git/` are skipped. Manifests that fail to parse are logged
    /// and ignored. Fields written as `{ workspace = true }` are taken from the
    /// nearest enclosing `[workspace.package]` found in the same scan.
    pub fn scan(root: &Path) -> Result<Self, LockError> {
        let mut paths = Vec::new();
        let walker = WalkBuilder::new(root)
            .standard_filters(false)
            .filter_entry(|entry| {
                let name = entry.file_name();
                name != "target" && name != ".git"
            })
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(%err, root = %root.display(), "skipping path during manifest scan");
                    continue;
                }
            };
            if entry.file_type().is_some_and(|t| t.is_file()) && entry.file_name() == "Cargo.toml"
            {
                paths.push(entry.into_path());
            }
        }
        paths.sort();

        let mut parsed: Vec<(PathBuf, Table)> = Vec::with_capacity(paths.len());
        for path in paths {
            let text = std::fs::read_to_string(&path).map_err(|source| LockError::Io {
                path: path.clone(),
                source,
            })?;
            match toml::from_str::<Table>(&text) {
                Ok(table) => parsed.push((path, table)),
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "ignoring unparsable manifest");
                }
            }
        }

        // Directory → [workspace.package] for inheritance lookups.
        let workspaces: HashMap<PathBuf, Table> = parsed
            .iter()
            .filter_map(|(path, table)| {
                let ws_package = table
                    .get("workspace")
                    .and_then(Value::as_table)
                    .and_then(|ws| ws.get("package"))
                    .and_then(Value::as_table)
                    .cloned()
                    .unwrap_or_default();
                table
                    .contains_key("workspace")
                    .then(|| (path.parent().unwrap_or(root).to_path_buf(), ws_package))
            })
            .collect();

        let mut manifests = Self::new();
        for (path, table) in &parsed {
            let Some(package) = table.get("package").and_then(Value::as_table) else {
                continue;
            };
            let workspace = enclosing_workspace(path, &workspaces);
            let Some(name) = package.get("name").and_then(Value::as_str) else {
                tracing::warn!(path = %path.display(), "manifest [package] has no name");
                continue;
            };

            manifests.insert(LocalManifest {
                name: name.to_string(),
                version: string_field(package, "version", workspace),
                license: string_field(package, "license", workspace),
                homepage: string_field(package, "homepage", workspace),
                repository: string_field(package, "repository", workspace),
                description: string_field(package, "description", workspace),
                path: path.clone(),
            });
        }

        tracing::debug!(count = manifests.len(), root = %root.display(), "local manifests");
        Ok(manifests)
    }
}

/// The `[workspace.package]` of the closest ancestor workspace of `manifest`.
fn enclosing_workspace<'a>(
    manifest: &Path,
    workspaces: &'a HashMap<PathBuf, Table>,
) -> Option<&'a Table> {
    manifest
        .ancestors()
        .skip(1)
        .find_map(|dir| workspaces.get(dir))
}

/// A string field, following `{ workspace = true }` inheritance.
fn string_field(package: &Table, key: &str, workspace: Option<&Table>) -> Option<String> {
    match package.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Table(t) if t.get("workspace").and_then(Value::as_bool) == Some(true) => {
            workspace?.get(key)?.as_str().map(String::from)
        }
        _ => None,
    }
}
