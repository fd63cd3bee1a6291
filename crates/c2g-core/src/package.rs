//! Package identity and dependency edge types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one lockfile node: crate name plus exact version.
///
/// This is the key for every cache in a run and the only way descriptors refer to
/// each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackageRef {
    pub name: String,
    pub version: String,
}

impl PackageRef {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Identifier used for the generated Scheme variable: `serde_1_0_188`.
    pub fn guix_name(&self) -> String {
        format!("{}_{}", self.name, self.version.replace('.', "_"))
    }

    /// Full variable name of the generated package definition: `rust-serde_1_0_188`.
    pub fn guix_variable(&self) -> String {
        format!("rust-{}", self.guix_name())
    }
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// A dependency as written in a lockfile node's `dependencies` list.
///
/// The version is absent when the lockfile contains only one package of that name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeclaredDependency {
    pub name: String,
    pub version: Option<String>,
}

impl DeclaredDependency {
    /// Parse a lockfile dependency string: `name`, `name version` or
    /// `name version (source)`. Returns `None` for an empty string.
    pub fn parse(spec: &str) -> Option<Self> {
        let mut parts = spec.split_whitespace();
        let name = parts.next()?.to_string();
        let version = parts.next().map(String::from);
        Some(Self { name, version })
    }
}

/// Kind of a dependency edge as reported by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    Normal,
    Build,
    Development,
}

impl Kind {
    /// Map a registry kind string. `normal` and `build` are kept apart here but
    /// are both build-required; every other value is development-only.
    pub fn from_registry(kind: &str) -> Self {
        match kind {
            "normal" => Self::Normal,
            "build" => Self::Build,
            _ => Self::Development,
        }
    }

    /// Whether the dependency is needed to build the package (`Normal` or `Build`).
    pub const fn is_build_required(self) -> bool {
        matches!(self, Self::Normal | Self::Build)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guix_name_replaces_dots() {
        let pkg = PackageRef::new("foo", "1.0.0");
        assert_eq!(pkg.guix_name(), "foo_1_0_0");
        assert_eq!(pkg.guix_variable(), "rust-foo_1_0_0");
    }

    #[test]
    fn test_guix_name_keeps_prerelease_dashes() {
        let pkg = PackageRef::new("tokio-macros", "2.0.0-alpha.1");
        assert_eq!(pkg.guix_name(), "tokio-macros_2_0_0-alpha_1");
    }

    #[test]
    fn test_parse_declared_dependency_forms() {
        assert_eq!(
            DeclaredDependency::parse("serde"),
            Some(DeclaredDependency {
                name: "serde".into(),
                version: None
            })
        );
        assert_eq!(
            DeclaredDependency::parse("rand 0.7.3"),
            Some(DeclaredDependency {
                name: "rand".into(),
                version: Some("0.7.3".into())
            })
        );
        let with_source = DeclaredDependency::parse(
            "rand 0.7.3 (registry+https://github.com/rust-lang/crates.io-index)",
        )
        .unwrap();
        assert_eq!(with_source.name, "rand");
        assert_eq!(with_source.version.as_deref(), Some("0.7.3"));
        assert_eq!(DeclaredDependency::parse("   "), None);
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(Kind::from_registry("normal"), Kind::Normal);
        assert_eq!(Kind::from_registry("build"), Kind::Build);
        assert_eq!(Kind::from_registry("dev"), Kind::Development);
        assert_eq!(Kind::from_registry("something-new"), Kind::Development);
        assert!(Kind::Normal.is_build_required());
        assert!(Kind::Build.is_build_required());
        assert!(!Kind::Development.is_build_required());
    }
}
