//! Registry metadata and license expressions.

use serde::{Deserialize, Serialize};

/// Marker written wherever a value could not be determined and must be filled in
/// by hand (missing homepage, missing source hash). Kept grep-able on purpose.
pub const PLACEHOLDER: &str = "FILLMEIN";

/// Where a [`RegistryMetadata`] record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetadataSource {
    /// An on-disk `Cargo.toml` whose name and version matched.
    LocalOverride,
    /// The remote registry.
    Remote,
}

/// Descriptive metadata for one package.
///
/// The two sources are exclusive: fields missing from a local override are never
/// filled in from the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryMetadata {
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub license: Option<String>,
    pub source: MetadataSource,
}

impl RegistryMetadata {
    pub const fn is_local(&self) -> bool {
        matches!(self.source, MetadataSource::LocalOverride)
    }
}

/// A license as written by the package, split for `spdx-string->license`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LicenseExpr {
    Absent,
    Single(String),
    /// Legacy `/`-separated alternatives, in declaration order. Never empty.
    Any(Vec<String>),
}

impl LicenseExpr {
    /// Normalize a registry license string. `MIT/Apache-2.0` becomes
    /// `Any(["MIT", "Apache-2.0"])`; a string without `/` stays `Single`. Empty
    /// pieces (`MIT/`, `MIT//Apache-2.0`) are dropped.
    pub fn parse(license: Option<&str>) -> Self {
        let parts: Vec<String> = license
            .unwrap_or_default()
            .split('/')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(String::from)
            .collect();

        if parts.is_empty() {
            return Self::Absent;
        }
        match <[String; 1]>::try_from(parts) {
            Ok([single]) => Self::Single(single),
            Err(parts) => Self::Any(parts),
        }
    }

    /// The SPDX identifiers, in order. Empty for `Absent`.
    pub fn identifiers(&self) -> Vec<&str> {
        match self {
            Self::Absent => Vec::new(),
            Self::Single(id) => vec![id.as_str()],
            Self::Any(ids) => ids.iter().map(String::as_str).collect(),
        }
    }
}
