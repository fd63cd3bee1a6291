//! Errors that make a single lockfile node impossible to describe.

use crate::package::PackageRef;

/// Fatal resolution errors for one package.
///
/// Recoverable conditions (missing archive, missing dependency-kind data) are not
/// represented here; they degrade to placeholders instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("no metadata for {package}: {record}")]
    MetadataUnavailable { package: PackageRef, record: String },

    #[error(
        "cannot infer version of dependency '{dependency}' of {parent}: {candidates} packages with that name in the lockfile"
    )]
    AmbiguousVersionInference {
        parent: PackageRef,
        dependency: String,
        candidates: usize,
    },

    #[error("{parent} depends on {dependency}, which is not in the lockfile")]
    UnknownDependency {
        parent: PackageRef,
        dependency: PackageRef,
    },

    #[error("{parent} has a malformed dependency entry '{spec}'")]
    MalformedDependency { parent: PackageRef, spec: String },
}

impl ResolveError {
    /// The package whose descriptor could not be produced.
    pub fn package(&self) -> &PackageRef {
        match self {
            Self::MetadataUnavailable { package, .. } => package,
            Self::AmbiguousVersionInference { parent, .. }
            | Self::UnknownDependency { parent, .. }
            | Self::MalformedDependency { parent, .. } => parent,
        }
    }
}
