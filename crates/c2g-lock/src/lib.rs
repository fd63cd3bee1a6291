//! Reading the lockfile universe and the local manifests that override registry data.
//!
//! - **lockfile**: `Cargo.lock` parsing and dependency edge resolution
//! - **manifests**: recursive `Cargo.toml` scan producing local metadata overrides
//! - **generate**: unpacking a downloaded crate and running `cargo generate-lockfile`

pub mod generate;
pub mod lockfile;
pub mod manifests;

pub use generate::{generate_lockfile, lockfile_for_archive, unpack_crate};
pub use lockfile::{Lockfile, LockfileNode};
pub use manifests::{LocalManifest, LocalManifests};

use std::path::PathBuf;

/// Errors from reading lockfiles and manifests.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {what}: {source}")]
    Toml {
        what: String,
        source: toml::de::Error,
    },
    #[error("lockfile package #{index} has no '{field}'")]
    MissingField { index: usize, field: &'static str },
    #[error("failed to unpack crate archive into {dest}: {message}")]
    Extract { dest: PathBuf, message: String },
    #[error("cargo generate-lockfile failed in {dir}: {message}")]
    LockGeneration { dir: PathBuf, message: String },
}
