//! Core types for crate2guix.
//!
//! Provides the package identity model ([`package::PackageRef`]), registry metadata and
//! license expressions, the synthesized [`descriptor::PackageDescriptor`], the Nix-style
//! base32 hash encoder, run-scoped memoization, the resolution error taxonomy and
//! configuration loading.

pub mod base32;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod memo;
pub mod metadata;
pub mod package;

pub use descriptor::PackageDescriptor;
pub use error::ResolveError;
pub use metadata::{LicenseExpr, PLACEHOLDER, RegistryMetadata};
pub use package::{DeclaredDependency, Kind, PackageRef};
