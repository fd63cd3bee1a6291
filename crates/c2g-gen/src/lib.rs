//! Turning a lockfile into Guix package definitions.
//!
//! # Architecture
//!
//! - **synth**: normalize metadata, digest and classified edges into a descriptor
//! - **driver**: resolve every lockfile node on a bounded thread pool
//! - **render**: Guile Scheme text for descriptors, preamble and root reference
//! - **progress**: terminal progress bar via `indicatif`

pub mod driver;
pub mod progress;
pub mod render;
pub mod synth;

pub use driver::{GenerateError, GenerationReport, Generator, NodeFailure};
pub use render::{render_document, render_package, render_preamble, render_root};
pub use synth::synthesize;
