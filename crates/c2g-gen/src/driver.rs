//! Concurrent generation over every lockfile node.
//!
//! Nodes are independent once the shared caches are in place, so each one is
//! described on a bounded rayon pool. A node that cannot be described is recorded
//! as a [`NodeFailure`] and the rest of the run continues.

use crate::progress::GenProgress;
use crate::synth::synthesize;
use c2g_core::{PackageDescriptor, PackageRef, ResolveError};
use c2g_lock::{LocalManifests, Lockfile, LockfileNode};
use c2g_registry::{ArchiveDigests, DependencyClassifier, MetadataResolver, RegistryClient};
use rayon::prelude::*;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// A lockfile node that could not be turned into a descriptor.
#[derive(Debug, Clone)]
pub struct NodeFailure {
    pub package: PackageRef,
    pub error: ResolveError,
}

/// Everything one run produced, in lockfile order.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub root: PackageRef,
    pub descriptors: Vec<PackageDescriptor>,
    pub failures: Vec<NodeFailure>,
}

impl GenerationReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Describes lockfile nodes against one registry and one set of local overrides.
pub struct Generator {
    resolver: Arc<MetadataResolver>,
    classifier: DependencyClassifier,
    digests: ArchiveDigests,
    jobs: usize,
}

impl Generator {
    pub fn new(client: Arc<RegistryClient>, local: Arc<LocalManifests>, jobs: usize) -> Self {
        let resolver = Arc::new(MetadataResolver::new(client.clone(), local));
        Self {
            classifier: DependencyClassifier::new(client.clone(), resolver.clone()),
            digests: ArchiveDigests::new(client, resolver.clone()),
            resolver,
            jobs: jobs.max(1),
        }
    }

    pub fn resolver(&self) -> &MetadataResolver {
        &self.resolver
    }

    pub fn digests(&self) -> &ArchiveDigests {
        &self.digests
    }

    /// Build the descriptor for a single node.
    pub fn describe(
        &self,
        lockfile: &Lockfile,
        node: &LockfileNode,
    ) -> Result<PackageDescriptor, ResolveError> {
        let package = &node.package;
        tracing::info!(%package, "describing");
        let edges = lockfile.declared_edges(node)?;
        let metadata = self.resolver.resolve(package)?;
        let classification = self.classifier.classify(package, &edges)?;
        let digest = self.digests.digest_or_placeholder(package);

        let descriptor = synthesize(package, &edges, &classification, &metadata, digest);
        tracing::debug!(
            %package,
            normal = descriptor.normal_deps.len(),
            dev = descriptor.dev_deps.len(),
            local = metadata.is_local(),
            "described"
        );
        Ok(descriptor)
    }

    /// Describe every node in `lockfile` without a progress bar.
    pub fn run(
        &self,
        lockfile: &Lockfile,
        root: PackageRef,
    ) -> Result<GenerationReport, GenerateError> {
        self.run_with_progress(lockfile, root, &GenProgress::hidden())
    }

    /// Describe every node in `lockfile`, ticking `progress` per node.
    ///
    /// Output order is lockfile order regardless of completion order.
    pub fn run_with_progress(
        &self,
        lockfile: &Lockfile,
        root: PackageRef,
        progress: &GenProgress,
    ) -> Result<GenerationReport, GenerateError> {
        if !lockfile.contains(&root) {
            tracing::warn!(%root, "root package is not in the lockfile");
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .thread_name(|i| format!("c2g-worker-{i}"))
            .build()?;

        let outcomes: Vec<Result<PackageDescriptor, NodeFailure>> = pool.install(|| {
            lockfile
                .nodes()
                .par_iter()
                .map(|node| {
                    let outcome = self.describe(lockfile, node).map_err(|error| {
                        progress.suspend(|| {
                            tracing::error!(package = %node.package, "{}", error);
                        });
                        NodeFailure {
                            package: node.package.clone(),
                            error,
                        }
                    });
                    progress.tick(&node.package.to_string());
                    outcome
                })
                .collect()
        });
        progress.finish();

        let mut descriptors = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(descriptor) => descriptors.push(descriptor),
                Err(failure) => failures.push(failure),
            }
        }

        tracing::info!(
            described = descriptors.len(),
            failed = failures.len(),
            "generation finished"
        );

        Ok(GenerationReport {
            root,
            descriptors,
            failures,
        })
    }
}
