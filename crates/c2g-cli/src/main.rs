//! CLI binary for crate2guix: turn a crate's Cargo.lock into Guix package definitions.

use anyhow::{Context, Result};
use c2g_core::PackageRef;
use c2g_core::config::Crate2GuixConfig;
use c2g_gen::progress::GenProgress;
use c2g_gen::{GenerationReport, Generator, render_document};
use c2g_lock::{LocalManifests, Lockfile, lockfile_for_archive};
use c2g_registry::{RegistryClient, build_fetcher};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "crate2guix",
    version,
    about = "Generate Guix package definitions for a crate and its locked dependencies"
)]
struct Cli {
    /// Crate name
    name: String,

    /// Crate version (defaults to the locked version, then the latest published)
    #[arg(id = "crate_version", value_name = "VERSION")]
    version: Option<String>,

    /// Use this Cargo.lock instead of downloading the crate and generating one
    #[arg(short, long)]
    lockfile: Option<PathBuf>,

    /// Config file (defaults to ./crate2guix.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of packages described concurrently
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Directory for cached registry responses
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Do not read or write the on-disk response cache
    #[arg(long)]
    no_cache: bool,

    /// Where downloaded crates are unpacked when no lockfile is given
    #[arg(long)]
    downloads_dir: Option<PathBuf>,

    /// Write the definitions here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let config = load_config(&cli, &cwd)?;

    let fetcher = build_fetcher(&config.registry, !cli.no_cache);
    let client = Arc::new(RegistryClient::new(
        fetcher,
        &config.registry.api_url,
        &config.registry.site_url,
    ));

    let (generator, lockfile, root) = match &cli.lockfile {
        Some(path) => from_lockfile(&cli, path, client, config.generate.jobs)?,
        None => from_registry(&cli, &config, client)?,
    };

    let progress = if cli.quiet {
        GenProgress::hidden()
    } else {
        GenProgress::new(lockfile.len() as u64)
    };
    let report = generator.run_with_progress(&lockfile, root, &progress)?;

    let document = render_document(&report);
    match &cli.output {
        Some(path) => std::fs::write(path, &document)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{document}"),
    }

    report_failures(&report)
}

/// Config file and environment, then command-line flags on top.
fn load_config(cli: &Cli, cwd: &Path) -> Result<Crate2GuixConfig> {
    let mut config = Crate2GuixConfig::load(cli.config.as_deref(), cwd)?;
    if let Some(jobs) = cli.jobs {
        config.generate.jobs = jobs;
    }
    if let Some(dir) = &cli.cache_dir {
        config.registry.cache_dir = Some(dir.clone());
    }
    if let Some(dir) = &cli.downloads_dir {
        config.generate.downloads_dir = dir.clone();
    }
    config.validate()?;
    Ok(config)
}

/// Read a local lockfile; manifests next to it override registry metadata.
fn from_lockfile(
    cli: &Cli,
    path: &Path,
    client: Arc<RegistryClient>,
    jobs: usize,
) -> Result<(Generator, Lockfile, PackageRef)> {
    let lockfile = Lockfile::load(path)?;
    let workspace = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let local = LocalManifests::scan(workspace)?;
    tracing::info!(
        packages = lockfile.len(),
        local = local.len(),
        lockfile = %path.display(),
        "loaded lockfile"
    );

    let generator = Generator::new(client, Arc::new(local), jobs);
    let version = match choose_version(&cli.name, cli.version.as_deref(), Some(&lockfile)) {
        Some(version) => version,
        None => generator.resolver().max_version(&cli.name)?,
    };
    Ok((generator, lockfile, PackageRef::new(&cli.name, version)))
}

/// Download the crate, unpack it and let cargo produce its lockfile.
fn from_registry(
    cli: &Cli,
    config: &Crate2GuixConfig,
    client: Arc<RegistryClient>,
) -> Result<(Generator, Lockfile, PackageRef)> {
    let generator = Generator::new(
        client,
        Arc::new(LocalManifests::new()),
        config.generate.jobs,
    );
    let version = match choose_version(&cli.name, cli.version.as_deref(), None) {
        Some(version) => version,
        None => generator.resolver().max_version(&cli.name)?,
    };
    let root = PackageRef::new(&cli.name, version);

    let archive = generator.digests().archive(&root)?;
    let downloads = &config.generate.downloads_dir;
    std::fs::create_dir_all(downloads)
        .with_context(|| format!("failed to create {}", downloads.display()))?;
    let lockfile = lockfile_for_archive(&archive, downloads, &root)?;
    tracing::info!(%root, packages = lockfile.len(), "generated lockfile");

    Ok((generator, lockfile, root))
}

/// The explicit version, else the only locked version of `name`.
fn choose_version(
    name: &str,
    explicit: Option<&str>,
    lockfile: Option<&Lockfile>,
) -> Option<String> {
    if let Some(version) = explicit {
        return Some(version.to_string());
    }
    match lockfile?.versions_of(name) {
        [version] => Some(version.clone()),
        [] => None,
        several => {
            tracing::warn!(
                name,
                candidates = several.len(),
                "several locked versions, asking the registry for the latest"
            );
            None
        }
    }
}

/// Summarize failed nodes on stderr; any failure makes the run unsuccessful.
fn report_failures(report: &GenerationReport) -> Result<()> {
    if report.is_complete() {
        return Ok(());
    }
    eprintln!(
        "\n{} of {} packages could not be described:",
        report.failures.len(),
        report.failures.len() + report.descriptors.len()
    );
    for failure in &report.failures {
        eprintln!("  {}: {}", failure.package, failure.error);
    }
    anyhow::bail!("{} packages failed", report.failures.len())
}
