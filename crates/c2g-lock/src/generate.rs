//! Producing a lockfile when the user did not supply one.
//!
//! The published `.crate` archive is unpacked and `cargo generate-lockfile` is run
//! inside it, which resolves the crate's dependency ranges against the index.

use crate::LockError;
use crate::lockfile::Lockfile;
use c2g_core::PackageRef;
use flate2::read::GzDecoder;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Unpack a gzip'd `.crate` tarball into `dest`.
///
/// Entries whose paths would land outside `dest` are skipped.
pub fn unpack_crate(archive: &[u8], dest: &Path) -> Result<(), LockError> {
    let extract_err = |message: String| LockError::Extract {
        dest: dest.to_path_buf(),
        message,
    };

    std::fs::create_dir_all(dest).map_err(|source| LockError::Io {
        path: dest.to_path_buf(),
        source,
    })?;

    let decoder = GzDecoder::new(archive);
    let mut tar = tar::Archive::new(decoder);
    for entry in tar.entries().map_err(|e| extract_err(e.to_string()))? {
        let mut entry = entry.map_err(|e| extract_err(e.to_string()))?;
        let unpacked = entry
            .unpack_in(dest)
            .map_err(|e| extract_err(e.to_string()))?;
        if !unpacked {
            let path = entry
                .path()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            tracing::warn!(%path, "skipping archive entry outside the destination");
        }
    }

    Ok(())
}

/// Run `cargo generate-lockfile` in `crate_dir` and return the lockfile path.
pub fn generate_lockfile(crate_dir: &Path) -> Result<PathBuf, LockError> {
    let lock_err = |message: String| LockError::LockGeneration {
        dir: crate_dir.to_path_buf(),
        message,
    };

    let output = Command::new("cargo")
        .arg("generate-lockfile")
        .current_dir(crate_dir)
        .output()
        .map_err(|e| lock_err(format!("could not run cargo: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(lock_err(format!(
            "{}: {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(crate_dir.join("Cargo.lock"))
}

/// Unpack the archive of `package` under `downloads_dir` and generate its lockfile.
///
/// Crate archives unpack to `<name>-<version>/`.
pub fn lockfile_for_archive(
    archive: &[u8],
    downloads_dir: &Path,
    package: &PackageRef,
) -> Result<Lockfile, LockError> {
    unpack_crate(archive, downloads_dir)?;
    let crate_dir = downloads_dir.join(format!("{}-{}", package.name, package.version));
    tracing::info!(dir = %crate_dir.display(), "generating lockfile");
    let lock_path = generate_lockfile(&crate_dir)?;
    Lockfile::load(&lock_path)
}
